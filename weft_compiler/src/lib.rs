// Internal modules
pub mod config;
pub mod grammar;
pub mod ir;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod scan;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use ir::{Instr, Program, VarRef};
pub use pipeline::{
    compile_template, compile_template_with_options, format_compile_error, PipelineResult,
};
pub use syntax::{CompileError, CompileErrorKind, CompileOptions, VariableMode};
