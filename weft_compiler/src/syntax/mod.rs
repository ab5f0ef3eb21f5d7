pub mod compiler;
pub mod error;

pub use compiler::{CompileOptions, TemplateCompiler, VariableMode};
pub use error::{CompileError, CompileErrorKind, CompileResult};
