//! Render runtime for Weft compiled template programs
//!
//! `weft_compiler` turns template source into a flat instruction program;
//! this crate executes that program against a render context. Compilation
//! happens once, rendering happens per request: the renderer is re-entrant
//! and keeps all state local to a single render call.

pub mod context;
pub mod engine;
pub mod error;
pub mod loops;
pub mod value;

// Re-export key types for library consumers
pub use context::RenderContext;
pub use engine::{RenderOutput, Renderer};
pub use error::RenderError;
pub use loops::LoopContext;
pub use value::Value;
