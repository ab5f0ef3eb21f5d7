//! Render-time errors
//!
//! Renders are lenient by design: missing iterables loop zero times and
//! safe-mode lookups fall back instead of faulting. What remains is the
//! strict-variable mode's unresolved lookup and structural defects in the
//! program itself.

use weft_compiler::ir::ProgramError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unresolved variable '{path}' (strict mode)")]
    UnresolvedVariable { path: String },

    #[error("Malformed program at instruction {pc}: {reason}")]
    MalformedProgram { pc: usize, reason: String },

    #[error("Program failed validation: {0}")]
    InvalidProgram(#[from] ProgramError),
}

impl RenderError {
    pub(crate) fn malformed(pc: usize, reason: &str) -> Self {
        Self::MalformedProgram {
            pc,
            reason: reason.to_string(),
        }
    }
}
