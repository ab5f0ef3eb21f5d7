//! Compile errors for the template directive compiler
//!
//! Every error carries the offending raw directive text where one exists
//! and a span into the template source. The compiler fails fast: no
//! fragment is ever emitted for a directive that could not be fully
//! validated.

use crate::config::constants::compile_time::compiling::{
    MAX_NESTING_DEPTH, MAX_PATH_SEGMENTS, MAX_PROGRAM_LENGTH,
};
use crate::grammar::Family;
use crate::logging::{codes, Code};
use crate::scan::ScanError;
use crate::utils::Span;

pub type CompileResult<T> = Result<T, CompileError>;

/// The broad classification the host sees on every compile failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorKind {
    /// Start directive with no end before template end, end directive with
    /// no open matching start, or a branch outside its construct
    UnmatchedDirective,
    /// Raw text does not match its family's expected grammar
    MalformedDirective,
    /// End directive names a family outside the fixed set
    UnknownDirectiveFamily,
    /// Strict mode: a fallback-less reference's root is not bound
    UnresolvedVariablePath,
    /// A compile-time resource boundary was exceeded
    LimitExceeded,
    /// A compiler invariant was violated; not recoverable
    Internal,
}

/// Compile-time errors with offending text and source position
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    #[error("Template scanning failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Malformed {family} directive '{raw}' at {span}")]
    MalformedDirective {
        family: Family,
        raw: String,
        span: Span,
    },

    #[error("Malformed end directive '{raw}' at {span}")]
    MalformedEnd { raw: String, span: Span },

    #[error("Unknown directive family '{name}' in end directive '{raw}' at {span}")]
    UnknownDirectiveFamily {
        name: String,
        raw: String,
        span: Span,
    },

    #[error("End directive '{raw}' at {span} closes {family}, which has no open construct")]
    UnmatchedEnd {
        family: Family,
        raw: String,
        span: Span,
    },

    #[error("{family} directive '{raw}' opened at {span} was never closed")]
    UnclosedConstruct {
        family: Family,
        raw: String,
        span: Span,
    },

    #[error("Branch directive '{raw}' at {span} is outside an open conditional")]
    MisplacedBranch { raw: String, span: Span },

    #[error("Malformed variable reference '{raw}' at {span}: {reason}")]
    MalformedVariable {
        raw: String,
        reason: String,
        span: Span,
    },

    #[error("Variable path '{raw}' at {span} has {segments} segments (max {MAX_PATH_SEGMENTS})")]
    PathTooDeep {
        raw: String,
        segments: usize,
        span: Span,
    },

    #[error("Unresolved variable root '{root}' in '{raw}' at {span} (strict mode)")]
    UnresolvedVariablePath {
        root: String,
        raw: String,
        span: Span,
    },

    #[error("Constructs nested too deeply at {span}: depth {depth} (max {MAX_NESTING_DEPTH})")]
    NestingTooDeep { depth: usize, span: Span },

    #[error("Compiled program too large: {instructions} instructions (max {MAX_PROGRAM_LENGTH})")]
    ProgramTooLarge { instructions: usize },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl CompileError {
    /// The broad classification of this error
    pub fn kind(&self) -> CompileErrorKind {
        match self {
            Self::Scan(ScanError::UnterminatedDirective { .. })
            | Self::Scan(ScanError::EmptyDirective { .. }) => CompileErrorKind::MalformedDirective,
            Self::Scan(_) => CompileErrorKind::LimitExceeded,

            Self::MalformedDirective { .. }
            | Self::MalformedEnd { .. }
            | Self::MalformedVariable { .. } => CompileErrorKind::MalformedDirective,

            Self::UnknownDirectiveFamily { .. } => CompileErrorKind::UnknownDirectiveFamily,

            Self::UnmatchedEnd { .. }
            | Self::UnclosedConstruct { .. }
            | Self::MisplacedBranch { .. } => CompileErrorKind::UnmatchedDirective,

            Self::UnresolvedVariablePath { .. } => CompileErrorKind::UnresolvedVariablePath,

            Self::PathTooDeep { .. } | Self::NestingTooDeep { .. } | Self::ProgramTooLarge { .. } => {
                CompileErrorKind::LimitExceeded
            }

            Self::Internal { .. } => CompileErrorKind::Internal,
        }
    }

    /// The offending raw directive text, when one exists
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::MalformedDirective { raw, .. }
            | Self::MalformedEnd { raw, .. }
            | Self::UnknownDirectiveFamily { raw, .. }
            | Self::UnmatchedEnd { raw, .. }
            | Self::UnclosedConstruct { raw, .. }
            | Self::MisplacedBranch { raw, .. }
            | Self::MalformedVariable { raw, .. }
            | Self::PathTooDeep { raw, .. }
            | Self::UnresolvedVariablePath { raw, .. } => Some(raw),
            Self::Scan(_)
            | Self::NestingTooDeep { .. }
            | Self::ProgramTooLarge { .. }
            | Self::Internal { .. } => None,
        }
    }

    /// Source span of the offending directive, when one is known
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Scan(scan) => scan.span(),
            Self::MalformedDirective { span, .. }
            | Self::MalformedEnd { span, .. }
            | Self::UnknownDirectiveFamily { span, .. }
            | Self::UnmatchedEnd { span, .. }
            | Self::UnclosedConstruct { span, .. }
            | Self::MisplacedBranch { span, .. }
            | Self::MalformedVariable { span, .. }
            | Self::PathTooDeep { span, .. }
            | Self::UnresolvedVariablePath { span, .. }
            | Self::NestingTooDeep { span, .. } => Some(*span),
            Self::ProgramTooLarge { .. } | Self::Internal { .. } => None,
        }
    }

    /// Error code for the global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::Scan(scan) => scan.error_code(),
            Self::MalformedDirective { .. } => codes::directive::MALFORMED_DIRECTIVE,
            Self::MalformedEnd { .. } => codes::directive::MALFORMED_DIRECTIVE,
            Self::UnknownDirectiveFamily { .. } => codes::directive::UNKNOWN_FAMILY,
            Self::UnmatchedEnd { .. } => codes::directive::UNMATCHED_END,
            Self::UnclosedConstruct { .. } => codes::directive::UNCLOSED_CONSTRUCT,
            Self::MisplacedBranch { .. } => codes::directive::MISPLACED_BRANCH,
            Self::MalformedVariable { .. } => codes::variable::MALFORMED_PATH,
            Self::PathTooDeep { .. } => codes::variable::PATH_TOO_DEEP,
            Self::UnresolvedVariablePath { .. } => codes::variable::UNRESOLVED_PATH,
            Self::NestingTooDeep { .. } => codes::directive::NESTING_TOO_DEEP,
            Self::ProgramTooLarge { .. } => codes::codegen::PROGRAM_TOO_LARGE,
            Self::Internal { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    /// Recommended action from the code registry
    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }

    /// Create a malformed-directive error for a family
    pub fn malformed(family: Family, raw: &str, span: Span) -> Self {
        Self::MalformedDirective {
            family,
            raw: raw.to_string(),
            span,
        }
    }

    /// Create a malformed-variable error
    pub fn malformed_variable(raw: &str, reason: &str, span: Span) -> Self {
        Self::MalformedVariable {
            raw: raw.to_string(),
            reason: reason.to_string(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{Position, Span};

    fn span() -> Span {
        Span::new(Position::start(), Position::new(4, 1, 5))
    }

    #[test]
    fn test_kind_classification() {
        let malformed = CompileError::malformed(Family::For, "for oops", span());
        assert_eq!(malformed.kind(), CompileErrorKind::MalformedDirective);

        let unknown = CompileError::UnknownDirectiveFamily {
            name: "while".to_string(),
            raw: "endwhile".to_string(),
            span: span(),
        };
        assert_eq!(unknown.kind(), CompileErrorKind::UnknownDirectiveFamily);

        let unclosed = CompileError::UnclosedConstruct {
            family: Family::If,
            raw: "if a".to_string(),
            span: span(),
        };
        assert_eq!(unclosed.kind(), CompileErrorKind::UnmatchedDirective);

        let unresolved = CompileError::UnresolvedVariablePath {
            root: "user".to_string(),
            raw: "user.name".to_string(),
            span: span(),
        };
        assert_eq!(unresolved.kind(), CompileErrorKind::UnresolvedVariablePath);
    }

    #[test]
    fn test_malformed_end_is_distinct_from_unknown_family() {
        let malformed_end = CompileError::MalformedEnd {
            raw: "/ 123".to_string(),
            span: span(),
        };
        assert_eq!(malformed_end.kind(), CompileErrorKind::MalformedDirective);
        assert_ne!(
            malformed_end.kind(),
            CompileErrorKind::UnknownDirectiveFamily
        );
    }

    #[test]
    fn test_raw_and_span_access() {
        let error = CompileError::malformed(Family::Section, "section 9x", span());
        assert_eq!(error.raw(), Some("section 9x"));
        assert_eq!(error.span(), Some(span()));
        assert_eq!(error.error_code().as_str(), "E040");
    }
}
