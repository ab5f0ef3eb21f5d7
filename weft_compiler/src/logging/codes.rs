//! Consolidated error codes and classification system
//!
//! Single source of truth for all compiler error codes, their metadata, and
//! classification functions.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Template scanning error codes
pub mod scanning {
    use super::Code;

    pub const UNTERMINATED_DIRECTIVE: Code = Code::new("E020");
    pub const DIRECTIVE_TOO_LONG: Code = Code::new("E021");
    pub const TEMPLATE_TOO_LARGE: Code = Code::new("E022");
    pub const TOO_MANY_TOKENS: Code = Code::new("E023");
    pub const EMPTY_DIRECTIVE: Code = Code::new("E024");
}

/// Directive parsing and nesting error codes
pub mod directive {
    use super::Code;

    pub const MALFORMED_DIRECTIVE: Code = Code::new("E040");
    pub const UNKNOWN_FAMILY: Code = Code::new("E041");
    pub const UNMATCHED_END: Code = Code::new("E042");
    pub const UNCLOSED_CONSTRUCT: Code = Code::new("E043");
    pub const MISPLACED_BRANCH: Code = Code::new("E044");
    pub const NESTING_TOO_DEEP: Code = Code::new("E045");
}

/// Variable resolution error codes
pub mod variable {
    use super::Code;

    pub const MALFORMED_PATH: Code = Code::new("E060");
    pub const PATH_TOO_DEEP: Code = Code::new("E061");
    pub const UNRESOLVED_PATH: Code = Code::new("E062");
}

/// Code generation error codes
pub mod codegen {
    use super::Code;

    pub const PROGRAM_TOO_LARGE: Code = Code::new("E080");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const SCAN_COMPLETE: Code = Code::new("I010");
    pub const CODEGEN_COMPLETE: Code = Code::new("I011");
    pub const PIPELINE_COMPLETE: Code = Code::new("I012");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

fn metadata_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    static REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries = [
            ErrorMetadata {
                code: "ERR001",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                requires_halt: true,
                description: "Internal compiler error",
                recommended_action: "Report this template and the compiler version",
            },
            ErrorMetadata {
                code: "ERR002",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                requires_halt: true,
                description: "Subsystem initialization failed",
                recommended_action: "Check logging and preference configuration",
            },
            ErrorMetadata {
                code: "E020",
                category: "Scanning",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "Directive opened but never closed",
                recommended_action: "Close the directive with '}}'",
            },
            ErrorMetadata {
                code: "E021",
                category: "Scanning",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "Directive text exceeds the length limit",
                recommended_action: "Split the directive or shorten its expression",
            },
            ErrorMetadata {
                code: "E022",
                category: "Scanning",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Template exceeds the size limit",
                recommended_action: "Split the template into partials",
            },
            ErrorMetadata {
                code: "E023",
                category: "Scanning",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Template produced too many tokens",
                recommended_action: "Split the template into partials",
            },
            ErrorMetadata {
                code: "E024",
                category: "Scanning",
                severity: Severity::Medium,
                recoverable: true,
                requires_halt: false,
                description: "Directive delimiters contain no text",
                recommended_action: "Remove the empty directive or add an expression",
            },
            ErrorMetadata {
                code: "E040",
                category: "Directive",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "Directive text does not match its family's grammar",
                recommended_action: "Check the directive against the documented forms",
            },
            ErrorMetadata {
                code: "E041",
                category: "Directive",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "End directive names an unknown construct family",
                recommended_action: "Use one of: for, if, section, form, translate",
            },
            ErrorMetadata {
                code: "E042",
                category: "Directive",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "End directive has no matching open construct",
                recommended_action: "Remove the closer or open the construct before it",
            },
            ErrorMetadata {
                code: "E043",
                category: "Directive",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "Construct still open when the template ended",
                recommended_action: "Close the construct with its end directive",
            },
            ErrorMetadata {
                code: "E044",
                category: "Directive",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "Branch directive outside an open conditional",
                recommended_action: "Move the branch inside an if construct",
            },
            ErrorMetadata {
                code: "E045",
                category: "Directive",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Constructs nested beyond the depth limit",
                recommended_action: "Flatten the template structure",
            },
            ErrorMetadata {
                code: "E060",
                category: "Variable",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "Variable reference does not match the path grammar",
                recommended_action: "Check member, index, and fallback syntax",
            },
            ErrorMetadata {
                code: "E061",
                category: "Variable",
                severity: Severity::Medium,
                recoverable: true,
                requires_halt: false,
                description: "Variable path has too many segments",
                recommended_action: "Shorten the path or restructure the data",
            },
            ErrorMetadata {
                code: "E062",
                category: "Variable",
                severity: Severity::High,
                recoverable: true,
                requires_halt: false,
                description: "Variable root is not bound in strict mode",
                recommended_action: "Declare the root, bind it in a construct, or add a fallback",
            },
            ErrorMetadata {
                code: "E080",
                category: "Codegen",
                severity: Severity::High,
                recoverable: false,
                requires_halt: true,
                description: "Compiled program exceeds the instruction limit",
                recommended_action: "Split the template into partials",
            },
        ];

        entries
            .into_iter()
            .map(|meta| (meta.code, meta))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get the severity for an error code
pub fn get_severity(code: &str) -> Severity {
    metadata_registry()
        .get(code)
        .map(|meta| meta.severity)
        .unwrap_or(Severity::Medium)
}

/// Get the category for an error code
pub fn get_category(code: &str) -> &'static str {
    metadata_registry()
        .get(code)
        .map(|meta| meta.category)
        .unwrap_or("Unknown")
}

/// Get the description for an error code
pub fn get_description(code: &str) -> &'static str {
    metadata_registry()
        .get(code)
        .map(|meta| meta.description)
        .unwrap_or("Unknown error")
}

/// Get the recommended action for an error code
pub fn get_action(code: &str) -> &'static str {
    metadata_registry()
        .get(code)
        .map(|meta| meta.recommended_action)
        .unwrap_or("No specific action available")
}

/// Check if an error code is recoverable
pub fn is_recoverable(code: &str) -> bool {
    metadata_registry()
        .get(code)
        .map(|meta| meta.recoverable)
        .unwrap_or(true)
}

/// Check if an error code requires halting compilation
pub fn requires_halt(code: &str) -> bool {
    metadata_registry()
        .get(code)
        .map(|meta| meta.requires_halt)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_all_error_constants() {
        let codes = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            scanning::UNTERMINATED_DIRECTIVE,
            scanning::DIRECTIVE_TOO_LONG,
            scanning::TEMPLATE_TOO_LARGE,
            scanning::TOO_MANY_TOKENS,
            scanning::EMPTY_DIRECTIVE,
            directive::MALFORMED_DIRECTIVE,
            directive::UNKNOWN_FAMILY,
            directive::UNMATCHED_END,
            directive::UNCLOSED_CONSTRUCT,
            directive::MISPLACED_BRANCH,
            directive::NESTING_TOO_DEEP,
            variable::MALFORMED_PATH,
            variable::PATH_TOO_DEEP,
            variable::UNRESOLVED_PATH,
            codegen::PROGRAM_TOO_LARGE,
        ];

        for code in codes {
            assert_ne!(
                get_description(code.as_str()),
                "Unknown error",
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(get_category("E041"), "Directive");
        assert_eq!(get_severity("ERR001"), Severity::Critical);
        assert!(requires_halt("E045"));
        assert!(is_recoverable("E040"));
        assert!(!is_recoverable("ERR001"));
    }
}
