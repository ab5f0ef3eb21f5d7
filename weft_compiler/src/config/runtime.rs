// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Log level as expressed in preference files and environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub fn to_events_log_level(self) -> crate::logging::LogLevel {
        match self {
            LogLevel::Error => crate::logging::LogLevel::Error,
            LogLevel::Warning => crate::logging::LogLevel::Warning,
            LogLevel::Info => crate::logging::LogLevel::Info,
            LogLevel::Debug => crate::logging::LogLevel::Debug,
        }
    }

    fn from_env_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanPreferences {
    /// Whether to collect detailed token metrics
    pub collect_detailed_metrics: bool,

    /// Whether to include literal runs in token counts
    pub include_literals_in_counts: bool,

    /// Whether to show position information in error messages
    pub include_position_in_errors: bool,
}

impl Default for ScanPreferences {
    fn default() -> Self {
        Self {
            collect_detailed_metrics: env::var("WEFT_SCAN_DETAILED_METRICS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_literals_in_counts: env::var("WEFT_SCAN_INCLUDE_LITERALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_position_in_errors: env::var("WEFT_SCAN_INCLUDE_POSITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerPreferences {
    /// Whether fallback-less variable references are validated against the
    /// compile-time binding environment (strict mode)
    pub strict_variables: bool,

    /// Root names the render context promises to provide, consulted only
    /// in strict mode
    pub known_roots: Vec<String>,
}

impl Default for CompilerPreferences {
    fn default() -> Self {
        Self {
            strict_variables: env::var("WEFT_STRICT_VARIABLES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            known_roots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Minimum log level to emit
    pub min_log_level: LogLevel,

    /// Whether to emit JSON events instead of plain text
    pub use_structured_logging: bool,

    /// Whether to write events to the console at all
    pub enable_console_logging: bool,

    /// Whether to include the template-name context on every event
    pub include_template_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            min_log_level: env::var("WEFT_LOG_LEVEL")
                .ok()
                .and_then(|v| LogLevel::from_env_str(&v))
                .unwrap_or(LogLevel::Warning),
            use_structured_logging: env::var("WEFT_STRUCTURED_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var("WEFT_CONSOLE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_template_context: env::var("WEFT_LOG_TEMPLATE_CONTEXT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

/// All runtime preferences, loadable from a TOML preference file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimePreferences {
    pub scan: ScanPreferences,
    pub compiler: CompilerPreferences,
    pub logging: LoggingPreferences,
}

/// Errors raised while loading a preference file
#[derive(Debug, thiserror::Error)]
pub enum PreferenceFileError {
    #[error("Preference file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RuntimePreferences {
    /// Load preferences from a TOML file. Keys not present in the file fall
    /// back to their environment-variable defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, PreferenceFileError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse preferences from a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, PreferenceFileError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_lenient() {
        let prefs = CompilerPreferences::default();
        assert!(!prefs.strict_variables);
        assert!(prefs.known_roots.is_empty());
    }

    #[test]
    fn test_toml_round_trip() {
        let text = r#"
            [compiler]
            strict_variables = true
            known_roots = ["users", "title"]

            [logging]
            min_log_level = "debug"
            use_structured_logging = true
        "#;

        let prefs = RuntimePreferences::from_toml_str(text).unwrap();
        assert!(prefs.compiler.strict_variables);
        assert_eq!(prefs.compiler.known_roots, vec!["users", "title"]);
        assert_eq!(prefs.logging.min_log_level, LogLevel::Debug);
        assert!(prefs.logging.use_structured_logging);
        // Untouched section keeps its defaults
        assert!(prefs.scan.include_position_in_errors);
    }

    #[test]
    fn test_toml_file_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scan]\ncollect_detailed_metrics = false").unwrap();

        let prefs = RuntimePreferences::from_toml_file(file.path()).unwrap();
        assert!(!prefs.scan.collect_detailed_metrics);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = RuntimePreferences::from_toml_str("[compiler\nbroken");
        assert!(matches!(result, Err(PreferenceFileError::Parse(_))));
    }
}
