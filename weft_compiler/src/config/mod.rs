pub mod constants;
pub mod runtime;

pub use constants::compile_time;
pub use runtime::{
    CompilerPreferences, LogLevel, LoggingPreferences, PreferenceFileError, RuntimePreferences,
    ScanPreferences,
};
