pub mod compile_time {
    pub mod scanning {
        /// Maximum template size allowed for compilation (4MB)
        /// SECURITY: Prevents DoS via enormous template uploads
        pub const MAX_TEMPLATE_SIZE: usize = 4 * 1024 * 1024;

        /// Maximum length of a single directive's inner text
        /// SECURITY: Bounds per-directive parsing work
        pub const MAX_DIRECTIVE_LENGTH: usize = 4_096;

        /// Maximum number of tokens produced from a single template
        /// SECURITY: Prevents DoS via token explosion
        pub const MAX_TOKEN_COUNT: usize = 100_000;
    }

    pub mod compiling {
        /// Maximum construct nesting depth (loops inside loops inside ifs ...)
        /// SECURITY: Prevents stack and frame-table exhaustion
        pub const MAX_NESTING_DEPTH: usize = 64;

        /// Maximum number of segments in a variable path
        /// SECURITY: Bounds per-reference resolution work
        pub const MAX_PATH_SEGMENTS: usize = 32;

        /// Maximum number of interpolation arguments on a translate directive
        pub const MAX_TRANSLATION_ARGS: usize = 16;

        /// Maximum instructions in a compiled program
        /// RESOURCE: Upper bound on program memory per template
        pub const MAX_PROGRAM_LENGTH: usize = 200_000;
    }

    pub mod logging {
        /// Maximum log message length before truncation
        /// RESOURCE: Limits per-event memory
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 2_048;

        /// Minimum level at which limit violations are always logged
        /// (0 = Error, 1 = Warning)
        pub const SECURITY_MIN_LOG_LEVEL: u8 = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time::*;

    #[test]
    fn test_limits_are_ordered_sanely() {
        assert!(scanning::MAX_DIRECTIVE_LENGTH < scanning::MAX_TEMPLATE_SIZE);
        assert!(scanning::MAX_TOKEN_COUNT <= compiling::MAX_PROGRAM_LENGTH);
        assert!(compiling::MAX_NESTING_DEPTH >= 16);
    }
}
