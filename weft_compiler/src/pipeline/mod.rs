//! Compilation pipeline
//!
//! The single entry point collaborators use: raw template text in, a
//! validated compiled program (plus stats) or a structured compile error
//! out. Compilation is synchronous and single-threaded; concurrent callers
//! compile independent templates with no shared state.

mod result;
mod stats;

pub use result::PipelineResult;
pub use stats::CompileStats;

use crate::logging;
use crate::scan::TemplateScanner;
use crate::syntax::{CompileError, CompileOptions, TemplateCompiler};
use crate::utils::SourceMap;
use crate::{log_error, log_info};
use std::time::Instant;

/// Compile a template with default options (safe-default variable mode).
pub fn compile_template(name: &str, source: &str) -> Result<PipelineResult, CompileError> {
    compile_template_with_options(name, source, CompileOptions::default())
}

/// Compile a template through the complete pipeline
/// (scan -> construct parsing -> code generation -> program validation).
pub fn compile_template_with_options(
    name: &str,
    source: &str,
    options: CompileOptions,
) -> Result<PipelineResult, CompileError> {
    let start_time = Instant::now();

    logging::with_template_context(name, || {
        log_info!("Starting template compilation pipeline",
            "template" => name,
            "source_bytes" => source.len()
        );

        // Stage 1: scanning
        let mut scanner = TemplateScanner::new();
        let tokens = scanner.scan(source).inspect_err(|error| {
            log_error!(error.error_code(), "Template scanning failed",
                "template" => name
            );
        })?;
        let scan_metrics = scanner.metrics().clone();

        // Stage 2: construct parsing and code generation
        let program = TemplateCompiler::new(options)
            .compile(&tokens)
            .inspect_err(|error| {
                log_error!(error.error_code(), "Template compilation failed",
                    span = error.span().unwrap_or_default(),
                    "template" => name,
                    "raw" => error.raw().unwrap_or("")
                );
            })?;

        // Stage 3: program validation (backpatched targets must be sound)
        program.validate().map_err(|error| CompileError::Internal {
            message: error.to_string(),
        })?;

        crate::log_debug!("Compiled program listing",
            "listing" => program.listing()
        );

        let stats = CompileStats::new(&scan_metrics, program.len(), start_time.elapsed());
        let result = PipelineResult::new(name, program, stats);
        result.log_success();

        Ok(result)
    })
}

/// Format a compile error with source context: the offending line plus a
/// caret underline, cargo-style.
pub fn format_compile_error(source: &str, error: &CompileError) -> String {
    match error.span() {
        Some(span) => SourceMap::new(source.to_string()).format_error(&span, &error.to_string()),
        None => format!("Error: {}", error),
    }
}
