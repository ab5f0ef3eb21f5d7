use crate::ir::Program;
use crate::log_success;
use crate::logging::codes;
use crate::pipeline::stats::CompileStats;
use chrono::{DateTime, Utc};

/// Successful pipeline output: the compiled program plus run metadata.
/// The program is the unit hosts cache and render repeatedly.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Template name as given by the caller
    pub template: String,
    /// The compiled, validated program
    pub program: Program,
    /// Run statistics
    pub stats: CompileStats,
    /// When compilation finished
    pub compiled_at: DateTime<Utc>,
}

impl PipelineResult {
    pub fn new(template: &str, program: Program, stats: CompileStats) -> Self {
        Self {
            template: template.to_string(),
            program,
            stats,
            compiled_at: Utc::now(),
        }
    }

    /// Log a success summary for this run
    pub fn log_success(&self) {
        log_success!(codes::success::PIPELINE_COMPLETE,
            "Template compiled successfully",
            "template" => self.template,
            "tokens" => self.stats.token_count,
            "instructions" => self.stats.instruction_count,
            "duration_ms" => self.stats.compile_duration.as_secs_f64() * 1000.0,
            "tokens_per_ms" => format!("{:.2}", self.stats.tokens_per_ms()),
            "compiled_at" => self.compiled_at.to_rfc3339()
        );
    }
}
