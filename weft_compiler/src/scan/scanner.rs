//! Template scanner
//!
//! One left-to-right pass over template source, alternating literal
//! passthrough runs with `{{ ... }}` directive matches. Each directive match
//! is classified into a token; all higher-level grammar is left to the
//! construct parsers.

use crate::config::constants::compile_time::scanning::*;
use crate::config::runtime::ScanPreferences;
use crate::logging::codes;
use crate::tokens::{TemplateToken, TokenKind};
use crate::utils::{Position, Span, Spanned};
use crate::{log_debug, log_error, log_success};

const OPEN_DELIM: &str = "{{";
const CLOSE_DELIM: &str = "}}";

/// Scanning errors with compile-time resource boundaries
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    #[error("Unterminated directive starting at line {line}, column {column}")]
    UnterminatedDirective { line: u32, column: u32 },

    #[error("Empty directive at line {line}, column {column}")]
    EmptyDirective { line: u32, column: u32 },

    #[error("Directive too long: {length} characters (max {MAX_DIRECTIVE_LENGTH})")]
    DirectiveTooLong { length: usize },

    #[error("Template too large: {size} bytes (max {MAX_TEMPLATE_SIZE})")]
    TemplateTooLarge { size: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize },
}

impl ScanError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            ScanError::UnterminatedDirective { .. } => codes::scanning::UNTERMINATED_DIRECTIVE,
            ScanError::EmptyDirective { .. } => codes::scanning::EMPTY_DIRECTIVE,
            ScanError::DirectiveTooLong { .. } => codes::scanning::DIRECTIVE_TOO_LONG,
            ScanError::TemplateTooLarge { .. } => codes::scanning::TEMPLATE_TOO_LARGE,
            ScanError::TooManyTokens { .. } => codes::scanning::TOO_MANY_TOKENS,
        }
    }

    /// Span of the offending source region, when one is known
    pub fn span(&self) -> Option<Span> {
        match self {
            ScanError::UnterminatedDirective { line, column }
            | ScanError::EmptyDirective { line, column } => {
                let pos = Position::new(0, *line, *column);
                Some(Span::new(pos, pos))
            }
            _ => None,
        }
    }
}

/// Essential scan metrics with runtime preferences
#[derive(Debug, Default, Clone)]
pub struct ScanMetrics {
    pub total_tokens: usize,
    pub literal_tokens: usize,
    pub directive_tokens: usize,
    pub variable_tokens: usize,
    pub end_tokens: usize,
    pub max_directive_length: usize,
    pub literal_bytes: usize,
}

impl ScanMetrics {
    fn record_token(&mut self, token: &TemplateToken, preferences: &ScanPreferences) {
        match token.kind {
            TokenKind::Literal => {
                if preferences.include_literals_in_counts {
                    self.total_tokens += 1;
                }
                self.literal_tokens += 1;
                self.literal_bytes += token.raw.len();
            }
            TokenKind::Variable => {
                self.total_tokens += 1;
                self.variable_tokens += 1;
            }
            TokenKind::End => {
                self.total_tokens += 1;
                self.end_tokens += 1;
            }
            _ => {
                self.total_tokens += 1;
                self.directive_tokens += 1;
            }
        }

        if preferences.collect_detailed_metrics && token.kind != TokenKind::Literal {
            self.max_directive_length = self.max_directive_length.max(token.raw.len());
        }
    }
}

/// Core template scanner with global logging integration and compile-time
/// resource boundaries
pub struct TemplateScanner {
    metrics: ScanMetrics,
    preferences: ScanPreferences,
}

impl TemplateScanner {
    pub fn new() -> Self {
        Self {
            metrics: ScanMetrics::default(),
            preferences: ScanPreferences::default(),
        }
    }

    pub fn with_preferences(preferences: ScanPreferences) -> Self {
        Self {
            metrics: ScanMetrics::default(),
            preferences,
        }
    }

    /// Scan template source into a token sequence.
    ///
    /// Literal runs between directives become `Literal` tokens verbatim;
    /// each `{{ ... }}` match becomes one classified directive token whose
    /// span covers the delimiters.
    pub fn scan(&mut self, source: &str) -> Result<Vec<Spanned<TemplateToken>>, ScanError> {
        self.metrics = ScanMetrics::default();

        if source.len() > MAX_TEMPLATE_SIZE {
            let error = ScanError::TemplateTooLarge { size: source.len() };
            log_error!(error.error_code(), "Template exceeds size limit",
                "size" => source.len(),
                "limit" => MAX_TEMPLATE_SIZE
            );
            return Err(error);
        }

        log_debug!("Starting template scan",
            "source_bytes" => source.len()
        );

        let mut tokens = Vec::new();
        let mut pos = Position::start();
        let mut rest = source;

        while !rest.is_empty() {
            match rest.find(OPEN_DELIM) {
                Some(open_at) => {
                    if open_at > 0 {
                        let (literal, after) = rest.split_at(open_at);
                        pos = self.push_literal(&mut tokens, literal, pos)?;
                        rest = after;
                    }

                    let open_pos = pos;
                    let body = &rest[OPEN_DELIM.len()..];

                    let close_at = body.find(CLOSE_DELIM).ok_or({
                        ScanError::UnterminatedDirective {
                            line: open_pos.line,
                            column: open_pos.column,
                        }
                    })?;

                    let inner = &body[..close_at];
                    if inner.len() > MAX_DIRECTIVE_LENGTH {
                        let error = ScanError::DirectiveTooLong {
                            length: inner.len(),
                        };
                        log_error!(error.error_code(), "Directive exceeds length limit",
                            "length" => inner.len(),
                            "limit" => MAX_DIRECTIVE_LENGTH
                        );
                        return Err(error);
                    }

                    let trimmed = inner.trim();
                    if trimmed.is_empty() {
                        return Err(ScanError::EmptyDirective {
                            line: open_pos.line,
                            column: open_pos.column,
                        });
                    }

                    let matched_len = OPEN_DELIM.len() + close_at + CLOSE_DELIM.len();
                    let matched = &rest[..matched_len];
                    let end_pos = pos.advance_str(matched);

                    let token = TemplateToken::directive(trimmed);
                    self.metrics.record_token(&token, &self.preferences);
                    tokens.push(Spanned::new(token, Span::new(open_pos, end_pos)));
                    self.check_token_count(tokens.len())?;

                    pos = end_pos;
                    rest = &rest[matched_len..];
                }
                None => {
                    pos = self.push_literal(&mut tokens, rest, pos)?;
                    rest = "";
                }
            }
        }

        log_success!(codes::success::SCAN_COMPLETE,
            "Template scan completed successfully",
            "token_count" => tokens.len(),
            "literals" => self.metrics.literal_tokens,
            "directives" => self.metrics.directive_tokens,
            "variables" => self.metrics.variable_tokens,
            "ends" => self.metrics.end_tokens,
            "literal_bytes" => self.metrics.literal_bytes
        );

        let _ = pos;
        Ok(tokens)
    }

    /// Get metrics for the most recent scan
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    fn push_literal(
        &mut self,
        tokens: &mut Vec<Spanned<TemplateToken>>,
        text: &str,
        start: Position,
    ) -> Result<Position, ScanError> {
        let end = start.advance_str(text);
        let token = TemplateToken::literal(text);
        self.metrics.record_token(&token, &self.preferences);
        tokens.push(Spanned::new(token, Span::new(start, end)));
        self.check_token_count(tokens.len())?;
        Ok(end)
    }

    fn check_token_count(&self, count: usize) -> Result<(), ScanError> {
        if count > MAX_TOKEN_COUNT {
            let error = ScanError::TooManyTokens { count };
            log_error!(error.error_code(), "Token limit exceeded",
                "count" => count,
                "limit" => MAX_TOKEN_COUNT
            );
            return Err(error);
        }
        Ok(())
    }
}

impl Default for TemplateScanner {
    fn default() -> Self {
        Self::new()
    }
}
