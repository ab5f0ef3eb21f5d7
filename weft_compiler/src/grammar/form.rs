//! Form construct parser
//!
//! Compiles `form <entity>` into a field-binding scope. Inside the body,
//! references rooted at the entity name resolve against the entity's
//! field/attribute map supplied by the render context's entity catalog.

use crate::grammar::Family;
use crate::ir::{Fragment, Instr};
use crate::syntax::error::{CompileError, CompileResult};
use crate::tokens::TemplateToken;
use crate::utils::Spanned;
use once_cell::sync::Lazy;
use regex::Regex;

static FORM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^form\s+([A-Za-z_][A-Za-z0-9_]*)$").expect("form directive regex must compile")
});

/// Parse a form start directive into its prologue fragment.
pub fn parse(token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    let raw = token.value.raw.as_str();

    let captures = FORM_RE
        .captures(raw)
        .ok_or_else(|| CompileError::malformed(Family::Form, raw, token.span))?;

    Ok(Fragment::one(Instr::FormStart {
        entity: captures[1].to_string(),
    }))
}

/// Parse a form end directive into its epilogue fragment.
pub fn parse_end(_token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    Ok(Fragment::one(Instr::FormEnd))
}
