//! Translation construct parser
//!
//! Compiles `translate <key> [<arg>...]` into a catalog lookup. Arguments
//! are variable references whose rendered values substitute `{0}`, `{1}`,
//! ... placeholders in the localized text. A translation needs no body, so
//! its end directive compiles to an empty epilogue and exists only for
//! syntactic symmetry with the other families.

use crate::config::constants::compile_time::compiling::MAX_TRANSLATION_ARGS;
use crate::grammar::variable::{self, VARIABLE_PATTERN};
use crate::grammar::Family;
use crate::ir::{Fragment, Instr};
use crate::syntax::error::{CompileError, CompileResult};
use crate::tokens::TemplateToken;
use crate::utils::Spanned;
use once_cell::sync::Lazy;
use regex::Regex;

static TRANSLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^translate\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)((?:\s+{path})*)$",
        path = VARIABLE_PATTERN
    ))
    .expect("translate directive regex must compile")
});

/// Parse a translate directive into its prologue fragment.
pub fn parse(token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    let raw = token.value.raw.as_str();

    let captures = TRANSLATE_RE
        .captures(raw)
        .ok_or_else(|| CompileError::malformed(Family::Translate, raw, token.span))?;

    let key = captures[1].to_string();

    let mut args = Vec::new();
    for arg in captures[2].split_whitespace() {
        args.push(variable::parse_path_reference(arg, raw, token.span)?);
    }

    if args.len() > MAX_TRANSLATION_ARGS {
        return Err(CompileError::malformed(Family::Translate, raw, token.span));
    }

    Ok(Fragment::one(Instr::Translate { key, args }))
}

/// Parse a translation end directive: no epilogue beyond marking the key
/// resolved.
pub fn parse_end(_token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    Ok(Fragment::empty())
}
