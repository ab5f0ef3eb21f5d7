//! Loop construct parser
//!
//! Compiles `for <item> in <iterable>` into a guarded loop. The prologue
//! instruction guards the iterable's existence, chains any already-active
//! loop context as `parent`, and establishes per-iteration metadata
//! (`index`, `count`, `first`, `last`, `even`, `odd`, `key`). The epilogue
//! instruction advances the iteration and restores the parent context on
//! exit, so surrounding code sees the outer context unchanged.

use crate::grammar::variable::{self, VARIABLE_PATTERN};
use crate::grammar::Family;
use crate::ir::{Fragment, Instr, PLACEHOLDER_TARGET};
use crate::syntax::error::{CompileError, CompileResult};
use crate::tokens::TemplateToken;
use crate::utils::Spanned;
use once_cell::sync::Lazy;
use regex::Regex;

/// The name the loop metadata record is addressable under inside a body
pub const LOOP_META_NAME: &str = "loop";

static FOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^for\s+([A-Za-z_][A-Za-z0-9_]*)\s+in\s+({path})$",
        path = VARIABLE_PATTERN
    ))
    .expect("for directive regex must compile")
});

/// Parse a loop start directive into its prologue fragment.
///
/// The jump target is a placeholder; the driver patches it to one past the
/// matching `LoopEnd` once the closer arrives. A missing iterable then
/// compiles to a no-op body: the guard jump simply skips the construct.
pub fn parse(token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    let raw = token.value.raw.as_str();

    let captures = FOR_RE
        .captures(raw)
        .ok_or_else(|| CompileError::malformed(Family::For, raw, token.span))?;

    let binding = captures[1].to_string();
    if binding == LOOP_META_NAME {
        return Err(CompileError::malformed(Family::For, raw, token.span));
    }

    let iterable = variable::parse_path_reference(&captures[2], raw, token.span)?;

    Ok(Fragment::one(Instr::LoopStart {
        binding,
        iterable,
        end_target: PLACEHOLDER_TARGET,
    }))
}

/// Parse a loop end directive into its epilogue fragment.
///
/// The start target is a placeholder; the driver patches it to the matching
/// `LoopStart` so the interpreter can jump back for the next iteration.
pub fn parse_end(_token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    Ok(Fragment::one(Instr::LoopEnd {
        start_target: PLACEHOLDER_TARGET,
    }))
}
