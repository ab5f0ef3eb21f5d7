//! Conditional construct parser
//!
//! Compiles `if`, `elseif`, and `else` directives into branch and jump
//! instructions. A condition is either the truthiness of a single operand
//! (built on the Variable Resolver's existence check) or a comparison
//! between two operands. The driver patches the false-edge of each branch
//! to the next alternate and every taken branch's trailing jump to the
//! construct end.

use crate::grammar::variable::{self, LITERAL_PATTERN, VARIABLE_PATTERN};
use crate::grammar::Family;
use crate::ir::{CmpOp, Cond, Fragment, Instr, PLACEHOLDER_TARGET};
use crate::syntax::error::{CompileError, CompileResult};
use crate::tokens::TemplateToken;
use crate::utils::{Span, Spanned};
use once_cell::sync::Lazy;
use regex::Regex;

static IF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^if\s+(.+)$").expect("if directive regex must compile"));

static ELSEIF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^elseif\s+(.+)$").expect("elseif directive regex must compile"));

static CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    let operand = format!("(?:{}|{})", LITERAL_PATTERN, VARIABLE_PATTERN);
    Regex::new(&format!(
        r"^(?P<lhs>{operand})(?:\s*(?P<op>==|!=|>=|<=|>|<)\s*(?P<rhs>{operand}))?$",
        operand = operand
    ))
    .expect("condition regex must compile")
});

/// Parse an `if` start directive into its prologue fragment.
pub fn parse(token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    let raw = token.value.raw.as_str();

    let captures = IF_RE
        .captures(raw)
        .ok_or_else(|| CompileError::malformed(Family::If, raw, token.span))?;

    let cond = parse_condition(&captures[1], raw, token.span)?;

    Ok(Fragment::one(Instr::Branch {
        cond,
        else_target: PLACEHOLDER_TARGET,
    }))
}

/// Parse an `elseif` alternate: a jump terminating the previous branch,
/// then a fresh branch for the alternate's condition.
pub fn parse_elseif(token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    let raw = token.value.raw.as_str();

    let captures = ELSEIF_RE
        .captures(raw)
        .ok_or_else(|| CompileError::malformed(Family::If, raw, token.span))?;

    let cond = parse_condition(&captures[1], raw, token.span)?;

    Ok(Fragment::from_instrs(vec![
        Instr::Jump {
            target: PLACEHOLDER_TARGET,
        },
        Instr::Branch {
            cond,
            else_target: PLACEHOLDER_TARGET,
        },
    ]))
}

/// Parse an `else` alternate: a jump terminating the previous branch.
pub fn parse_else(token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    let raw = token.value.raw.as_str();

    if raw != "else" {
        return Err(CompileError::malformed(Family::If, raw, token.span));
    }

    Ok(Fragment::one(Instr::Jump {
        target: PLACEHOLDER_TARGET,
    }))
}

/// Parse a conditional end directive into its epilogue fragment.
pub fn parse_end(_token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    Ok(Fragment::one(Instr::BranchEnd))
}

fn parse_condition(text: &str, raw: &str, span: Span) -> CompileResult<Cond> {
    let text = text.trim();

    let captures = CONDITION_RE
        .captures(text)
        .ok_or_else(|| CompileError::malformed(Family::If, raw, span))?;

    let lhs = variable::parse_operand(&captures["lhs"], raw, span)?;

    let cmp = match (captures.name("op"), captures.name("rhs")) {
        (Some(op), Some(rhs)) => {
            let op = CmpOp::from_str(op.as_str())
                .ok_or_else(|| CompileError::malformed(Family::If, raw, span))?;
            let rhs = variable::parse_operand(rhs.as_str(), raw, span)?;
            Some((op, rhs))
        }
        _ => None,
    };

    Ok(Cond { lhs, cmp })
}
