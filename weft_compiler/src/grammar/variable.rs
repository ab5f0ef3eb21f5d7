//! Variable Resolver
//!
//! Translates directive-level variable references (`user.address.city`,
//! `items[0]`, `settings['theme'] ?? 'light'`) into structured lookups that
//! are safe against missing intermediate keys. The loop and conditional
//! parsers embed this module's pattern fragments inside their own grammars.

use crate::config::constants::compile_time::compiling::MAX_PATH_SEGMENTS;
use crate::ir::{Operand, ScalarLit, Segment, VarRef};
use crate::syntax::error::{CompileError, CompileResult};
use crate::utils::Span;
use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern fragment matching one variable reference path (no anchors, no
/// captures). Embedded by the loop and conditional grammars.
pub const VARIABLE_PATTERN: &str =
    r#"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*|\[[0-9]+\]|\['[^']*'\]|\["[^"]*"\])*"#;

/// Pattern fragment matching one scalar literal (no anchors, no captures).
pub const LITERAL_PATTERN: &str = r#"'[^']*'|"[^"]*"|-?[0-9]+(?:\.[0-9]+)?|true|false"#;

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({path})(?:\s*\?\?\s*({lit}))?$",
        path = VARIABLE_PATTERN,
        lit = LITERAL_PATTERN
    ))
    .expect("variable reference regex must compile")
});

static LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^(?:{})$", LITERAL_PATTERN)).expect("literal regex must compile")
});

/// Check if a character may appear inside a variable reference token.
/// Reused by collaborators that need a cheap pre-check before parsing.
pub fn is_variable_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '\'' | '"')
}

/// Parse a full variable reference: a path with an optional `?? <literal>`
/// fallback. `raw` is the surrounding directive text used in errors.
pub fn parse_variable_reference(expr: &str, raw: &str, span: Span) -> CompileResult<VarRef> {
    let expr = expr.trim();

    let captures = VARIABLE_RE.captures(expr).ok_or_else(|| {
        CompileError::malformed_variable(raw, "does not match the path grammar", span)
    })?;

    let segments = parse_path(&captures[1], raw, span)?;
    let fallback = match captures.get(2) {
        Some(lit) => Some(parse_literal(lit.as_str(), raw, span)?),
        None => None,
    };

    Ok(VarRef { segments, fallback })
}

/// Parse a bare path (no fallback allowed), as embedded in loop iterables.
pub fn parse_path_reference(expr: &str, raw: &str, span: Span) -> CompileResult<VarRef> {
    Ok(VarRef::new(parse_path(expr.trim(), raw, span)?))
}

/// Parse one comparison operand: a scalar literal or a variable path.
pub fn parse_operand(expr: &str, raw: &str, span: Span) -> CompileResult<Operand> {
    let expr = expr.trim();
    if LITERAL_RE.is_match(expr) {
        Ok(Operand::Lit(parse_literal(expr, raw, span)?))
    } else {
        Ok(Operand::Path(parse_path_reference(expr, raw, span)?))
    }
}

/// Parse a scalar literal as written in directive text.
pub fn parse_literal(expr: &str, raw: &str, span: Span) -> CompileResult<ScalarLit> {
    let expr = expr.trim();

    if (expr.starts_with('\'') && expr.ends_with('\'') && expr.len() >= 2)
        || (expr.starts_with('"') && expr.ends_with('"') && expr.len() >= 2)
    {
        return Ok(ScalarLit::Str(expr[1..expr.len() - 1].to_string()));
    }

    match expr {
        "true" => return Ok(ScalarLit::Bool(true)),
        "false" => return Ok(ScalarLit::Bool(false)),
        _ => {}
    }

    if expr.contains('.') {
        if let Ok(value) = expr.parse::<f64>() {
            if value.is_finite() {
                return Ok(ScalarLit::Float(value));
            }
        }
    } else if let Ok(value) = expr.parse::<i64>() {
        return Ok(ScalarLit::Int(value));
    }

    Err(CompileError::malformed_variable(
        raw,
        "fallback is not a valid literal",
        span,
    ))
}

fn parse_path(expr: &str, raw: &str, span: Span) -> CompileResult<Vec<Segment>> {
    let mut chars = expr.char_indices().peekable();
    let mut segments = Vec::new();

    let root = read_ident(expr, &mut chars)
        .ok_or_else(|| CompileError::malformed_variable(raw, "path must start with a name", span))?;
    segments.push(Segment::Member(root));

    while let Some(&(_, ch)) = chars.peek() {
        match ch {
            '.' => {
                chars.next();
                let name = read_ident(expr, &mut chars).ok_or_else(|| {
                    CompileError::malformed_variable(raw, "expected a name after '.'", span)
                })?;
                segments.push(Segment::Member(name));
            }
            '[' => {
                chars.next();
                segments.push(read_bracket(expr, &mut chars, raw, span)?);
            }
            _ => {
                return Err(CompileError::malformed_variable(
                    raw,
                    "unexpected character in path",
                    span,
                ));
            }
        }

        if segments.len() > MAX_PATH_SEGMENTS {
            return Err(CompileError::PathTooDeep {
                raw: raw.to_string(),
                segments: segments.len(),
                span,
            });
        }
    }

    Ok(segments)
}

fn read_ident(
    expr: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Option<String> {
    let (start, first) = *chars.peek()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    chars.next();

    let mut end = start + first.len_utf8();
    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            chars.next();
            end = offset + ch.len_utf8();
        } else {
            break;
        }
    }

    Some(expr[start..end].to_string())
}

fn read_bracket(
    expr: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    raw: &str,
    span: Span,
) -> CompileResult<Segment> {
    let segment = match chars.peek() {
        Some(&(_, quote)) if quote == '\'' || quote == '"' => {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next() {
                    Some((_, ch)) if ch == quote => break,
                    Some((_, ch)) => key.push(ch),
                    None => {
                        return Err(CompileError::malformed_variable(
                            raw,
                            "unterminated string key",
                            span,
                        ));
                    }
                }
            }
            Segment::Key(key)
        }
        Some(&(_, digit)) if digit.is_ascii_digit() => {
            let mut digits = String::new();
            while let Some(&(_, ch)) = chars.peek() {
                if ch.is_ascii_digit() {
                    digits.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            let index = digits.parse::<i64>().map_err(|_| {
                CompileError::malformed_variable(raw, "index is not a valid integer", span)
            })?;
            Segment::Index(index)
        }
        _ => {
            return Err(CompileError::malformed_variable(
                raw,
                "expected an index or string key after '['",
                span,
            ));
        }
    };

    match chars.next() {
        Some((_, ']')) => Ok(segment),
        _ => Err(CompileError::malformed_variable(
            raw,
            "expected ']' after index",
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::error::CompileErrorKind;
    use assert_matches::assert_matches;

    fn span() -> Span {
        Span::dummy()
    }

    #[test]
    fn test_dotted_member_access() {
        let var = parse_variable_reference("user.address.city", "user.address.city", span())
            .unwrap();

        assert_eq!(
            var.segments,
            vec![
                Segment::Member("user".to_string()),
                Segment::Member("address".to_string()),
                Segment::Member("city".to_string()),
            ]
        );
        assert_eq!(var.root(), "user");
        assert!(var.fallback.is_none());
    }

    #[test]
    fn test_bracketed_access() {
        let var = parse_variable_reference("items[0].name", "items[0].name", span()).unwrap();
        assert_eq!(var.segments[1], Segment::Index(0));

        let keyed =
            parse_variable_reference("settings['theme']", "settings['theme']", span()).unwrap();
        assert_eq!(keyed.segments[1], Segment::Key("theme".to_string()));

        let double_quoted =
            parse_variable_reference(r#"settings["theme"]"#, "raw", span()).unwrap();
        assert_eq!(double_quoted.segments[1], Segment::Key("theme".to_string()));
    }

    #[test]
    fn test_literal_fallback() {
        let var =
            parse_variable_reference("user.nickname ?? 'guest'", "raw", span()).unwrap();
        assert_eq!(var.fallback, Some(ScalarLit::Str("guest".to_string())));

        let numeric = parse_variable_reference("retries ?? 3", "raw", span()).unwrap();
        assert_eq!(numeric.fallback, Some(ScalarLit::Int(3)));

        let boolean = parse_variable_reference("flag ?? false", "raw", span()).unwrap();
        assert_eq!(boolean.fallback, Some(ScalarLit::Bool(false)));
    }

    #[test]
    fn test_malformed_paths() {
        for bad in ["user..name", "user.", "[0]", "user[", "user[0", "user['x", "9user"] {
            let result = parse_variable_reference(bad, bad, span());
            let error = result.expect_err(bad);
            assert_eq!(error.kind(), CompileErrorKind::MalformedDirective);
        }
    }

    #[test]
    fn test_path_depth_limit() {
        let deep = format!("a{}", ".b".repeat(MAX_PATH_SEGMENTS + 1));
        assert_matches!(
            parse_variable_reference(&deep, &deep, span()),
            Err(CompileError::PathTooDeep { .. })
        );
    }

    #[test]
    fn test_operands() {
        assert_matches!(
            parse_operand("'admin'", "raw", span()).unwrap(),
            Operand::Lit(ScalarLit::Str(s)) if s == "admin"
        );
        assert_matches!(
            parse_operand("18", "raw", span()).unwrap(),
            Operand::Lit(ScalarLit::Int(18))
        );
        assert_matches!(
            parse_operand("2.5", "raw", span()).unwrap(),
            Operand::Lit(ScalarLit::Float(_))
        );
        assert_matches!(
            parse_operand("true", "raw", span()).unwrap(),
            Operand::Lit(ScalarLit::Bool(true))
        );
        assert_matches!(
            parse_operand("user.age", "raw", span()).unwrap(),
            Operand::Path(_)
        );
    }

    #[test]
    fn test_variable_char_predicate() {
        for good in ['a', 'Z', '0', '_', '.', '[', ']', '\'', '"'] {
            assert!(is_variable_char(good), "{}", good);
        }
        for bad in [' ', '-', '{', '}', '?'] {
            assert!(!is_variable_char(bad), "{}", bad);
        }
    }

    #[test]
    fn test_pattern_fragment_is_embeddable() {
        let re = Regex::new(&format!("^{}$", VARIABLE_PATTERN)).unwrap();
        assert!(re.is_match("user.address.city"));
        assert!(re.is_match("items[0]"));
        assert!(re.is_match("settings['theme']"));
        assert!(!re.is_match("user name"));
    }
}
