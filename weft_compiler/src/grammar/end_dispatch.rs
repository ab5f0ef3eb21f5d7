//! End-Directive Dispatcher
//!
//! Given a closing directive token (`/for`, `endif`, ...), resolves which
//! construct family it closes and delegates to that family's epilogue
//! parser. The dispatcher holds no nesting state: matching a closer to the
//! specific open construct is the scanning driver's job; this module only
//! resolves the grammar family.

use crate::grammar::{parser_for, Family};
use crate::ir::Fragment;
use crate::syntax::error::{CompileError, CompileResult};
use crate::tokens::TemplateToken;
use crate::utils::Spanned;
use once_cell::sync::Lazy;
use regex::Regex;

static END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:/\s*|end)([a-z]+)$").expect("end directive regex must compile"));

/// Resolve an end directive and produce its family's epilogue fragment.
///
/// A raw string that fails the closing-pattern grammar entirely is a
/// malformed directive; one that matches but names a family outside the
/// fixed set is an unknown family. The two are distinct errors.
pub fn dispatch_end(token: &Spanned<TemplateToken>) -> CompileResult<(Family, Fragment)> {
    let raw = token.value.raw.as_str();

    let captures = END_RE.captures(raw).ok_or_else(|| CompileError::MalformedEnd {
        raw: raw.to_string(),
        span: token.span,
    })?;

    let name = &captures[1];
    let family =
        Family::from_name(name).ok_or_else(|| CompileError::UnknownDirectiveFamily {
            name: name.to_string(),
            raw: raw.to_string(),
            span: token.span,
        })?;

    let fragment = (parser_for(family).parse_end)(token)?;
    Ok((family, fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Instr;
    use crate::syntax::error::CompileErrorKind;
    use crate::utils::Span;
    use assert_matches::assert_matches;

    fn token(raw: &str) -> Spanned<TemplateToken> {
        Spanned::new(TemplateToken::directive(raw), Span::dummy())
    }

    #[test]
    fn test_both_closing_forms_resolve() {
        for (raw, family) in [
            ("endfor", Family::For),
            ("/for", Family::For),
            ("endif", Family::If),
            ("/if", Family::If),
            ("endsection", Family::Section),
            ("/section", Family::Section),
            ("endform", Family::Form),
            ("/form", Family::Form),
            ("endtranslate", Family::Translate),
            ("/translate", Family::Translate),
        ] {
            let (resolved, _) = dispatch_end(&token(raw)).unwrap();
            assert_eq!(resolved, family, "{}", raw);
        }
    }

    #[test]
    fn test_dispatch_produces_family_epilogue() {
        let (_, fragment) = dispatch_end(&token("endfor")).unwrap();
        assert_matches!(&fragment.instrs[..], [Instr::LoopEnd { .. }]);

        let (_, fragment) = dispatch_end(&token("/if")).unwrap();
        assert_matches!(&fragment.instrs[..], [Instr::BranchEnd]);

        let (_, fragment) = dispatch_end(&token("/translate")).unwrap();
        assert!(fragment.instrs.is_empty());
    }

    #[test]
    fn test_unknown_family_is_reported() {
        let error = dispatch_end(&token("endwhile")).unwrap_err();
        assert_eq!(error.kind(), CompileErrorKind::UnknownDirectiveFamily);
        assert_matches!(
            error,
            CompileError::UnknownDirectiveFamily { name, .. } if name == "while"
        );
    }

    #[test]
    fn test_malformed_closer_is_distinct_from_unknown() {
        for bad in ["end", "/ 123", "/", "endFor"] {
            let error = dispatch_end(&token(bad)).expect_err(bad);
            assert_eq!(error.kind(), CompileErrorKind::MalformedDirective);
            assert_matches!(error, CompileError::MalformedEnd { .. });
        }
    }
}
