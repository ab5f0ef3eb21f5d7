//! Section construct parser
//!
//! Compiles `section <name>` into capture markers. The render step emits the
//! body inline and also records it under the section's name, so a host
//! layout step can reuse the captured block.

use crate::grammar::Family;
use crate::ir::{Fragment, Instr};
use crate::syntax::error::{CompileError, CompileResult};
use crate::tokens::TemplateToken;
use crate::utils::Spanned;
use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^section\s+([A-Za-z_][A-Za-z0-9_]*)$").expect("section directive regex must compile")
});

/// Parse a section start directive into its prologue fragment.
pub fn parse(token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    let raw = token.value.raw.as_str();

    let captures = SECTION_RE
        .captures(raw)
        .ok_or_else(|| CompileError::malformed(Family::Section, raw, token.span))?;

    Ok(Fragment::one(Instr::SectionStart {
        name: captures[1].to_string(),
    }))
}

/// Parse a section end directive into its epilogue fragment.
pub fn parse_end(_token: &Spanned<TemplateToken>) -> CompileResult<Fragment> {
    Ok(Fragment::one(Instr::SectionEnd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::error::CompileErrorKind;
    use crate::utils::Span;
    use assert_matches::assert_matches;

    fn token(raw: &str) -> Spanned<TemplateToken> {
        Spanned::new(TemplateToken::directive(raw), Span::dummy())
    }

    #[test]
    fn test_parse_section() {
        let fragment = parse(&token("section header")).unwrap();
        assert_matches!(
            &fragment.instrs[..],
            [Instr::SectionStart { name }] if name == "header"
        );
    }

    #[test]
    fn test_malformed_section() {
        for bad in ["section", "section two words", "section 9lives"] {
            let error = parse(&token(bad)).expect_err(bad);
            assert_eq!(error.kind(), CompileErrorKind::MalformedDirective);
        }
    }

    #[test]
    fn test_parse_end() {
        let fragment = parse_end(&token("endsection")).unwrap();
        assert_matches!(&fragment.instrs[..], [Instr::SectionEnd]);
    }
}
