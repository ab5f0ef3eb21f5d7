//! Directive grammar: one construct parser per directive family
//!
//! Families are fixed and registered in a table mapping family name to a
//! `(parse, parse_end)` function pair, keeping dispatch closed while
//! leaving room for table additions.

pub mod conditional;
pub mod end_dispatch;
pub mod form;
pub mod loops;
pub mod section;
pub mod translate;
pub mod variable;

use crate::ir::Fragment;
use crate::syntax::error::CompileResult;
use crate::tokens::TemplateToken;
use crate::utils::Spanned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of construct families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    For,
    If,
    Section,
    Form,
    Translate,
}

impl Family {
    /// The name a closing directive uses for this family
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::For => "for",
            Self::If => "if",
            Self::Section => "section",
            Self::Form => "form",
            Self::Translate => "translate",
        }
    }

    /// Resolve a family name from a closing directive. The set is
    /// exhaustive; anything else is an unknown family.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "for" => Some(Self::For),
            "if" => Some(Self::If),
            "section" => Some(Self::Section),
            "form" => Some(Self::Form),
            "translate" => Some(Self::Translate),
            _ => None,
        }
    }

    /// Whether this family participates in the construct-nesting stack.
    /// Translations have no body, so their closer is optional.
    pub const fn requires_end(self) -> bool {
        !matches!(self, Self::Translate)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A construct parser: prologue generation for the start directive and
/// epilogue generation for the matching end directive
pub type ParseFn = fn(&Spanned<TemplateToken>) -> CompileResult<Fragment>;

pub struct ConstructParser {
    pub family: Family,
    pub parse: ParseFn,
    pub parse_end: ParseFn,
}

/// Fixed registry of family-name -> (parse, parse_end) pairs
pub static CONSTRUCT_PARSERS: &[ConstructParser] = &[
    ConstructParser {
        family: Family::For,
        parse: loops::parse,
        parse_end: loops::parse_end,
    },
    ConstructParser {
        family: Family::If,
        parse: conditional::parse,
        parse_end: conditional::parse_end,
    },
    ConstructParser {
        family: Family::Section,
        parse: section::parse,
        parse_end: section::parse_end,
    },
    ConstructParser {
        family: Family::Form,
        parse: form::parse,
        parse_end: form::parse_end,
    },
    ConstructParser {
        family: Family::Translate,
        parse: translate::parse,
        parse_end: translate::parse_end,
    },
];

/// Look up the registered parser for a family
pub fn parser_for(family: Family) -> &'static ConstructParser {
    CONSTRUCT_PARSERS
        .iter()
        .find(|entry| entry.family == family)
        .expect("every family is registered")
}
