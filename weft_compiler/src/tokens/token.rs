//! Token model for the template scanner
//!
//! A token is a classified fragment of raw template source: a directive
//! category plus the exact matched text. Tokens carry no parse state; all
//! higher-level meaning is derived on demand by the construct parsers.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directive categories recognized by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Passthrough text between directives
    Literal,
    /// Variable interpolation (`user.name`, `items[0] ?? 'none'`)
    Variable,
    /// Loop start (`for item in items`)
    For,
    /// Conditional start (`if user.active`)
    If,
    /// Conditional alternate with condition (`elseif user.admin`)
    ElseIf,
    /// Conditional alternate without condition (`else`)
    Else,
    /// Named block start (`section header`)
    Section,
    /// Field-binding scope start (`form user`)
    Form,
    /// Translation lookup (`translate greeting.hello`)
    Translate,
    /// Closing directive (`endfor`, `/if`, ...)
    End,
}

impl TokenKind {
    /// Keyword that introduces this kind, if any
    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            Self::For => Some("for"),
            Self::If => Some("if"),
            Self::ElseIf => Some("elseif"),
            Self::Else => Some("else"),
            Self::Section => Some("section"),
            Self::Form => Some("form"),
            Self::Translate => Some("translate"),
            Self::Literal | Self::Variable | Self::End => None,
        }
    }

    /// Check if this kind opens a construct
    pub const fn is_construct_start(self) -> bool {
        matches!(
            self,
            Self::For | Self::If | Self::Section | Self::Form | Self::Translate
        )
    }

    /// Check if this kind is a conditional branch directive
    pub const fn is_branch(self) -> bool {
        matches!(self, Self::ElseIf | Self::Else)
    }

    /// Check if this kind is a closing directive
    pub const fn is_end(self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Literal => "literal",
            Self::Variable => "variable",
            Self::For => "for",
            Self::If => "if",
            Self::ElseIf => "elseif",
            Self::Else => "else",
            Self::Section => "section",
            Self::Form => "form",
            Self::Translate => "translate",
            Self::End => "end",
        };
        write!(f, "{}", name)
    }
}

/// An immutable classified fragment of template source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateToken {
    /// Directive category
    pub kind: TokenKind,
    /// The exact matched text, unparsed. For directives this is the trimmed
    /// inner text; for literals it is the passthrough run itself.
    pub raw: String,
}

impl TemplateToken {
    /// Create a literal passthrough token
    pub fn literal(text: &str) -> Self {
        Self {
            kind: TokenKind::Literal,
            raw: text.to_string(),
        }
    }

    /// Create a directive token from trimmed inner text
    pub fn directive(raw: &str) -> Self {
        Self {
            kind: classify_directive(raw),
            raw: raw.to_string(),
        }
    }

    /// Check if this token is passthrough text
    pub fn is_literal(&self) -> bool {
        self.kind == TokenKind::Literal
    }
}

impl fmt::Display for TemplateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Literal => write!(f, "{}", self.raw),
            _ => write!(f, "{{{{ {} }}}}", self.raw),
        }
    }
}

/// Classify trimmed directive text into a token kind.
///
/// Classification is deliberately coarse: it keys on the leading keyword (or
/// closing prefix) only, leaving full grammar checks to the construct
/// parsers so malformed directives are reported against their family. Bare
/// words made of `end` plus letters are reserved for closing directives so
/// that closers naming an unknown family stay detectable.
pub fn classify_directive(raw: &str) -> TokenKind {
    if raw.starts_with('/') {
        return TokenKind::End;
    }

    let first_word = raw.split_whitespace().next().unwrap_or("");

    if is_end_word(first_word) {
        return TokenKind::End;
    }

    match first_word {
        "for" => TokenKind::For,
        "if" => TokenKind::If,
        "elseif" => TokenKind::ElseIf,
        "else" => TokenKind::Else,
        "section" => TokenKind::Section,
        "form" => TokenKind::Form,
        "translate" => TokenKind::Translate,
        _ => TokenKind::Variable,
    }
}

fn is_end_word(word: &str) -> bool {
    word.len() >= 3
        && word.starts_with("end")
        && word[3..].chars().all(|c| c.is_ascii_lowercase())
}
