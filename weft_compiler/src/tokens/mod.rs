pub mod token;

pub use token::{classify_directive, TemplateToken, TokenKind};
