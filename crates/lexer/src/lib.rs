pub mod error;
pub mod lexer;

pub use error::LexError;
pub use lexer::{lex, Token, TokenKind};
