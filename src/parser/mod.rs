//! Lexing of Python source into the token stream the formatter consumes.

pub mod lexer;
pub mod token;

pub use lexer::tokenize;
pub use token::{is_python_keyword, subtypes, Token, TokenKind};
