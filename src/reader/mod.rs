pub mod ast;
mod lexer;
mod parser;
mod token;

// Re-export public API
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{SourceLoc, Token, TokenWithLoc};

use crate::error::LResult;
use ast::FunctionProto;
use std::rc::Rc;

/// Lex and parse a chunk into its main function.
pub fn parse(source: &str, chunk: &str) -> LResult<Rc<FunctionProto>> {
    let tokens = Lexer::new(source, chunk).tokenize()?;
    Parser::new(tokens, chunk).parse_chunk()
}
