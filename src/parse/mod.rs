pub mod ast;
mod error;
mod parser;
pub mod visit;

use crate::lex::Lexeme;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{Associativity, OperatorInfo, Parser, PrecedenceTable};

/// Parses `lexemes` with the given operator table. The resulting notation is
/// the concatenation of the lexemes' source text; use [`Parser::with_notation`]
/// to keep the caller's original spelling.
pub fn parse(lexemes: &[Lexeme], precedence: &PrecedenceTable) -> Result<ast::Expression, ParseError> {
    Parser::new(lexemes, precedence).parse()
}
