use crate::lex::LexemeKind;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("error at position {} ({slice:?}) in {notation:?}: {kind}", .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub slice: String,
    pub notation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    Empty,
    UnexpectedEnd,
    UnexpectedLexeme(LexemeKind),
    UnbalancedParenthesis,
    ModifierWithoutDice(LexemeKind),
    UnexpectedReference(LexemeKind),
    InvalidDice,
    InvalidModifier,
    UnknownOperator(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("nothing to roll"),
            Self::UnexpectedEnd => f.write_str("expected a value, found end of input"),
            Self::UnexpectedLexeme(kind) => write!(f, "unexpected {} lexeme", kind),
            Self::UnbalancedParenthesis => f.write_str("unbalanced parenthesis"),
            Self::ModifierWithoutDice(kind) => {
                write!(f, "{} modifier must follow a dice group", kind)
            }
            Self::UnexpectedReference(kind) => {
                write!(f, "{} reference cannot be part of a dice expression", kind)
            }
            Self::InvalidDice => f.write_str("invalid dice"),
            Self::InvalidModifier => f.write_str("invalid modifier count"),
            Self::UnknownOperator(op) => write!(f, "operator {:?} has no precedence", op),
        }
    }
}
