use crate::common::*;
use logos::Logos;
use logos_iter::LogosIter;

#[derive(Logos, Debug, Copy, Clone, PartialEq)]
enum ConditionToken {
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse())]
    Integer(Int),

    #[token("=")]
    Equal,
    #[token("!=")]
    #[token("=!")]
    NotEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    #[token("=>")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    #[token("=<")]
    LessEqual,

    #[error]
    Error,
}

impl ConditionToken {
    fn as_compare_op(&self) -> Option<CompareOp> {
        Some(match self {
            Self::Equal => CompareOp::Eq,
            Self::NotEqual => CompareOp::Ne,
            Self::Greater => CompareOp::Gt,
            Self::GreaterEqual => CompareOp::Ge,
            Self::Less => CompareOp::Lt,
            Self::LessEqual => CompareOp::Le,
            Self::Integer(_) | Self::Error => return None,
        })
    }
}

/// Splits a conditional suffix such as `>=3!=5` into `(operator, comparer)`
/// pairs. Operators without a following integer are ignored.
pub(crate) fn conditionals(s: &str) -> Vec<Conditional> {
    let mut lexer = ConditionToken::lexer(s).peekable_lexer();
    let mut ret = Vec::new();

    while let Some(token) = lexer.next() {
        let op = match token.as_compare_op() {
            Some(op) => op,
            None => continue,
        };
        if let Some(&ConditionToken::Integer(comparer)) = lexer.peek() {
            lexer.next();
            ret.push(Conditional::new(op, comparer));
        }
    }

    ret
}
