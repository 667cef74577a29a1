use crate::common::BinaryOperator;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("too many dice rolled")]
    TooManyRolls,
    #[error("{left} {op} {right} is not a finite number")]
    NonFinite {
        left: String,
        op: BinaryOperator,
        right: String,
    },
    #[error("stored result for {found:?} does not match notation {expected:?}")]
    StaleResult { expected: String, found: String },
}
