use crate::lex::LexError;
use crate::parse::ParseError;
use crate::reference::ReferenceError;
use crate::roll::EvaluationError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Evaluation(#[from] EvaluationError),
    #[error("{0}")]
    Reference(#[from] ReferenceError),
    #[error("invalid settings: {0}")]
    Settings(#[from] toml::de::Error),
    #[error("invalid stored result: {0}")]
    Persisted(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
