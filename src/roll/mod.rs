mod ctx;
mod error;
mod modifier;
mod num;
mod result;
pub(crate) mod roller;
mod stringify;
mod tree;
mod visit;

use crate::parse::ast;

type RResult<T> = Result<T, EvaluationError>;

pub use ctx::RollContext;
pub use error::EvaluationError;
pub use modifier::{Drop, Explode, ExplodeCombine, Keep, Modifier, Modify, Reroll};
pub use num::Number;
pub use result::RollResult;
pub use roller::{Roller, SequenceRoller, SharedRoller};
pub use stringify::{MarkdownStringifier, SimpleStringifier, Stringify};
pub use tree::{Binary, Die, Eval, Grouping, Literal, Negate, RollGroup, RollNode, StuntRoll};
pub use visit::{AcceptRoll, VisitRoll};

pub fn eval<R: Roller + ?Sized>(expr: &ast::Expression, roller: &mut R) -> RResult<RollResult> {
    RollContext::new(roller).eval(expr)
}
