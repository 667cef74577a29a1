use super::{error::EvaluationError, num::Number, result::RollResult, roller::Roller, tree::*, RResult};
use crate::common::*;
use crate::parse::{
    ast,
    visit::{self, Accept},
};
use crate::settings::Settings;

/// State for one evaluation: the borrowed random source, the roll budget, and
/// the knobs modifiers read while rolling.
pub struct RollContext<'r, R: Roller + ?Sized> {
    roller: &'r mut R,
    max_rolls: Option<usize>,
    rolls: usize,
    pub(crate) policy: MatchPolicy,
    pub(crate) cap: UInt,
    stunt_faces: NonZeroUInt,
}

impl<'r, R: Roller + ?Sized> RollContext<'r, R> {
    pub fn new(roller: &'r mut R) -> Self {
        Self::from_settings(roller, &Settings::default())
    }

    pub fn from_settings(roller: &'r mut R, settings: &Settings) -> Self {
        Self {
            roller,
            max_rolls: settings.max_rolls,
            rolls: 0,
            policy: settings.conditional_policy,
            cap: settings.unbounded_cap,
            stunt_faces: NonZeroUInt::new(settings.stunt_faces).unwrap_or(NonZeroUInt::MIN),
        }
    }

    pub fn with_max_rolls(mut self, max_rolls: Option<usize>) -> Self {
        self.max_rolls = max_rolls;
        self
    }

    /// Dice drawn so far.
    pub fn rolls(&self) -> usize {
        self.rolls
    }

    pub(crate) fn count_rolls(&mut self, n: usize) -> RResult<()> {
        self.rolls += n;
        if self.max_rolls.map_or(false, |max| self.rolls > max) {
            Err(EvaluationError::TooManyRolls)
        } else {
            Ok(())
        }
    }

    pub(crate) fn roll_many(&mut self, n: usize, faces: NonZeroUInt) -> RResult<Vec<UInt>> {
        self.count_rolls(n)?;
        Ok((0..n).map(|_| self.roller.roll(faces)).collect())
    }

    pub(crate) fn roll_one(&mut self, faces: NonZeroUInt) -> RResult<UInt> {
        self.count_rolls(1)?;
        Ok(self.roller.roll(faces))
    }

    /// Clamps a reroll/explosion count to the configured cap.
    pub(crate) fn capped(&self, times: UInt) -> UInt {
        if times > self.cap {
            log::warn!("limiting {} repetitions to {}", times, self.cap);
        }
        times.min(self.cap)
    }

    pub fn eval(&mut self, expr: &ast::Expression) -> RResult<RollResult> {
        let tree = expr.accept(self)?;
        RollResult::from_tree(expr.notation.clone(), tree)
    }
}

impl<R: Roller + ?Sized> visit::AstVisitor for RollContext<'_, R> {
    type Output = RResult<RollNode>;

    fn visit_literal(&mut self, x: &Number) -> Self::Output {
        Ok(Literal(*x).into())
    }

    fn visit_dice(&mut self, dice: &ast::DiceGroup) -> Self::Output {
        let group = RollGroup::roll_new(self, dice)?;
        log::debug!("rolled {} -> {:?}", group.notation, group.values());
        Ok(group.into())
    }

    fn visit_stunt(&mut self, stunt: &ast::StuntDie) -> Self::Output {
        let faces = self.stunt_faces;
        let regular = [self.roll_one(faces)?, self.roll_one(faces)?];
        let stunt_die = self.roll_one(faces)?;
        Ok(StuntRoll::new(stunt.notation.clone(), regular, stunt_die).into())
    }

    fn visit_grouping(&mut self, inner: &ast::Node) -> Self::Output {
        let value = inner.accept(self)?;
        Ok(Grouping::new(value).into())
    }

    fn visit_negate(&mut self, inner: &ast::Node) -> Self::Output {
        let value = inner.accept(self)?;
        Ok(Negate::new(value).into())
    }

    fn visit_binary(&mut self, l: &ast::Node, op: &BinaryOperator, r: &ast::Node) -> Self::Output {
        let left = l.accept(self)?;
        let right = r.accept(self)?;
        Ok(Binary::new(left, *op, right).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::{tokenize, LexContext};
    use crate::parse::{parse, PrecedenceTable};
    use crate::roll::roller::{SequenceRoller, StepRoller};

    fn expression(s: &str) -> ast::Expression {
        let settings = Settings::default();
        let lexemes = tokenize(s, &LexContext::new(&settings)).unwrap();
        parse(&lexemes, &PrecedenceTable::default()).unwrap()
    }

    fn eval_with(s: &str, rolls: &[Int]) -> RResult<RollResult> {
        let mut roller = SequenceRoller::new(rolls.iter().copied());
        RollContext::new(&mut roller).eval(&expression(s))
    }

    fn check(s: &str, rolls: &[Int], expected: impl Into<Number>) {
        let actual = eval_with(s, rolls).unwrap();
        assert_eq!(actual.total, expected.into(), "{}", s);
    }

    #[test]
    fn test_eval_arithmetic() {
        check("1+2*3^2", &[], 19i64);
        check("2^3^2", &[], 512i64);
        check("(1+2)*3", &[], 9i64);
        check("-2^2", &[], -4i64);
        check("7/2", &[], 3.5);
        check("10-4-3", &[], 3i64);
    }

    #[test]
    fn test_eval_dice() {
        check("1d20 + 4", &[10], 14i64);
        check("2d4", &[2, 3], 5i64);
        check("0d6 + 1", &[], 1i64);
        check("-1d6", &[4], -4i64);
    }

    #[test]
    fn test_eval_dice_with_step_roller() {
        let mut roller = StepRoller::new(1, 1);
        let result = RollContext::new(&mut roller)
            .eval(&expression("8d6"))
            .unwrap();
        assert_eq!(result.total, Number::Int(1 + 2 + 3 + 4 + 5 + 6 + 1 + 2));
    }

    #[test]
    fn test_eval_stunt() {
        let result = eval_with("1dS", &[3, 3, 5]).unwrap();
        assert_eq!(result.total, Number::Int(11));
        match &result.tree {
            RollNode::Stunt(stunt) => {
                assert!(stunt.is_stunt());
                assert_eq!(stunt.points(), 5);
            }
            other => panic!("expected stunt roll, found {:?}", other),
        }

        let result = eval_with("1dS", &[1, 2, 3]).unwrap();
        match &result.tree {
            RollNode::Stunt(stunt) => assert_eq!(stunt.points(), 0),
            other => panic!("expected stunt roll, found {:?}", other),
        }
    }

    #[test]
    fn test_err_non_finite() {
        let err = eval_with("1/0", &[]).unwrap_err();
        assert!(matches!(err, EvaluationError::NonFinite { op: BinaryOperator::Div, .. }));
    }

    #[test]
    fn test_err_too_many_rolls() {
        let mut roller = SequenceRoller::new([1]);
        let err = RollContext::new(&mut roller)
            .with_max_rolls(Some(10))
            .eval(&expression("11d6"))
            .unwrap_err();
        assert_eq!(err, EvaluationError::TooManyRolls);
    }
}
