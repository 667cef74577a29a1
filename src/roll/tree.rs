use super::{
    error::EvaluationError, modifier::Modify, num::Number, roller::Roller, RResult, RollContext,
};
use crate::common::*;
use crate::parse::ast;
use serde::{Deserialize, Serialize};

#[enum_dispatch::enum_dispatch]
pub trait Eval {
    fn total(&self) -> RResult<Number>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[enum_dispatch::enum_dispatch(Eval, AcceptRoll)]
pub enum RollNode {
    Literal(Literal),
    Dice(RollGroup),
    Stunt(StuntRoll),
    Grouping(Grouping),
    Negate(Negate),
    Binary(Binary),
}

impl RollNode {
    /// Every roll group in evaluation order.
    pub fn groups(&self) -> Vec<&RollGroup> {
        let mut ret = Vec::new();
        self.collect_groups(&mut ret);
        ret
    }

    fn collect_groups<'a>(&'a self, out: &mut Vec<&'a RollGroup>) {
        match self {
            Self::Dice(group) => out.push(group),
            Self::Literal(_) | Self::Stunt(_) => {}
            Self::Grouping(Grouping(x)) | Self::Negate(Negate(x)) => x.collect_groups(out),
            Self::Binary(bin) => {
                bin.left.collect_groups(out);
                bin.right.collect_groups(out);
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal(pub Number);

impl Eval for Literal {
    fn total(&self) -> RResult<Number> {
        Ok(self.0)
    }
}

/// One die of a roll group. `rolls` holds the reroll history, the last entry
/// being the face that counts; `bonus` holds values added by combined
/// explosions.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Die {
    pub faces: NonZeroUInt,
    pub rolls: NonEmpty<UInt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bonus: Vec<UInt>,
    #[serde(default)]
    pub dropped: bool,
    #[serde(default)]
    pub rerolled: bool,
    /// Added to the group by an explosion.
    #[serde(default)]
    pub exploded: bool,
    /// Caused an explosion.
    #[serde(default)]
    pub triggered: bool,
    #[serde(default)]
    pub matched: bool,
}

impl Die {
    pub fn new(faces: NonZeroUInt, value: UInt) -> Self {
        Self {
            faces,
            rolls: vec1![value],
            bonus: Vec::new(),
            dropped: false,
            rerolled: false,
            exploded: false,
            triggered: false,
            matched: false,
        }
    }

    pub(crate) fn exploded(faces: NonZeroUInt, value: UInt) -> Self {
        Self {
            exploded: true,
            ..Self::new(faces, value)
        }
    }

    pub fn face(&self) -> UInt {
        *self.rolls.last()
    }

    pub fn last_component(&self) -> UInt {
        self.bonus.last().copied().unwrap_or_else(|| self.face())
    }

    pub fn value(&self) -> Int {
        Int::from(self.face()) + self.bonus.iter().copied().map(Int::from).sum::<Int>()
    }

    pub(crate) fn reroll(&mut self, value: UInt) {
        self.rolls.push(value);
        self.bonus.clear();
        self.rerolled = true;
    }

    pub(crate) fn combine(&mut self, value: UInt) {
        self.bonus.push(value);
        self.triggered = true;
    }
}

impl Eval for Die {
    fn total(&self) -> RResult<Number> {
        Ok(if self.dropped {
            Number::ZERO
        } else {
            self.value().into()
        })
    }
}

/// The dice rolled for one dice group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollGroup {
    pub notation: String,
    pub count: UInt,
    pub faces: NonZeroUInt,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditionals: Vec<Conditional>,
    pub dice: Vec<Die>,
}

impl RollGroup {
    pub(crate) fn roll_new<R: Roller + ?Sized>(
        ctx: &mut RollContext<'_, R>,
        dice: &ast::DiceGroup,
    ) -> RResult<Self> {
        let values = ctx.roll_many(dice.count as usize, dice.faces)?;
        let mut ret = Self {
            notation: dice.notation.clone(),
            count: dice.count,
            faces: dice.faces,
            conditionals: dice.conditionals.clone(),
            dice: values.into_iter().map(|x| Die::new(dice.faces, x)).collect(),
        };

        for modifier in &dice.modifiers {
            modifier.apply(&mut ret, ctx)?;
            log::debug!("{} applied to {}: {:?}", modifier, ret.notation, ret.values());
        }
        ret.mark_matches(ctx.policy);
        Ok(ret)
    }

    fn mark_matches(&mut self, policy: MatchPolicy) {
        if self.conditionals.is_empty() {
            return;
        }
        for die in self.dice.iter_mut().filter(|d| !d.dropped) {
            die.matched = policy.check(&self.conditionals, die.value());
        }
    }

    pub fn values(&self) -> Vec<Int> {
        self.dice.iter().map(Die::value).collect()
    }

    pub fn live(&self) -> impl Iterator<Item = &Die> {
        self.dice.iter().filter(|d| !d.dropped)
    }

    /// Whether the group counts successes rather than summing.
    pub fn counts_successes(&self) -> bool {
        !self.conditionals.is_empty()
    }
}

impl Eval for RollGroup {
    fn total(&self) -> RResult<Number> {
        if self.counts_successes() {
            let matched = self.live().filter(|d| d.matched).count();
            Ok(Number::Int(matched as Int))
        } else {
            self.live().map(Eval::total).sum()
        }
    }
}

/// Two regular dice and a stunt die. Any pair showing the same value earns
/// stunt points equal to the stunt die.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StuntRoll {
    pub notation: String,
    pub regular: [UInt; 2],
    pub stunt: UInt,
}

impl StuntRoll {
    pub fn new(notation: String, regular: [UInt; 2], stunt: UInt) -> Self {
        Self {
            notation,
            regular,
            stunt,
        }
    }

    pub fn is_stunt(&self) -> bool {
        let [a, b] = self.regular;
        a == b || a == self.stunt || b == self.stunt
    }

    pub fn points(&self) -> UInt {
        if self.is_stunt() {
            self.stunt
        } else {
            0
        }
    }
}

impl Eval for StuntRoll {
    fn total(&self) -> RResult<Number> {
        let [a, b] = self.regular;
        Ok(Number::from(Int::from(a) + Int::from(b) + Int::from(self.stunt)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grouping(pub Box<RollNode>);

impl Grouping {
    pub fn new(value: RollNode) -> Self {
        Self(Box::new(value))
    }
}

impl Eval for Grouping {
    fn total(&self) -> RResult<Number> {
        self.0.total()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negate(pub Box<RollNode>);

impl Negate {
    pub fn new(value: RollNode) -> Self {
        Self(Box::new(value))
    }
}

impl Eval for Negate {
    fn total(&self) -> RResult<Number> {
        Ok(-self.0.total()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub left: Box<RollNode>,
    pub op: BinaryOperator,
    pub right: Box<RollNode>,
}

impl Binary {
    pub fn new(left: RollNode, op: BinaryOperator, right: RollNode) -> Self {
        Self {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

impl Eval for Binary {
    fn total(&self) -> RResult<Number> {
        let left = self.left.total()?;
        let right = self.right.total()?;
        let value = left.apply(self.op, right);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvaluationError::NonFinite {
                left: left.to_string(),
                op: self.op,
                right: right.to_string(),
            })
        }
    }
}
