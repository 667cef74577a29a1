use crate::common::*;
use crate::roll::{Modifier, Number};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub root: Node,
    /// The notation the tree was parsed from.
    pub notation: String,
}

impl Expression {
    pub(crate) fn new(root: Node, notation: impl Into<String>) -> Self {
        Self {
            root,
            notation: notation.into(),
        }
    }

    /// Every dice group in evaluation order.
    pub fn groups(&self) -> Vec<&DiceGroup> {
        let mut ret = Vec::new();
        self.root.collect_groups(&mut ret);
        ret
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Number),
    Dice(DiceGroup),
    Stunt(StuntDie),
    Grouping(Box<Node>),
    Negate(Box<Node>),
    Binary(Box<Node>, BinaryOperator, Box<Node>),
}

impl Node {
    fn collect_groups<'a>(&'a self, out: &mut Vec<&'a DiceGroup>) {
        match self {
            Self::Dice(group) => out.push(group),
            Self::Literal(_) | Self::Stunt(_) => {}
            Self::Grouping(x) | Self::Negate(x) => x.collect_groups(out),
            Self::Binary(l, _, r) => {
                l.collect_groups(out);
                r.collect_groups(out);
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(x) => write!(f, "{}", x),
            Self::Dice(x) => write!(f, "{}", x),
            Self::Stunt(x) => write!(f, "{}", x.notation),
            Self::Grouping(x) => write!(f, "({})", x),
            Self::Negate(x) => write!(f, "-{}", x),
            Self::Binary(l, op, r) => write!(f, "[{} {} {}]", l, op, r),
        }
    }
}

/// `count` dice of `faces` faces with their modifiers in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct DiceGroup {
    pub count: UInt,
    pub faces: NonZeroUInt,
    /// Success conditionals; when present the group counts matching dice
    /// instead of summing them.
    pub conditionals: Vec<Conditional>,
    pub modifiers: Vec<Modifier>,
    /// Source text of the group, modifiers included.
    pub notation: String,
}

impl DiceGroup {
    pub fn new(count: UInt, faces: NonZeroUInt, notation: impl Into<String>) -> Self {
        Self {
            count,
            faces,
            conditionals: Vec::new(),
            modifiers: Vec::new(),
            notation: notation.into(),
        }
    }
}

impl fmt::Display for DiceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.faces)?;
        for c in &self.conditionals {
            write!(f, "{}", c)?;
        }
        for m in &self.modifiers {
            write!(f, "{}", m)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StuntDie {
    pub notation: String,
}
