//! Post-roll transformations attached to a dice group.

use super::{roller::Roller, tree::*, RResult, RollContext};
use crate::common::*;
use std::fmt;

#[enum_dispatch::enum_dispatch]
pub trait Modify {
    fn apply<R: Roller + ?Sized>(
        &self,
        group: &mut RollGroup,
        ctx: &mut RollContext<'_, R>,
    ) -> RResult<()>;
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[enum_dispatch::enum_dispatch(Modify)]
pub enum Modifier {
    Reroll(Reroll),
    Explode(Explode),
    ExplodeCombine(ExplodeCombine),
    Keep(Keep),
    Drop(Drop),
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reroll(x) => write_repeat(f, "r", x.times, &x.conditionals),
            Self::Explode(x) => write_repeat(f, "!", x.times, &x.conditionals),
            Self::ExplodeCombine(x) => write_repeat(f, "!!", x.times, &x.conditionals),
            Self::Keep(x) => write!(f, "k{}{}", x.side, x.count),
            Self::Drop(x) => write!(f, "d{}{}", x.side, x.count),
        }
    }
}

fn write_repeat(
    f: &mut fmt::Formatter<'_>,
    symbol: &str,
    times: UInt,
    conditionals: &[Conditional],
) -> fmt::Result {
    f.write_str(symbol)?;
    if times != 1 {
        write!(f, "{}", times)?;
    }
    for c in conditionals {
        write!(f, "{}", c)?;
    }
    Ok(())
}

/// Explicit conditionals decide when present; otherwise `default` does.
fn holds(conditionals: &[Conditional], policy: MatchPolicy, value: Int, default: bool) -> bool {
    if conditionals.is_empty() {
        default
    } else {
        policy.check(conditionals, value)
    }
}

/// Rerolls each live die matching the predicate (default: the lowest face)
/// up to `times` times. Earlier values stay in the die's history.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Reroll {
    pub times: UInt,
    pub conditionals: Vec<Conditional>,
}

impl Reroll {
    pub fn new(times: UInt, conditionals: Vec<Conditional>) -> Self {
        Self {
            times,
            conditionals,
        }
    }
}

impl Modify for Reroll {
    fn apply<R: Roller + ?Sized>(
        &self,
        group: &mut RollGroup,
        ctx: &mut RollContext<'_, R>,
    ) -> RResult<()> {
        let times = ctx.capped(self.times);
        let faces = group.faces;

        for die in group.dice.iter_mut().filter(|d| !d.dropped) {
            let mut n = 0;
            while n < times && holds(&self.conditionals, ctx.policy, die.value(), die.value() <= 1) {
                let value = ctx.roll_one(faces)?;
                die.reroll(value);
                n += 1;
            }
        }
        Ok(())
    }
}

/// Appends a fresh die for every live die matching the predicate (default:
/// its maximum face). New dice may explode in turn, at most `times` times per
/// chain.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Explode {
    pub times: UInt,
    pub conditionals: Vec<Conditional>,
}

impl Explode {
    pub fn new(times: UInt, conditionals: Vec<Conditional>) -> Self {
        Self {
            times,
            conditionals,
        }
    }
}

impl Modify for Explode {
    fn apply<R: Roller + ?Sized>(
        &self,
        group: &mut RollGroup,
        ctx: &mut RollContext<'_, R>,
    ) -> RResult<()> {
        let times = ctx.capped(self.times);
        let faces = group.faces;
        let max = Int::from(faces.get());

        for i in 0..group.dice.len() {
            if group.dice[i].dropped || group.dice[i].triggered {
                continue;
            }

            let mut current = i;
            let mut n = 0;
            loop {
                let value = group.dice[current].value();
                if n >= times || !holds(&self.conditionals, ctx.policy, value, value == max) {
                    break;
                }
                let rolled = ctx.roll_one(faces)?;
                group.dice[current].triggered = true;
                group.dice.push(Die::exploded(faces, rolled));
                current = group.dice.len() - 1;
                n += 1;
            }
        }
        Ok(())
    }
}

/// Like [`Explode`], but each new value is added into the triggering die.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ExplodeCombine {
    pub times: UInt,
    pub conditionals: Vec<Conditional>,
}

impl ExplodeCombine {
    pub fn new(times: UInt, conditionals: Vec<Conditional>) -> Self {
        Self {
            times,
            conditionals,
        }
    }
}

impl Modify for ExplodeCombine {
    fn apply<R: Roller + ?Sized>(
        &self,
        group: &mut RollGroup,
        ctx: &mut RollContext<'_, R>,
    ) -> RResult<()> {
        let times = ctx.capped(self.times);
        let faces = group.faces;
        let max = Int::from(faces.get());

        for die in group.dice.iter_mut().filter(|d| !d.dropped) {
            let mut n = 0;
            loop {
                let value = Int::from(die.last_component());
                if n >= times || !holds(&self.conditionals, ctx.policy, value, value == max) {
                    break;
                }
                let rolled = ctx.roll_one(faces)?;
                die.combine(rolled);
                n += 1;
            }
        }
        Ok(())
    }
}

/// Live dice ordered from the given side, ties in roll order.
fn ordered(group: &RollGroup, side: Side) -> Vec<usize> {
    let dice = &group.dice;
    let mut live: Vec<usize> = (0..dice.len()).filter(|&i| !dice[i].dropped).collect();
    match side {
        Side::High => live.sort_by(|&a, &b| dice[b].value().cmp(&dice[a].value())),
        Side::Low => live.sort_by_key(|&i| dice[i].value()),
    }
    live
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Keep {
    pub side: Side,
    pub count: UInt,
}

impl Keep {
    pub fn new(side: Side, count: UInt) -> Self {
        Self { side, count }
    }
}

impl Modify for Keep {
    fn apply<R: Roller + ?Sized>(
        &self,
        group: &mut RollGroup,
        _ctx: &mut RollContext<'_, R>,
    ) -> RResult<()> {
        for i in ordered(group, self.side).into_iter().skip(self.count as usize) {
            group.dice[i].dropped = true;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Drop {
    pub side: Side,
    pub count: UInt,
}

impl Drop {
    pub fn new(side: Side, count: UInt) -> Self {
        Self { side, count }
    }
}

impl Modify for Drop {
    fn apply<R: Roller + ?Sized>(
        &self,
        group: &mut RollGroup,
        _ctx: &mut RollContext<'_, R>,
    ) -> RResult<()> {
        for i in ordered(group, self.side).into_iter().take(self.count as usize) {
            group.dice[i].dropped = true;
        }
        Ok(())
    }
}
