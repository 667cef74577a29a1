use super::result::RollResult;
use super::tree::*;

pub trait VisitRoll {
    type Output;

    fn visit<A: AcceptRoll>(&mut self, a: &A) -> Self::Output {
        a.accept(self)
    }

    fn visit_result(&mut self, x: &RollResult) -> Self::Output;

    fn visit_literal(&mut self, x: &Literal) -> Self::Output;

    fn visit_group(&mut self, x: &RollGroup) -> Self::Output;

    fn visit_die(&mut self, x: &Die) -> Self::Output;

    fn visit_stunt(&mut self, x: &StuntRoll) -> Self::Output;

    fn visit_grouping(&mut self, x: &Grouping) -> Self::Output;

    fn visit_negate(&mut self, x: &Negate) -> Self::Output;

    fn visit_binary(&mut self, x: &Binary) -> Self::Output;
}

#[enum_dispatch::enum_dispatch]
pub trait AcceptRoll: Sized + Eval {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output;
}

impl AcceptRoll for RollResult {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_result(self)
    }
}

impl AcceptRoll for Literal {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_literal(self)
    }
}

impl AcceptRoll for RollGroup {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_group(self)
    }
}

impl AcceptRoll for Die {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_die(self)
    }
}

impl AcceptRoll for StuntRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_stunt(self)
    }
}

impl AcceptRoll for Grouping {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_grouping(self)
    }
}

impl AcceptRoll for Negate {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_negate(self)
    }
}

impl AcceptRoll for Binary {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_binary(self)
    }
}
