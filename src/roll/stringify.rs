use super::result::RollResult;
use super::tree::{Binary, Die, Grouping, Literal, Negate, RollGroup, StuntRoll};
use super::visit::{AcceptRoll, VisitRoll};
use super::RResult;

pub trait Stringify {
    fn stringify<A: AcceptRoll>(&mut self, a: &A) -> RResult<String> {
        a.accept(self)
    }

    fn str_result(&mut self, result: &RollResult) -> RResult<String> {
        let tree = self.stringify(&result.tree)?;
        Ok(format!("{} = {}", tree, result.total))
    }

    fn str_literal(&mut self, lit: &Literal) -> RResult<String> {
        Ok(lit.0.to_string())
    }

    fn str_group(&mut self, group: &RollGroup) -> RResult<String> {
        let the_dice = group
            .dice
            .iter()
            .map(|die| self.stringify(die))
            .collect::<RResult<Vec<_>>>()?
            .join(", ");
        Ok(format!("{} ({})", group.notation, the_dice))
    }

    fn str_die(&mut self, die: &Die) -> RResult<String> {
        Ok(die_text(die))
    }

    fn str_stunt(&mut self, stunt: &StuntRoll) -> RResult<String> {
        let [a, b] = stunt.regular;
        let mut ret = format!("{} ({}, {} | {})", stunt.notation, a, b, stunt.stunt);
        if stunt.is_stunt() {
            ret.push_str(&format!(" [{} stunt points]", stunt.points()));
        }
        Ok(ret)
    }

    fn str_grouping(&mut self, g: &Grouping) -> RResult<String> {
        let inner = self.stringify(&*g.0)?;
        Ok(format!("({})", inner))
    }

    fn str_negate(&mut self, n: &Negate) -> RResult<String> {
        let inner = self.stringify(&*n.0)?;
        Ok(format!("-{}", inner))
    }

    fn str_binary(&mut self, bin: &Binary) -> RResult<String> {
        let l = self.stringify(&*bin.left)?;
        let r = self.stringify(&*bin.right)?;
        Ok(format!("{} {} {}", l, bin.op, r))
    }
}

/// Reroll history joined by `->`, combined explosions as `6!+3`, and a
/// trailing `!` on dice that triggered an explosion.
fn die_text(die: &Die) -> String {
    let mut ret = die
        .rolls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    for bonus in &die.bonus {
        ret.push_str(&format!("!+{}", bonus));
    }
    if die.triggered && die.bonus.is_empty() {
        ret.push('!');
    }
    ret
}

#[derive(Default)]
pub struct SimpleStringifier;

impl SimpleStringifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stringify<A: AcceptRoll>(&mut self, roll: &A) -> RResult<String> {
        Stringify::stringify(self, roll)
    }
}

impl Stringify for SimpleStringifier {}

/// Strikes through dropped dice and bolds dice matching a success
/// conditional.
#[derive(Default)]
pub struct MarkdownStringifier;

impl MarkdownStringifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stringify<A: AcceptRoll>(&mut self, roll: &A) -> RResult<String> {
        Stringify::stringify(self, roll)
    }
}

impl Stringify for MarkdownStringifier {
    fn str_result(&mut self, result: &RollResult) -> RResult<String> {
        let tree = Stringify::stringify(self, &result.tree)?;
        Ok(format!("{} = `{}`", tree, result.total))
    }

    fn str_die(&mut self, die: &Die) -> RResult<String> {
        let mut ret = die_text(die);
        if die.matched {
            ret = format!("**{}**", ret);
        }
        if die.dropped {
            ret = format!("~~{}~~", ret);
        }
        Ok(ret)
    }
}

impl<S: ?Sized> VisitRoll for S
where
    S: Stringify,
{
    type Output = RResult<String>;

    fn visit_result(&mut self, x: &RollResult) -> Self::Output {
        self.str_result(x)
    }

    fn visit_literal(&mut self, x: &Literal) -> Self::Output {
        self.str_literal(x)
    }

    fn visit_group(&mut self, x: &RollGroup) -> Self::Output {
        self.str_group(x)
    }

    fn visit_die(&mut self, x: &Die) -> Self::Output {
        self.str_die(x)
    }

    fn visit_stunt(&mut self, x: &StuntRoll) -> Self::Output {
        self.str_stunt(x)
    }

    fn visit_grouping(&mut self, x: &Grouping) -> Self::Output {
        self.str_grouping(x)
    }

    fn visit_negate(&mut self, x: &Negate) -> Self::Output {
        self.str_negate(x)
    }

    fn visit_binary(&mut self, x: &Binary) -> Self::Output {
        self.str_binary(x)
    }
}
