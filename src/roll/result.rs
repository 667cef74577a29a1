use super::{
    num::Number,
    stringify::{MarkdownStringifier, Stringify},
    tree::{Eval, RollGroup, RollNode},
    RResult,
};
use serde::{Deserialize, Serialize};

/// An evaluated notation. `display` is the markdown breakdown of `tree`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    pub notation: String,
    pub total: Number,
    pub display: String,
    pub tree: RollNode,
}

impl RollResult {
    /// Totals and renders an evaluated tree.
    pub fn from_tree(notation: String, tree: RollNode) -> RResult<Self> {
        let total = tree.total()?;
        let display = MarkdownStringifier::new().stringify(&tree)?;
        Ok(Self {
            notation,
            total,
            display,
            tree,
        })
    }

    pub fn groups(&self) -> Vec<&RollGroup> {
        self.tree.groups()
    }

    /// Renders the whole result, total included, with the given stringifier.
    pub fn result<S: Stringify + Default>(&self) -> RResult<String> {
        Stringify::stringify(&mut S::default(), self)
    }
}

impl Eval for RollResult {
    fn total(&self) -> RResult<Number> {
        Ok(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Int;
    use crate::lex::{tokenize, LexContext};
    use crate::parse::{parse, PrecedenceTable};
    use crate::roll::roller::SequenceRoller;
    use crate::roll::{RollContext, SimpleStringifier};
    use crate::settings::Settings;

    fn eval(s: &str, rolls: &[Int]) -> RollResult {
        let settings = Settings::default();
        let lexemes = tokenize(s, &LexContext::new(&settings)).unwrap();
        let expr = parse(&lexemes, &PrecedenceTable::default()).unwrap();
        let mut roller = SequenceRoller::new(rolls.iter().copied());
        RollContext::new(&mut roller).eval(&expr).unwrap()
    }

    #[test]
    fn test_result_fields() {
        let result = eval("4d6dl1+3", &[2, 6, 4, 1]);
        assert_eq!(result.notation, "4d6dl1+3");
        assert_eq!(result.total, Number::Int(15));
        assert_eq!(result.display, "4d6dl1 (2, 6, 4, ~~1~~) + 3");
        assert_eq!(result.groups().len(), 1);
        assert_eq!(
            result.result::<SimpleStringifier>().unwrap(),
            "4d6dl1 (2, 6, 4, 1) + 3 = 15"
        );
    }

    #[test]
    fn test_json_preserves_total_and_display() {
        let result = eval("2d6r1 + 1d20! - 1dS", &[1, 4, 5, 20, 7, 2, 2, 6]);
        let json = serde_json::to_string(&result).unwrap();
        let restored: RollResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, result);

        let rebuilt = RollResult::from_tree(restored.notation, restored.tree).unwrap();
        assert_eq!(rebuilt.total, result.total);
        assert_eq!(rebuilt.display, result.display);
    }
}
