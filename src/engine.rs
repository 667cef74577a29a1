//! The entry point tying lexing, classification, parsing and rolling together.

use crate::lex::{classify, tokenize, FieldLookup, LexContext, LexError, Lexeme, RollerKind};
use crate::parse::{ast::Expression, Parser, PrecedenceTable};
use crate::persist::ResultStore;
use crate::reference::{ContentStore, ReferenceError, ReferenceResult, ReferenceRoller, RollReference};
use crate::roll::{EvaluationError, RollContext, RollResult, Roller};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluates notations under one set of [`Settings`].
pub struct Engine {
    settings: Settings,
    precedence: PrecedenceTable,
    fields: Option<Box<dyn FieldLookup + Send + Sync>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            precedence: PrecedenceTable::default(),
            fields: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn with_precedence(mut self, precedence: PrecedenceTable) -> Self {
        self.precedence = precedence;
        self
    }

    /// Values substituted for identifiers found in notations.
    pub fn with_fields(mut self, fields: impl FieldLookup + Send + Sync + 'static) -> Self {
        self.fields = Some(Box::new(fields));
        self
    }

    /// Normalizes text as written in a document into a notation: decodes HTML
    /// entities, drops the `dice:` marker and `|nodice` flag, unescapes `\|`,
    /// and expands a formula alias.
    pub fn prepare(&self, content: &str) -> String {
        let content = decode_entities(content);
        let content = content.trim();
        let content = content.strip_prefix("dice:").unwrap_or(content);
        let content = content.replace("\\|", "|").replace("|nodice", "");
        let content = content.trim();

        match self.settings.formulas.get(content) {
            Some(formula) => {
                log::debug!("expanded formula {:?} to {:?}", content, formula);
                formula.trim().to_string()
            }
            None => content.to_string(),
        }
    }

    pub fn lex(&self, notation: &str) -> Result<Vec<Lexeme>, LexError> {
        let mut ctx = LexContext::new(&self.settings);
        if let Some(fields) = &self.fields {
            ctx = ctx.with_fields(&**fields);
        }
        tokenize(notation, &ctx)
    }

    /// Parses a dice expression. Reference notations are rejected.
    pub fn parse(&self, notation: &str) -> crate::Result<Expression> {
        let notation = self.prepare(notation);
        let lexemes = self.lex(&notation)?;
        self.parse_lexemes(&lexemes, notation)
    }

    fn parse_lexemes(&self, lexemes: &[Lexeme], notation: String) -> crate::Result<Expression> {
        Ok(Parser::new(lexemes, &self.precedence)
            .with_notation(notation)
            .parse()?)
    }

    fn eval<R: Roller + ?Sized>(&self, expr: &Expression, roller: &mut R) -> crate::Result<RollResult> {
        Ok(RollContext::from_settings(roller, &self.settings).eval(expr)?)
    }

    /// Rolls a dice expression.
    pub fn roll_dice<R: Roller + ?Sized>(&self, notation: &str, roller: &mut R) -> crate::Result<RollResult> {
        let expr = self.parse(notation)?;
        self.eval(&expr, roller)
    }

    /// Rolls any notation, dispatching references to their roller.
    pub fn roll<S, R>(&self, notation: &str, store: &S, roller: &mut R) -> crate::Result<Outcome>
    where
        S: ContentStore + ?Sized,
        R: Roller + ?Sized,
    {
        let notation = self.prepare(notation);
        let lexemes = self.lex(&notation)?;
        let kind = classify(&lexemes);
        log::debug!("rolling {:?} as {}", notation, kind);

        match kind.lexeme_kind() {
            None => {
                let expr = self.parse_lexemes(&lexemes, notation)?;
                Ok(Outcome::Dice(self.eval(&expr, roller)?))
            }
            Some(lexeme_kind) => {
                let lexeme = lexemes
                    .iter()
                    .find(|l| l.kind == lexeme_kind)
                    .ok_or_else(|| ReferenceError::Malformed(notation.clone()))?;
                let reference = ReferenceRoller::from_lexeme(lexeme)?;
                Ok(Outcome::Reference(reference.roll(self, store, roller)?))
            }
        }
    }

    /// Rolls every notation independently; one failure never stops the rest.
    pub fn roll_all<'n, I, S, R>(&self, notations: I, store: &S, roller: &mut R) -> Vec<crate::Result<Outcome>>
    where
        I: IntoIterator<Item = &'n str>,
        S: ContentStore + ?Sized,
        R: Roller + ?Sized,
    {
        notations
            .into_iter()
            .map(|notation| {
                let ret = self.roll(notation, store, &mut *roller);
                if let Err(why) = &ret {
                    log::debug!("{:?} failed: {}", notation, why);
                }
                ret
            })
            .collect()
    }

    /// Rebuilds a stored result without rolling, provided it was produced by
    /// `notation`.
    pub fn apply_result(&self, notation: &str, stored: &RollResult) -> crate::Result<RollResult> {
        let expr = self.parse(notation)?;
        let stale = || EvaluationError::StaleResult {
            expected: expr.notation.clone(),
            found: stored.notation.clone(),
        };

        if expr.notation != stored.notation {
            return Err(stale().into());
        }
        let expected = expr.groups().into_iter().map(|g| g.notation.as_str());
        let found = stored.groups().into_iter().map(|g| g.notation.as_str());
        if !expected.eq(found) {
            return Err(stale().into());
        }

        Ok(RollResult::from_tree(expr.notation.clone(), stored.tree.clone())?)
    }

    /// Rolls a dice expression found at `(path, line, index)`, reusing the
    /// stored result there when persistence is on.
    pub fn roll_persisted<R: Roller + ?Sized>(
        &self,
        notation: &str,
        (path, line, index): (&str, usize, usize),
        results: &mut ResultStore,
        roller: &mut R,
    ) -> crate::Result<RollResult> {
        if !self.settings.persist_results {
            return self.roll_dice(notation, roller);
        }

        if let Some(stored) = results.get(path, line, index) {
            match self.apply_result(notation, stored) {
                Ok(result) => return Ok(result),
                Err(why) => log::warn!("discarding stored result at {}:{}:{}: {}", path, line, index, why),
            }
        }

        let result = self.roll_dice(notation, roller)?;
        results.insert(path, line, index, result.clone());
        Ok(result)
    }
}

/// `&amp;` goes last so `&amp;gt;` decodes to `&gt;`, not `>`.
fn decode_entities(text: &str) -> String {
    text.replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// What rolling a notation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Dice(RollResult),
    Reference(ReferenceResult),
}

impl Outcome {
    pub fn kind(&self) -> RollerKind {
        match self {
            Self::Dice(_) => RollerKind::Dice,
            Self::Reference(r) => r.kind,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dice(r) => write!(f, "{} = `{}`", r.display, r.total),
            Self::Reference(r) => f.write_str(&r.display),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Int;
    use crate::reference::{MemoryStore, Table};
    use crate::roll::{Number, SequenceRoller};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    fn roller(rolls: &[Int]) -> SequenceRoller {
        SequenceRoller::new(rolls.iter().copied())
    }

    fn engine_with_formulas() -> Engine {
        let mut settings = Settings::default();
        settings.formulas.insert("attack".into(), "1d20+5".into());
        Engine::new(settings)
    }

    #[test]
    fn test_prepare() {
        let engine = engine_with_formulas();
        assert_eq!(engine.prepare(" dice: 2d6+1 "), "2d6+1");
        assert_eq!(engine.prepare("dice:attack|nodice"), "1d20+5");
        assert_eq!(engine.prepare(r"[[Names]]\|line"), "[[Names]]|line");
        assert_eq!(engine.prepare("attacks"), "attacks");
    }

    #[test]
    fn test_prepare_decodes_entities() {
        let engine = Engine::default();
        assert_eq!(engine.prepare("dice: 5d10&gt;=8"), "5d10>=8");
        assert_eq!(engine.prepare("2d6r&lt;3"), "2d6r<3");
        assert_eq!(engine.prepare("1d4&amp;gt;"), "1d4&gt;");

        let result = engine.roll_dice("3d10&gt;=8", &mut roller(&[9, 2, 8])).unwrap();
        assert_eq!(result.total, Number::Int(2));
    }

    #[test]
    fn test_roll_dice() {
        let engine = Engine::default();
        let result = engine.roll_dice("2d6kh1", &mut roller(&[3, 5])).unwrap();
        assert_eq!(result.total, Number::Int(5));
        assert_eq!(result.notation, "2d6kh1");

        let result = engine.roll_dice("1+2*3^2", &mut roller(&[])).unwrap();
        assert_eq!(result.total, Number::Int(19));
    }

    #[test]
    fn test_roll_formula() {
        let engine = engine_with_formulas();
        let result = engine.roll_dice("dice: attack", &mut roller(&[12])).unwrap();
        assert_eq!(result.notation, "1d20+5");
        assert_eq!(result.total, Number::Int(17));
    }

    #[test]
    fn test_roll_fields() {
        let fields: HashMap<String, f64> = [("str".to_string(), 3.0)].into_iter().collect();
        let engine = Engine::default().with_fields(fields);
        let outcome = engine
            .roll("1d20 + str", &MemoryStore::new(), &mut roller(&[10]))
            .unwrap();
        assert_eq!(outcome.kind(), RollerKind::Dice);
        assert_eq!(outcome.to_string(), "1d20 (10) + 3 = `13`");
    }

    #[test]
    fn test_roll_field_named_like_modifier() {
        let fields: HashMap<String, f64> = [("dex".to_string(), 3.0)].into_iter().collect();
        let engine = Engine::default().with_fields(fields);
        let result = engine.roll_dice("1d20 + dex", &mut roller(&[10])).unwrap();
        assert_eq!(result.total, Number::Int(13));
    }

    #[test]
    fn test_roll_reference() {
        let store = MemoryStore::new().with_table(
            "Loot",
            "weapons",
            Table::new(
                vec!["Item".into()],
                vec![vec!["Sword".into()], vec!["Bow".into()]],
            ),
        );
        let outcome = Engine::default()
            .roll("dice: [[Loot#^weapons]]", &store, &mut roller(&[1]))
            .unwrap();
        assert_eq!(outcome.kind(), RollerKind::Table);
        assert_eq!(outcome.to_string(), "Bow");
    }

    #[test]
    fn test_roll_all_isolates_failures() {
        let engine = Engine::default();
        let results = engine.roll_all(
            ["1d6", "2 $ 3", "1d0", "[[Missing]]", "3"],
            &MemoryStore::new(),
            &mut roller(&[4]),
        );
        assert_eq!(results.len(), 5);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(crate::Error::Lex(_))));
        assert!(matches!(results[2], Err(crate::Error::Parse(_))));
        assert!(matches!(results[3], Err(crate::Error::Reference(_))));
        assert_eq!(results[4].as_ref().unwrap().to_string(), "3 = `3`");
    }

    #[test]
    fn test_apply_persisted_result() {
        let engine = Engine::default();
        let result = engine
            .roll_dice("4d6dl1 + 1d6!", &mut roller(&[2, 6, 4, 1, 6, 3]))
            .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let stored: RollResult = serde_json::from_str(&json).unwrap();

        let applied = engine.apply_result("4d6dl1 + 1d6!", &stored).unwrap();
        assert_eq!(applied.total, result.total);
        assert_eq!(applied.display, result.display);

        assert!(matches!(
            engine.apply_result("4d6dl1 + 1d8!", &stored),
            Err(crate::Error::Evaluation(EvaluationError::StaleResult { .. }))
        ));
    }

    #[test]
    fn test_roll_persisted() {
        let engine = Engine::new(Settings {
            persist_results: true,
            ..Settings::default()
        });
        let mut results = ResultStore::new();
        let at = ("Session.md", 4, 0);

        let first = engine
            .roll_persisted("2d6", at, &mut results, &mut roller(&[3, 4]))
            .unwrap();
        let second = engine
            .roll_persisted("2d6", at, &mut results, &mut roller(&[1, 1]))
            .unwrap();
        assert_eq!(first.total, Number::Int(7));
        assert_eq!(second, first);

        let changed = engine
            .roll_persisted("2d8", at, &mut results, &mut roller(&[1, 1]))
            .unwrap();
        assert_eq!(changed.total, Number::Int(2));
        assert_eq!(results.get("Session.md", 4, 0), Some(&changed));
    }

    #[test]
    fn test_roll_not_persisted_by_default() {
        let engine = Engine::default();
        let mut results = ResultStore::new();
        engine
            .roll_persisted("2d6", ("Session.md", 1, 0), &mut results, &mut roller(&[3, 4]))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_too_many_rolls() {
        let engine = Engine::new(Settings {
            max_rolls: Some(5),
            ..Settings::default()
        });
        assert!(matches!(
            engine.roll_dice("6d6", &mut roller(&[1])),
            Err(crate::Error::Evaluation(EvaluationError::TooManyRolls))
        ));
    }

    proptest! {
        #[test]
        fn test_dice_in_range(count in 0u32..40, faces in 1u32..200, seed in any::<u64>()) {
            let engine = Engine::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let result = engine.roll_dice(&format!("{}d{}", count, faces), &mut rng).unwrap();
            let groups = result.groups();
            prop_assert_eq!(groups.len(), 1);
            prop_assert_eq!(groups[0].dice.len(), count as usize);
            for die in &groups[0].dice {
                prop_assert!((1..=faces as Int).contains(&die.value()));
            }
        }
    }
}
