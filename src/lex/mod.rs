//! Turns notation text into classified lexemes.

mod classify;
mod condition;
pub(crate) mod rules;

use crate::common::{Conditional, Float};
use crate::settings::Settings;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

pub use classify::{classify, RollerKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LexemeKind {
    Dice,
    Math,
    Stunt,
    Explode,
    ExplodeCombine,
    Reroll,
    KeepHigh,
    KeepLow,
    DropHigh,
    DropLow,
    Table,
    Section,
    Line,
    Tag,
    Link,
}

impl LexemeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dice => "dice",
            Self::Math => "math",
            Self::Stunt => "stunt",
            Self::Explode => "explode",
            Self::ExplodeCombine => "explode-combine",
            Self::Reroll => "reroll",
            Self::KeepHigh => "keep-high",
            Self::KeepLow => "keep-low",
            Self::DropHigh => "drop-high",
            Self::DropLow => "drop-low",
            Self::Table => "table",
            Self::Section => "section",
            Self::Line => "line",
            Self::Tag => "tag",
            Self::Link => "link",
        }
    }

    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Explode
                | Self::ExplodeCombine
                | Self::Reroll
                | Self::KeepHigh
                | Self::KeepLow
                | Self::DropHigh
                | Self::DropLow
        )
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Self::Table | Self::Section | Self::Line | Self::Tag | Self::Link
        )
    }
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    /// Canonical payload: `NdM` for dice, a bare count for modifiers, the
    /// operator for math, the full reference for references.
    pub data: String,
    /// The exact text this lexeme was read from.
    pub original: String,
    pub conditionals: Option<Vec<Conditional>>,
    pub span: Range<usize>,
}

impl Lexeme {
    pub fn conditionals(&self) -> &[Conditional] {
        self.conditionals.as_deref().unwrap_or_default()
    }
}

/// Read-only source of named numeric values substituted for identifiers.
pub trait FieldLookup {
    fn field(&self, name: &str) -> Option<Float>;
}

impl FieldLookup for HashMap<String, Float> {
    fn field(&self, name: &str) -> Option<Float> {
        self.get(name).copied()
    }
}

impl FieldLookup for BTreeMap<String, Float> {
    fn field(&self, name: &str) -> Option<Float> {
        self.get(name).copied()
    }
}

#[derive(Copy, Clone)]
pub struct LexContext<'a> {
    pub settings: &'a Settings,
    pub fields: Option<&'a dyn FieldLookup>,
}

impl<'a> LexContext<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: &'a dyn FieldLookup) -> Self {
        self.fields = Some(fields);
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unrecognized notation at position {position}: {slice:?}")]
pub struct LexError {
    pub position: usize,
    pub slice: String,
}

impl LexError {
    fn new(input: &str, position: usize) -> Self {
        let rest = &input[position..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        Self {
            position,
            slice: rest[..end].to_string(),
        }
    }
}

pub fn tokenize(input: &str, ctx: &LexContext<'_>) -> Result<Vec<Lexeme>, LexError> {
    let mut ret = Vec::new();
    let mut position = 0;

    while position < input.len() {
        let rest = &input[position..];
        let (len, outcome) =
            rules::first_match(rest, ctx).ok_or_else(|| LexError::new(input, position))?;

        if let rules::Outcome::Emit(token) = outcome {
            ret.push(Lexeme {
                kind: token.kind,
                data: token.data,
                original: rest[..len].to_string(),
                conditionals: token.conditionals,
                span: position..position + len,
            });
        }
        position += len;
    }

    log::debug!(
        "lexed {:?} into [{}]",
        input,
        ret.iter()
            .map(|l| format!("{}:{}", l.kind, l.data))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CompareOp;
    use proptest::prelude::*;

    fn lex(s: &str) -> Vec<Lexeme> {
        let settings = Settings::default();
        tokenize(s, &LexContext::new(&settings)).unwrap()
    }

    fn check(s: &str, expected: &[(LexemeKind, &str)]) {
        let actual: Vec<_> = lex(s)
            .into_iter()
            .map(|l| (l.kind, l.data))
            .collect();
        let expected: Vec<_> = expected
            .iter()
            .map(|&(k, d)| (k, d.to_string()))
            .collect();
        assert_eq!(actual, expected, "{}", s);
    }

    #[test]
    fn test_lex_arithmetic() {
        use LexemeKind::*;
        check(
            "4d6kh2+3",
            &[(Dice, "4d6"), (KeepHigh, "2"), (Math, "+"), (Dice, "3")],
        );
        check(
            "(1 + 2) * 3 ^ 2",
            &[
                (Math, "("),
                (Dice, "1"),
                (Math, "+"),
                (Dice, "2"),
                (Math, ")"),
                (Math, "*"),
                (Dice, "3"),
                (Math, "^"),
                (Dice, "2"),
            ],
        );
    }

    #[test]
    fn test_lex_dice_defaults() {
        use LexemeKind::*;
        check("d20", &[(Dice, "1d20")]);
        check("3d", &[(Dice, "3d100")]);
        check("1d%", &[(Dice, "1d100")]);
        check("2D8", &[(Dice, "2d8")]);
    }

    #[test]
    fn test_lex_keep_drop() {
        use LexemeKind::*;
        check("4d6dl1", &[(Dice, "4d6"), (DropLow, "1")]);
        check("4d6d", &[(Dice, "4d6"), (DropLow, "1")]);
        check("4d6dh", &[(Dice, "4d6"), (DropHigh, "1")]);
        check("2d20k", &[(Dice, "2d20"), (KeepHigh, "1")]);
        check("2d20kl", &[(Dice, "2d20"), (KeepLow, "1")]);
        check("5d8kl3", &[(Dice, "5d8"), (KeepLow, "3")]);
    }

    #[test]
    fn test_lex_stunt() {
        use LexemeKind::*;
        check("1dS", &[(Stunt, "1")]);
        check("1DS + 2", &[(Stunt, "1"), (Math, "+"), (Dice, "2")]);
    }

    #[test]
    fn test_lex_explode_reroll() {
        use LexemeKind::*;
        check("4d6!!", &[(Dice, "4d6"), (ExplodeCombine, "1")]);
        check("1d6!i", &[(Dice, "1d6"), (Explode, "100")]);
        check("2d6r", &[(Dice, "2d6"), (Reroll, "1")]);
        check("1d10!!3>=9", &[(Dice, "1d10"), (ExplodeCombine, "3")]);

        let lexemes = lex("2d6ri=1=2");
        assert_eq!(lexemes[1].data, "100");
        assert_eq!(
            lexemes[1].conditionals(),
            &[
                Conditional::new(CompareOp::Eq, 1),
                Conditional::new(CompareOp::Eq, 2)
            ]
        );

        let lexemes = lex("2d6r<3");
        assert_eq!(
            lexemes[1].conditionals(),
            &[Conditional::new(CompareOp::Lt, 3)]
        );
    }

    #[test]
    fn test_lex_dice_conditionals() {
        let lexemes = lex("5d10>=8");
        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].data, "5d10");
        assert_eq!(
            lexemes[0].conditionals(),
            &[Conditional::new(CompareOp::Ge, 8)]
        );

        let lexemes = lex("1d20=!-1");
        assert_eq!(
            lexemes[0].conditionals(),
            &[Conditional::new(CompareOp::Ne, -1)]
        );
    }

    #[test]
    fn test_lex_references() {
        use LexemeKind::*;
        check("[[Loot#^weapons]]", &[(Table, "[[Loot#^weapons]]")]);
        check("[[Loot^weapons]]|Item", &[(Table, "[[Loot^weapons]]|Item")]);
        check("3d[[Encounters]]", &[(Section, "3d[[Encounters]]")]);
        check("[[Names]]|line", &[(Line, "[[Names]]|line")]);
        check("{{#npc|+}}", &[(Link, "#npc|+")]);
        check("#npc|-|paragraph", &[(Tag, "#npc|-|paragraph")]);
        check("#npc", &[(Tag, "#npc")]);
    }

    #[test]
    fn test_lex_links_for_tags() {
        let settings = Settings {
            roll_links_for_tags: true,
            ..Settings::default()
        };
        let ctx = LexContext::new(&settings);
        assert_eq!(tokenize("#npc", &ctx).unwrap()[0].kind, LexemeKind::Link);
        assert_eq!(tokenize("#npc|-", &ctx).unwrap()[0].kind, LexemeKind::Tag);
    }

    #[test]
    fn test_lex_fields() {
        use LexemeKind::*;
        let settings = Settings::default();
        let fields: HashMap<String, Float> = [("str".to_string(), 3.0), ("mod_2".to_string(), 1.5)]
            .into_iter()
            .collect();
        let ctx = LexContext::new(&settings).with_fields(&fields);

        let lexemes: Vec<_> = tokenize("1d20 + str + mod_2", &ctx)
            .unwrap()
            .into_iter()
            .map(|l| (l.kind, l.data))
            .collect();
        assert_eq!(
            lexemes,
            vec![
                (Dice, "1d20".to_string()),
                (Math, "+".to_string()),
                (Dice, "3".to_string()),
                (Math, "+".to_string()),
                (Dice, "1.5".to_string()),
            ]
        );

        check("str + 2", &[(Math, "+"), (Dice, "2")]);
    }

    #[test]
    fn test_lex_fields_starting_with_modifier_letters() {
        use LexemeKind::*;
        let settings = Settings::default();
        let fields: HashMap<String, Float> = [("dex".to_string(), 3.0), ("rage".to_string(), 2.0)]
            .into_iter()
            .collect();
        let ctx = LexContext::new(&settings).with_fields(&fields);

        let lexemes: Vec<_> = tokenize("1d20 + dex - rage", &ctx)
            .unwrap()
            .into_iter()
            .map(|l| (l.kind, l.data))
            .collect();
        assert_eq!(
            lexemes,
            vec![
                (Dice, "1d20".to_string()),
                (Math, "+".to_string()),
                (Dice, "3".to_string()),
                (Math, "-".to_string()),
                (Dice, "2".to_string()),
            ]
        );

        check("1d20 + dex", &[(Dice, "1d20"), (Math, "+")]);
        check("4d6r1dl1", &[(Dice, "4d6"), (Reroll, "1"), (DropLow, "1")]);
        check("4d6kh3r", &[(Dice, "4d6"), (KeepHigh, "3"), (Reroll, "1")]);
    }

    #[test]
    fn test_lex_spans() {
        let lexemes = lex(" 2d20 kh1");
        assert_eq!(lexemes[0].span, 1..5);
        assert_eq!(lexemes[0].original, "2d20");
        assert_eq!(lexemes[1].span, 6..9);
        assert_eq!(lexemes[1].original, "kh1");
    }

    #[test]
    fn test_lex_error() {
        let settings = Settings::default();
        let err = tokenize("2 $ 3", &LexContext::new(&settings)).unwrap_err();
        assert_eq!(
            err,
            LexError {
                position: 2,
                slice: "$".to_string()
            }
        );
    }

    fn term() -> impl Strategy<Value = String> {
        let modifiers = prop::sample::select(vec![
            "", "kh2", "kl1", "dh1", "dl1", "!", "!!", "r1", "r<3", "!!>=5",
        ]);
        (1u32..20, 1u32..100, modifiers)
            .prop_map(|(count, faces, modifier)| format!("{}d{}{}", count, faces, modifier))
    }

    proptest! {
        #[test]
        fn test_originals_reconstruct_input(
            first in term(),
            rest in prop::collection::vec(
                (prop::sample::select(vec!["+", "-", "*", "/"]), term()),
                0..4,
            ),
        ) {
            let mut input = first;
            for (op, t) in rest {
                input.push_str(op);
                input.push_str(&t);
            }

            let rebuilt: String = lex(&input).into_iter().map(|l| l.original).collect();
            prop_assert_eq!(rebuilt, input);
        }
    }
}
