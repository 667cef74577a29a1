use super::{Lexeme, LexemeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which roller consumes a lexeme sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollerKind {
    Dice,
    Table,
    Section,
    Tag,
    Link,
    Line,
}

impl RollerKind {
    const PRIORITY: &'static [(LexemeKind, Self)] = &[
        (LexemeKind::Table, Self::Table),
        (LexemeKind::Section, Self::Section),
        (LexemeKind::Tag, Self::Tag),
        (LexemeKind::Link, Self::Link),
        (LexemeKind::Line, Self::Line),
    ];

    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Dice)
    }

    /// The lexeme a reference roller reads its notation from.
    pub fn lexeme_kind(&self) -> Option<LexemeKind> {
        Self::PRIORITY
            .iter()
            .find(|(_, roller)| roller == self)
            .map(|&(kind, _)| kind)
    }
}

impl fmt::Display for RollerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dice => "dice",
            Self::Table => "table",
            Self::Section => "section",
            Self::Tag => "tag",
            Self::Link => "link",
            Self::Line => "line",
        };
        f.write_str(s)
    }
}

/// Picks the roller for `lexemes`. Any reference lexeme wins over dice, and
/// among references the first kind in `table, section, tag, link, line`
/// present anywhere in the sequence decides.
pub fn classify(lexemes: &[Lexeme]) -> RollerKind {
    RollerKind::PRIORITY
        .iter()
        .find(|(kind, _)| lexemes.iter().any(|l| l.kind == *kind))
        .map_or(RollerKind::Dice, |&(_, roller)| roller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::{tokenize, LexContext};
    use crate::settings::Settings;

    fn check(s: &str, expected: RollerKind) {
        let settings = Settings::default();
        let lexemes = tokenize(s, &LexContext::new(&settings)).unwrap();
        assert_eq!(classify(&lexemes), expected, "{}", s);
    }

    #[test]
    fn test_classify_dice() {
        check("2d6+4", RollerKind::Dice);
        check("1dS", RollerKind::Dice);
        check("", RollerKind::Dice);
    }

    #[test]
    fn test_classify_references() {
        check("[[Loot#^weapons]]", RollerKind::Table);
        check("2d[[Encounters]]", RollerKind::Section);
        check("[[Names]]|line", RollerKind::Line);
        check("#npc", RollerKind::Tag);
        check("{{#npc|+}}", RollerKind::Link);
    }

    #[test]
    fn test_lexeme_kind() {
        assert_eq!(RollerKind::Dice.lexeme_kind(), None);
        assert_eq!(RollerKind::Line.lexeme_kind(), Some(LexemeKind::Line));
        assert_eq!(RollerKind::Table.lexeme_kind(), Some(LexemeKind::Table));
    }

    #[test]
    fn test_classify_priority() {
        check("[[Encounters]] [[Loot#^weapons]]", RollerKind::Table);
        check("#npc [[Encounters]]", RollerKind::Section);
    }
}
