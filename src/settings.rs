//! Engine configuration.
//!
//! Every field has a default, so a partial TOML document (or none at all) is a
//! valid configuration.

use crate::common::{MatchPolicy, UInt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a reference roller does when asked for more distinct entries than
/// the population holds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exhaustion {
    /// Fall back to drawing with replacement.
    #[default]
    Repeat,
    /// Return every entry once.
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Dice count used when `NdM` omits `N`.
    pub default_roll: UInt,
    /// Face count used when `NdM` omits `M`.
    pub default_face: UInt,
    /// Stand-in for "unbounded" (`!i`, `!!i`, `ri`), and the upper bound on
    /// any reroll or explosion chain.
    pub unbounded_cap: UInt,
    /// Faces on each die of a stunt roll.
    pub stunt_faces: UInt,
    pub conditional_policy: MatchPolicy,
    /// Upper bound on the dice drawn by a single evaluation.
    pub max_rolls: Option<usize>,
    pub return_all_tags: bool,
    pub roll_links_for_tags: bool,
    pub table_exhaustion: Exhaustion,
    pub persist_results: bool,
    /// Whole-notation aliases, e.g. `"attack" = "1d20+5"`. Kept last so the
    /// table serializes after the plain values.
    pub formulas: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_roll: 1,
            default_face: 100,
            unbounded_cap: 100,
            stunt_faces: 6,
            conditional_policy: MatchPolicy::All,
            max_rolls: Some(10_000),
            return_all_tags: true,
            roll_links_for_tags: false,
            table_exhaustion: Exhaustion::Repeat,
            persist_results: false,
            formulas: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_toml(
            r#"
            default_face = 20
            conditional_policy = "any"

            [formulas]
            attack = "1d20+5"
            "#,
        )
        .unwrap();

        assert_eq!(settings.default_face, 20);
        assert_eq!(settings.default_roll, 1);
        assert_eq!(settings.conditional_policy, MatchPolicy::Any);
        assert_eq!(settings.formulas["attack"], "1d20+5");
        assert_eq!(settings.unbounded_cap, 100);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = Settings::default();
        settings.table_exhaustion = Exhaustion::Truncate;
        settings.formulas.insert("fireball".into(), "8d6".into());
        let text = settings.to_toml().unwrap();
        assert_eq!(Settings::from_toml(&text).unwrap(), settings);
    }
}
