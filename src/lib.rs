pub mod common;
pub mod engine;
mod error;
pub mod lex;
pub mod parse;
pub mod persist;
pub mod reference;
pub mod roll;
pub mod settings;

pub use engine::{Engine, Outcome};
pub use error::{Error, Result};
pub use persist::ResultStore;
pub use roll::{RollResult, Roller};
pub use settings::Settings;

pub(crate) type DefaultRng = rand::prelude::ThreadRng;

/// Rolls a dice expression with default settings and the thread-local RNG.
pub fn roll(notation: &str) -> Result<RollResult> {
    let mut rng: DefaultRng = rand::thread_rng();
    Engine::default().roll_dice(notation, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::{MarkdownStringifier, SimpleStringifier};

    #[test]
    fn test_roll_convenience() {
        let result = roll("3d6 + 2").unwrap();
        let total = result.total.as_int();
        assert!((5..=20).contains(&total));
        assert_eq!(result.groups()[0].dice.len(), 3);
        assert!(result.result::<SimpleStringifier>().unwrap().ends_with(&format!("= {}", total)));
        assert!(result
            .result::<MarkdownStringifier>()
            .unwrap()
            .ends_with(&format!("= `{}`", total)));
    }

    #[test]
    fn test_roll_error() {
        assert!(matches!(roll("2d6 +"), Err(Error::Parse(_))));
    }
}
