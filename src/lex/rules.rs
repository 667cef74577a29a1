//! The ordered rule table driving the lexer.
//!
//! Rules are tried top to bottom at every scan position and the first one
//! that matches *and* whose classifier accepts the match wins. A classifier
//! sees the text following the match, which lets it refuse matches the regex
//! engine cannot rule out on its own (`k` directly before `l`, `d` directly
//! before `h`, a count directly before `dS`, ...).

use super::{condition, LexContext, LexemeKind};
use crate::common::Conditional;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub(crate) const TABLE_PATTERN: &str =
    r"(?:(\d+)[Dd])?\[\[([^\]]+?)#?\^([^\]]+?)\]\](?:\|([^{}]+))?";
pub(crate) const SECTION_PATTERN: &str = r"(?:(\d+)[Dd])?\[\[([^\]]+)\]\](?:\|([^{}]+))?";
pub(crate) const TAG_PATTERN: &str =
    r"(?:(\d+)[Dd])?(#[\p{L}\p{Emoji_Presentation}\w/-]+)(?:\|([+-]))?(?:\|([^+\-{}][^{}]*))?";

const CONDITIONALS: &str = r"(?:!=|=!|>=|=>|<=|=<|=|>|<)-?\d+";

pub(crate) struct Token {
    pub kind: LexemeKind,
    pub data: String,
    pub conditionals: Option<Vec<Conditional>>,
}

impl Token {
    fn new(kind: LexemeKind, data: impl Into<String>) -> Self {
        Self {
            kind,
            data: data.into(),
            conditionals: None,
        }
    }

    fn with_conditionals(mut self, conditionals: Vec<Conditional>) -> Self {
        self.conditionals = Some(conditionals);
        self
    }
}

pub(crate) enum Outcome {
    /// Consume the match without producing a lexeme.
    Skip,
    Emit(Token),
    /// Pretend the rule did not match.
    Reject,
}

/// Receives the captures and the input remaining after the match.
type Classify = fn(&Captures<'_>, &str, &LexContext<'_>) -> Outcome;

pub(crate) struct Rule {
    pub name: &'static str,
    pattern: Regex,
    classify: Classify,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, classify: Classify) -> Self {
        Self {
            name,
            pattern: anchored(pattern),
            classify,
        }
    }
}

pub(crate) fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{})", pattern)).expect("lexer patterns are valid regexes")
}

pub(crate) static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("skip", r"\s+|[{}]+", |_, _, _| Outcome::Skip),
        Rule::new("table", TABLE_PATTERN, table),
        Rule::new("section", SECTION_PATTERN, section),
        Rule::new("tag", TAG_PATTERN, tag),
        Rule::new(
            "dice",
            &format!(r"(\d+)?[dD](\d+|%)?((?:{})*)", CONDITIONALS),
            dice,
        ),
        Rule::new("integer", r"\d+", integer),
        Rule::new("math", r"[-+*/^()]", |caps, _, _| {
            Outcome::Emit(Token::new(LexemeKind::Math, &caps[0]))
        }),
        Rule::new("stunt", r"1[dD]S", |_, _, _| {
            Outcome::Emit(Token::new(LexemeKind::Stunt, "1").with_conditionals(Vec::new()))
        }),
        Rule::new("keep-high", r"kh?(\d*)", |caps, rest, ctx| {
            if (!caps[0].starts_with("kh") && rest.starts_with('l')) || starts_word(caps, rest, ctx) {
                Outcome::Reject
            } else {
                count_modifier(LexemeKind::KeepHigh, caps)
            }
        }),
        Rule::new("drop-low", r"dl?(\d*)", |caps, rest, ctx| {
            if (!caps[0].starts_with("dl") && rest.starts_with('h')) || starts_word(caps, rest, ctx) {
                Outcome::Reject
            } else {
                count_modifier(LexemeKind::DropLow, caps)
            }
        }),
        Rule::new("keep-low", r"kl(\d*)", |caps, rest, ctx| {
            if starts_word(caps, rest, ctx) {
                Outcome::Reject
            } else {
                count_modifier(LexemeKind::KeepLow, caps)
            }
        }),
        Rule::new("drop-high", r"dh(\d*)", |caps, rest, ctx| {
            if starts_word(caps, rest, ctx) {
                Outcome::Reject
            } else {
                count_modifier(LexemeKind::DropHigh, caps)
            }
        }),
        Rule::new(
            "explode-combine",
            &format!(r"!!(i|\d+)?((?:{})*)", CONDITIONALS),
            |caps, _, ctx| conditional_modifier(LexemeKind::ExplodeCombine, caps, ctx),
        ),
        Rule::new(
            "explode",
            &format!(r"!(i|\d+)?((?:{})*)", CONDITIONALS),
            |caps, _, ctx| conditional_modifier(LexemeKind::Explode, caps, ctx),
        ),
        Rule::new(
            "reroll",
            &format!(r"r(i|\d+)?((?:{})*)", CONDITIONALS),
            |caps, rest, ctx| {
                if starts_word(caps, rest, ctx) {
                    Outcome::Reject
                } else {
                    conditional_modifier(LexemeKind::Reroll, caps, ctx)
                }
            },
        ),
        Rule::new("identifier", r"[A-Za-z][A-Za-z0-9_]+", identifier),
    ]
});

/// Finds the first accepting rule at the start of `rest`, returning the
/// matched length and the classifier's outcome.
pub(crate) fn first_match(rest: &str, ctx: &LexContext<'_>) -> Option<(usize, Outcome)> {
    for rule in RULES.iter() {
        let caps = match rule.pattern.captures(rest) {
            Some(caps) => caps,
            None => continue,
        };
        let end = match caps.get(0) {
            Some(m) if !m.as_str().is_empty() => m.end(),
            _ => continue,
        };
        match (rule.classify)(&caps, &rest[end..], ctx) {
            Outcome::Reject => log::trace!("rule {} rejected {:?}", rule.name, &rest[..end]),
            outcome => return Some((end, outcome)),
        }
    }
    None
}

fn table(caps: &Captures<'_>, _: &str, _: &LexContext<'_>) -> Outcome {
    Outcome::Emit(Token::new(LexemeKind::Table, &caps[0]))
}

fn section(caps: &Captures<'_>, _: &str, _: &LexContext<'_>) -> Outcome {
    let kind = match caps.get(3) {
        Some(m) if m.as_str().trim() == "line" => LexemeKind::Line,
        _ => LexemeKind::Section,
    };
    Outcome::Emit(Token::new(kind, &caps[0]))
}

fn tag(caps: &Captures<'_>, _: &str, ctx: &LexContext<'_>) -> Outcome {
    let kind = match caps.get(3).map(|m| m.as_str()) {
        Some("+") => LexemeKind::Link,
        None if ctx.settings.roll_links_for_tags => LexemeKind::Link,
        _ => LexemeKind::Tag,
    };
    Outcome::Emit(Token::new(kind, &caps[0]))
}

fn dice(caps: &Captures<'_>, rest: &str, ctx: &LexContext<'_>) -> Outcome {
    let count = caps.get(1).map(|m| m.as_str());
    let faces = caps.get(2).map(|m| m.as_str());

    // A lone `d` is a drop, and `d` before a letter belongs to `dh`/`dl`/`dS`.
    if faces.is_none() && (count.is_none() || rest.starts_with(|c: char| c.is_ascii_alphabetic()))
    {
        return Outcome::Reject;
    }

    let count = count.map_or_else(|| ctx.settings.default_roll.to_string(), str::to_string);
    let faces = match faces {
        Some("%") => "100".to_string(),
        Some(faces) => faces.to_string(),
        None => ctx.settings.default_face.to_string(),
    };
    let conditionals = condition::conditionals(caps.get(3).map_or("", |m| m.as_str()));

    Outcome::Emit(
        Token::new(LexemeKind::Dice, format!("{}d{}", count, faces)).with_conditionals(conditionals),
    )
}

fn integer(caps: &Captures<'_>, rest: &str, _: &LexContext<'_>) -> Outcome {
    if rest.starts_with(['d', 'D']) {
        Outcome::Reject
    } else {
        Outcome::Emit(Token::new(LexemeKind::Dice, &caps[0]).with_conditionals(Vec::new()))
    }
}

/// Whether a letter modifier is really the head of an identifier: the word it
/// starts is a bound field, or it runs into letters no modifier continues with.
fn starts_word(caps: &Captures<'_>, rest: &str, ctx: &LexContext<'_>) -> bool {
    let tail = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if tail == 0 {
        return false;
    }
    let word = format!("{}{}", &caps[0], &rest[..tail]);
    if ctx.fields.map_or(false, |fields| fields.field(&word).is_some()) {
        return true;
    }
    rest.starts_with(|c: char| c.is_ascii_alphabetic() && !"kdrlh".contains(c))
}

fn count_modifier(kind: LexemeKind, caps: &Captures<'_>) -> Outcome {
    let count = match caps.get(1).map(|m| m.as_str()) {
        Some("") | None => "1",
        Some(digits) => digits,
    };
    Outcome::Emit(Token::new(kind, count))
}

fn conditional_modifier(kind: LexemeKind, caps: &Captures<'_>, ctx: &LexContext<'_>) -> Outcome {
    let times = match caps.get(1).map(|m| m.as_str()) {
        Some("i") => ctx.settings.unbounded_cap.to_string(),
        Some(digits) => digits.to_string(),
        None => "1".to_string(),
    };
    let conditionals = condition::conditionals(caps.get(2).map_or("", |m| m.as_str()));
    Outcome::Emit(Token::new(kind, times).with_conditionals(conditionals))
}

fn identifier(caps: &Captures<'_>, _: &str, ctx: &LexContext<'_>) -> Outcome {
    let name = &caps[0];
    match ctx.fields.and_then(|fields| fields.field(name)) {
        Some(value) => Outcome::Emit(
            Token::new(LexemeKind::Dice, value.to_string()).with_conditionals(Vec::new()),
        ),
        None => {
            log::warn!("unresolved field {:?} dropped from notation", name);
            Outcome::Skip
        }
    }
}
