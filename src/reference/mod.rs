//! Rollers that draw entries from documents instead of rolling dice.

mod section;
mod table;
mod tag;

use crate::common::Int;
use crate::engine::Engine;
use crate::lex::{rules, Lexeme, LexemeKind, RollerKind};
use crate::roll::{EvaluationError, Roller};
use crate::settings::Exhaustion;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use section::{LineRoller, SectionRoller};
pub use table::TableRoller;
pub use tag::{LinkRoller, TagRoller};

static TABLE: Lazy<Regex> = Lazy::new(|| rules::anchored(rules::TABLE_PATTERN));
static SECTION: Lazy<Regex> = Lazy::new(|| rules::anchored(rules::SECTION_PATTERN));
static TAG: Lazy<Regex> = Lazy::new(|| rules::anchored(rules::TAG_PATTERN));

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("malformed reference {0:?}")]
    Malformed(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} has nothing to roll")]
    Empty(String),
    #[error("table {table} has no column {column:?}")]
    UnknownColumn { table: String, column: String },
    #[error("no row of {table} covers {value}")]
    NoRow { table: String, value: Int },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

/// A block of a note: a paragraph, list, heading, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: String,
    pub text: String,
}

impl Section {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }
}

/// Read access to the documents references point into. `None` means the
/// note, block or tag does not exist.
pub trait ContentStore {
    fn table(&self, note: &str, block: &str) -> Option<Table>;

    fn sections(&self, note: &str) -> Option<Vec<Section>>;

    /// Non-empty lines of a note.
    fn lines(&self, note: &str) -> Option<Vec<String>> {
        let sections = self.sections(note)?;
        Some(
            sections
                .iter()
                .flat_map(|s| s.text.lines())
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Paths of the notes carrying `tag` (with its leading `#`).
    fn tagged(&self, tag: &str) -> Option<Vec<String>>;
}

/// A [`ContentStore`] held in memory; also loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    /// Keyed by note, then block id.
    pub tables: HashMap<String, HashMap<String, Table>>,
    pub notes: HashMap<String, Vec<Section>>,
    pub tags: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, note: &str, block: &str, table: Table) -> Self {
        self.tables
            .entry(note.to_string())
            .or_default()
            .insert(block.to_string(), table);
        self
    }

    pub fn with_note(mut self, note: &str, sections: Vec<Section>) -> Self {
        self.notes.insert(note.to_string(), sections);
        self
    }

    pub fn with_tag(mut self, tag: &str, notes: &[&str]) -> Self {
        self.tags.insert(
            tag.to_string(),
            notes.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ContentStore for MemoryStore {
    fn table(&self, note: &str, block: &str) -> Option<Table> {
        self.tables.get(note)?.get(block).cloned()
    }

    fn sections(&self, note: &str) -> Option<Vec<Section>> {
        self.notes.get(note).cloned()
    }

    fn tagged(&self, tag: &str) -> Option<Vec<String>> {
        self.tags.get(tag).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceResult {
    pub kind: RollerKind,
    pub notation: String,
    pub entries: Vec<String>,
    pub display: String,
}

#[enum_dispatch::enum_dispatch]
pub trait RollReference {
    fn roll<S: ContentStore + ?Sized, R: Roller + ?Sized>(
        &self,
        engine: &Engine,
        store: &S,
        roller: &mut R,
    ) -> crate::Result<ReferenceResult>;
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch::enum_dispatch(RollReference)]
pub enum ReferenceRoller {
    Table(TableRoller),
    Section(SectionRoller),
    Line(LineRoller),
    Tag(TagRoller),
    Link(LinkRoller),
}

impl ReferenceRoller {
    pub fn from_lexeme(lexeme: &Lexeme) -> Result<Self, ReferenceError> {
        Ok(match lexeme.kind {
            LexemeKind::Table => TableRoller::new(&lexeme.data)?.into(),
            LexemeKind::Section => SectionRoller::new(&lexeme.data)?.into(),
            LexemeKind::Line => LineRoller::new(&lexeme.data)?.into(),
            LexemeKind::Tag => TagRoller::new(&lexeme.data)?.into(),
            LexemeKind::Link => LinkRoller::new(&lexeme.data)?.into(),
            _ => return Err(ReferenceError::Malformed(lexeme.original.clone())),
        })
    }
}

fn captures<'t>(regex: &Regex, data: &'t str) -> Result<Captures<'t>, ReferenceError> {
    regex
        .captures(data)
        .ok_or_else(|| ReferenceError::Malformed(data.to_string()))
}

/// The optional `N` of an `Nd[[...]]` prefix.
fn count(caps: &Captures<'_>) -> Result<usize, ReferenceError> {
    match caps.get(1) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| ReferenceError::Malformed(caps[0].to_string())),
        None => Ok(1),
    }
}

/// Comma separated section kinds, lowercased; empty means any kind.
fn kinds(modifier: Option<&str>) -> Vec<String> {
    modifier
        .map(|m| {
            m.split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn filter_kinds(sections: Vec<Section>, kinds: &[String]) -> Vec<Section> {
    if kinds.is_empty() {
        sections
    } else {
        sections
            .into_iter()
            .filter(|s| kinds.contains(&s.kind.to_lowercase()))
            .collect()
    }
}

/// Rejects draws larger than the engine's roll budget.
fn check_budget(engine: &Engine, count: usize) -> crate::Result<()> {
    match engine.settings().max_rolls {
        Some(max) if count > max => Err(EvaluationError::TooManyRolls.into()),
        _ => Ok(()),
    }
}

/// Picks `count` indices into a population of `population` entries.
///
/// Without replacement a partial Fisher-Yates shuffle is used. Asking for more
/// entries than exist falls back to `exhaustion`.
pub(crate) fn draw<R: Roller + ?Sized>(
    roller: &mut R,
    population: usize,
    count: usize,
    replacement: bool,
    exhaustion: Exhaustion,
) -> Vec<usize> {
    if population == 0 {
        return Vec::new();
    }
    let last = population as Int - 1;

    if !replacement && count > population {
        log::warn!(
            "asked for {} of {} entries, applying {:?}",
            count,
            population,
            exhaustion
        );
    }
    if replacement || (count > population && exhaustion == Exhaustion::Repeat) {
        return (0..count)
            .map(|_| roller.uniform_int(0, last) as usize)
            .collect();
    }

    let count = count.min(population);
    let mut pool: Vec<usize> = (0..population).collect();
    for i in 0..count {
        let j = roller.uniform_int(i as Int, last) as usize;
        pool.swap(i, j);
    }
    pool.truncate(count);
    pool
}
