//! Roll results kept between sessions, addressed by document path, line and
//! position within the line.

use crate::roll::RollResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultStore {
    results: BTreeMap<String, BTreeMap<usize, BTreeMap<usize, RollResult>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `result`, returning whatever was stored at that position.
    pub fn insert(
        &mut self,
        path: &str,
        line: usize,
        index: usize,
        result: RollResult,
    ) -> Option<RollResult> {
        self.results
            .entry(path.to_string())
            .or_default()
            .entry(line)
            .or_default()
            .insert(index, result)
    }

    pub fn get(&self, path: &str, line: usize, index: usize) -> Option<&RollResult> {
        self.results.get(path)?.get(&line)?.get(&index)
    }

    pub fn remove(&mut self, path: &str, line: usize, index: usize) -> Option<RollResult> {
        let ret = self.results.get_mut(path)?.get_mut(&line)?.remove(&index);
        self.clear_empties();
        ret
    }

    /// Forgets every result stored for one line.
    pub fn remove_line(&mut self, path: &str, line: usize) -> Option<BTreeMap<usize, RollResult>> {
        let ret = self.results.get_mut(path)?.remove(&line);
        self.clear_empties();
        ret
    }

    /// Prunes lines and paths left without results.
    pub fn clear_empties(&mut self) {
        for lines in self.results.values_mut() {
            lines.retain(|_, results| !results.is_empty());
        }
        self.results.retain(|_, lines| !lines.is_empty());
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
