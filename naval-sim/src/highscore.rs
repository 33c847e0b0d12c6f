// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Fixed-size highscore list

use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};

/// Entries in a new list
pub const DEFAULT_ENTRIES: usize = 10;

/// One line of the list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighscoreEntry {
    /// Score
    pub points: u64,
    /// Player name
    pub name: String,
}

/// Best scores, highest first
///
/// # Examples
///
/// ```
/// use naval_sim::highscore::HighscoreList;
///
/// let mut list = HighscoreList::new(3);
/// list.record(5_000, "Prien");
/// list.record(9_000, "Kretschmer");
/// assert_eq!(list.entries()[0].name, "Kretschmer");
/// assert!(list.is_good_enough(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighscoreList {
    entries: Vec<HighscoreEntry>,
}

impl HighscoreList {
    /// List of `size` empty entries
    pub fn new(size: usize) -> Self {
        HighscoreList {
            entries: vec![HighscoreEntry::default(); size],
        }
    }

    /// Entries, best first
    pub fn entries(&self) -> &[HighscoreEntry] {
        &self.entries
    }

    /// Check if `points` would make it into the list
    pub fn is_good_enough(&self, points: u64) -> bool {
        self.entries.iter().any(|e| e.points < points)
    }

    /// Insert a score above the first worse entry, dropping the last one
    ///
    /// Returns the rank, or `None` if the score was not good enough.
    pub fn record(&mut self, points: u64, name: impl Into<String>) -> Option<usize> {
        let rank = self.entries.iter().position(|e| e.points < points)?;
        self.entries.pop();
        self.entries.insert(
            rank,
            HighscoreEntry {
                points,
                name: name.into(),
            },
        );
        Some(rank)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for HighscoreList {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_size_and_order() {
        let mut list = HighscoreList::new(3);
        assert_eq!(list.record(100, "a"), Some(0));
        assert_eq!(list.record(300, "b"), Some(0));
        assert_eq!(list.record(200, "c"), Some(1));
        assert_eq!(list.record(50, "d"), None);
        let points: Vec<u64> = list.entries().iter().map(|e| e.points).collect();
        assert_eq!(points, vec![300, 200, 100]);
        assert!(!list.is_good_enough(100));
        assert!(list.is_good_enough(101));
    }

    #[test]
    fn test_equal_score_ranks_below() {
        let mut list = HighscoreList::new(2);
        list.record(100, "first");
        assert_eq!(list.record(100, "second"), Some(1));
        assert_eq!(list.entries()[0].name, "first");
    }

    #[test]
    fn test_json() {
        let mut list = HighscoreList::default();
        list.record(42, "x");
        let back = HighscoreList::from_json(&list.to_json().unwrap()).unwrap();
        assert_eq!(back, list);
        assert_eq!(back.entries().len(), DEFAULT_ENTRIES);
    }
}
