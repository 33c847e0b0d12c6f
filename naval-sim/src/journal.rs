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
//! Game history: events, logbook, sink records and player career
//!
//! Everything here is append-only during a session and is saved verbatim.
//! Records carry descriptions instead of entity identities so they stay
//! meaningful after the entities they mention are evicted.

use crate::math::{Angle, Vector3};
use crate::time::GameDate;
use serde::{Deserialize, Serialize};

/// Something game-significant that happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A ship or submarine sank
    ShipSunk {
        /// Class description
        description: String,
        /// Tonnage (GRT)
        tonnage: u32,
    },
    /// An active sonar ping was emitted
    PingFired {
        /// Ping origin
        position: Vector3,
        /// Ping direction
        direction: Angle,
    },
    /// A message for the player arrived
    MessageReceived {
        /// Message text
        text: String,
    },
    /// A torpedo struck a hull
    TorpedoHit {
        /// Class description of the struck vessel
        target: String,
        /// Impact point
        position: Vector3,
    },
    /// A depth charge went off
    DepthChargeExploded {
        /// Explosion point
        position: Vector3,
    },
    /// A gun shell came down
    ShellImpact {
        /// Impact point
        position: Vector3,
        /// Whether it struck a hull
        hit: bool,
    },
    /// The player's vessel was destroyed
    PlayerKilled,
    /// The nearest contact moved out of range
    ContactLost,
}

/// Timestamped event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Simulation time of the event
    pub time: f64,
    /// What happened
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Append-only, insertion-ordered event list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Journal {
    events: Vec<Event>,
}

impl Journal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn push(&mut self, time: f64, kind: EventKind) {
        self.events.push(Event { time, kind });
    }

    /// Append a batch of events in order
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// All events in insertion order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events appended after the first `seen` ones
    ///
    /// UI layers poll with the count they already consumed.
    pub fn since(&self, seen: usize) -> &[Event] {
        self.events.get(seen..).unwrap_or(&[])
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if no event was recorded
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Logbook line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Date of the entry
    pub date: GameDate,
    /// Free text
    pub text: String,
}

/// Date-keyed free-text logbook of the player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Logbook {
    entries: Vec<LogEntry>,
}

impl Logbook {
    /// Create an empty logbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry dated at simulation time `time`
    pub fn add(&mut self, time: f64, text: impl Into<String>) {
        self.entries.push(LogEntry {
            date: GameDate::from_time(time),
            text: text.into(),
        });
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries written on the given calendar day
    pub fn on_day(&self, year: i32, month: u32, day: u32) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.date.year == year && e.date.month == month && e.date.day == day)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the logbook is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A sunk vessel for the patrol report and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    /// Date of sinking
    pub date: GameDate,
    /// Class description
    pub description: String,
    /// Catalog name of the class
    pub class_name: String,
    /// Tonnage (GRT)
    pub tonnage: u32,
}

/// Score of a patrol: total sunk tonnage
pub fn score(records: &[SinkRecord]) -> u64 {
    records.iter().map(|r| r.tonnage as u64).sum()
}

/// Player career data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Player name
    pub name: String,
    /// Flotilla number
    pub flotilla: u32,
    /// Boat identifier, e.g. `"U-552"`
    pub submarine_id: String,
    /// Photo identifier
    pub photo: String,
    /// Promotion dates, oldest first
    pub career: Vec<GameDate>,
}

impl Default for PlayerInfo {
    fn default() -> Self {
        PlayerInfo {
            name: "Heinz Mustermann".to_string(),
            flotilla: 7,
            submarine_id: "U-96".to_string(),
            photo: "photo1".to_string(),
            career: vec![GameDate::new(1937, 4, 1)],
        }
    }
}
