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
//! Simulation and scenario configuration
//!
//! [`SimConfig`] holds the engine tuning shared by every session,
//! [`ScenarioConfig`] describes a custom mission. Both are validated before
//! a world is built; an invalid configuration never produces a world.

use crate::environment::Weather;
use crate::error::ConfigError;
use crate::journal::PlayerInfo;
use crate::time::GameDate;
use std::env;

/// Environment variable overriding [`SimConfig::workers`]
pub const WORKERS_ENV: &str = "NAVAL_SIM_WORKERS";

/// Seconds between trail samples
pub const TRAIL_TIME: f64 = 1.0;

/// Engine tuning parameters
///
/// # Examples
///
/// ```
/// use naval_sim::config::SimConfig;
///
/// let config = SimConfig::default()
///     .with_workers(2)
///     .with_time_compression(4.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Integration workers; 0 selects one per available core
    pub workers: usize,
    /// Longest timestep a single tick may take (s)
    pub max_substep: f64,
    /// Seconds between trail samples
    pub trail_interval: f64,
    /// Trail samples kept per hull
    pub trail_length: usize,
    /// Game seconds per wall-clock second
    pub time_compression: f64,
    /// Nearest-contact distance beyond which contact is lost (m)
    pub contact_lost_distance: f64,
    /// Radar detection range (m)
    pub radar_range: f64,
    /// Active sonar range (m)
    pub asdic_range: f64,
    /// Active sonar cone half-angle (degrees)
    pub asdic_angle: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            workers: 0,
            max_substep: 0.1,
            trail_interval: TRAIL_TIME,
            trail_length: 256,
            time_compression: 1.0,
            contact_lost_distance: 30_000.0,
            radar_range: 10_000.0,
            asdic_range: 1_500.0,
            asdic_angle: 15.0,
        }
    }
}

impl SimConfig {
    /// Default configuration with [`WORKERS_ENV`] applied
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = SimConfig::default();
        if let Ok(value) = env::var(WORKERS_ENV) {
            config.workers = parse_workers(&value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the maximum substep
    pub fn with_max_substep(mut self, max_substep: f64) -> Self {
        self.max_substep = max_substep;
        self
    }

    /// Set the trail interval and length
    pub fn with_trail(mut self, interval: f64, length: usize) -> Self {
        self.trail_interval = interval;
        self.trail_length = length;
        self
    }

    /// Set the time compression factor
    pub fn with_time_compression(mut self, factor: f64) -> Self {
        self.time_compression = factor;
        self
    }

    /// Set the contact-lost distance
    pub fn with_contact_lost_distance(mut self, distance: f64) -> Self {
        self.contact_lost_distance = distance;
        self
    }

    /// Worker count with 0 resolved to the available parallelism
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount(self.workers));
        }
        if !(self.max_substep > 0.0 && self.max_substep.is_finite()) {
            return Err(ConfigError::InvalidTimestep(self.max_substep));
        }
        if !(self.time_compression >= 1.0 && self.time_compression.is_finite()) {
            return Err(ConfigError::InvalidTimeCompression(self.time_compression));
        }
        let positive = [
            ("trail interval", self.trail_interval),
            ("contact-lost distance", self.contact_lost_distance),
            ("radar range", self.radar_range),
            ("ASDIC range", self.asdic_range),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if !(self.asdic_angle > 0.0 && self.asdic_angle <= 180.0) {
            return Err(ConfigError::InvalidParameter {
                name: "ASDIC angle",
                value: self.asdic_angle,
            });
        }
        Ok(())
    }
}

const MAX_WORKERS: usize = 256;

fn parse_workers(value: &str) -> Result<usize, ConfigError> {
    let workers = value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidEnvironment {
            var: WORKERS_ENV,
            value: value.to_string(),
        })?;
    if workers > MAX_WORKERS {
        return Err(ConfigError::InvalidWorkerCount(workers));
    }
    Ok(workers)
}

/// Number of ships in a convoy or escort group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupSize {
    /// No ships
    None,
    /// A handful of ships
    #[default]
    Small,
    /// A typical group
    Medium,
    /// A large group
    Large,
}

impl GroupSize {
    /// Merchants for a convoy of this size
    pub fn merchants(&self) -> usize {
        match self {
            GroupSize::None => 0,
            GroupSize::Small => 4,
            GroupSize::Medium => 8,
            GroupSize::Large => 16,
        }
    }

    /// Escorts for an escort group of this size
    pub fn escorts(&self) -> usize {
        match self {
            GroupSize::None => 0,
            GroupSize::Small => 2,
            GroupSize::Medium => 4,
            GroupSize::Large => 8,
        }
    }
}

/// Custom mission parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    /// Submarine type name, e.g. `"typeVIIc"`
    pub submarine_type: String,
    /// Convoy size
    pub convoy_size: GroupSize,
    /// Escort group size
    pub escort_size: GroupSize,
    /// Time of day index: 0 night, 1 dawn, 2 day, 3 dusk
    pub time_of_day: u32,
    /// Mission date
    pub date: GameDate,
    /// Weather at mission start
    pub weather: Weather,
    /// Seed for placement randomness
    pub seed: u64,
    /// Player career data
    pub player: PlayerInfo,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            submarine_type: "typeVIIc".to_string(),
            convoy_size: GroupSize::Small,
            escort_size: GroupSize::Small,
            time_of_day: 2,
            date: GameDate::new(1941, 5, 1),
            weather: Weather::Clouded,
            seed: 1939,
            player: PlayerInfo::default(),
        }
    }
}

impl ScenarioConfig {
    /// Hour of day for the configured time of day index
    pub fn start_hour(&self) -> Result<u32, ConfigError> {
        match self.time_of_day {
            0 => Ok(1),
            1 => Ok(6),
            2 => Ok(12),
            3 => Ok(19),
            other => Err(ConfigError::TimeOfDayOutOfRange(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            SimConfig::default().with_max_substep(0.0).validate(),
            Err(ConfigError::InvalidTimestep(0.0))
        );
        assert_eq!(
            SimConfig::default().with_time_compression(0.5).validate(),
            Err(ConfigError::InvalidTimeCompression(0.5))
        );
        assert_eq!(
            SimConfig::default().with_workers(10_000).validate(),
            Err(ConfigError::InvalidWorkerCount(10_000))
        );
        let mut config = SimConfig::default();
        config.radar_range = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "radar range", .. })
        ));
    }

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers(" 4 "), Ok(4));
        assert_eq!(parse_workers("0"), Ok(0));
        assert!(matches!(
            parse_workers("many"),
            Err(ConfigError::InvalidEnvironment { .. })
        ));
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(SimConfig::default().with_workers(3).effective_workers(), 3);
        assert!(SimConfig::default().effective_workers() >= 1);
    }

    #[test]
    fn test_start_hour() {
        let mut scenario = ScenarioConfig::default();
        assert_eq!(scenario.start_hour(), Ok(12));
        scenario.time_of_day = 4;
        assert_eq!(scenario.start_hour(), Err(ConfigError::TimeOfDayOutOfRange(4)));
    }

    #[test]
    fn test_group_sizes() {
        assert_eq!(GroupSize::None.merchants(), 0);
        assert!(GroupSize::Large.escorts() > GroupSize::Small.escorts());
    }
}
