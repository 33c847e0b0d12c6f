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
//! Weather, daylight and visibility

use crate::math::Vector2;
use crate::time::day_fraction;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Weather state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// Clear sky
    Sunny,
    /// Overcast
    #[default]
    Clouded,
    /// Rain showers
    Raining,
    /// Storm with heavy sea
    Storm,
}

impl Weather {
    /// Daylight visibility limit (m)
    pub fn daylight_view_distance(&self) -> f64 {
        match self {
            Weather::Sunny => 30_000.0,
            Weather::Clouded => 20_000.0,
            Weather::Raining => 10_000.0,
            Weather::Storm => 5_000.0,
        }
    }

    /// Additional ambient sea noise (dB)
    pub fn sea_noise(&self) -> f64 {
        match self {
            Weather::Sunny => 0.0,
            Weather::Clouded => 2.0,
            Weather::Raining => 5.0,
            Weather::Storm => 12.0,
        }
    }

    /// Typical wind speed (m/s)
    pub fn wind_speed(&self) -> f64 {
        match self {
            Weather::Sunny => 3.0,
            Weather::Clouded => 6.0,
            Weather::Raining => 10.0,
            Weather::Storm => 20.0,
        }
    }
}

/// Environmental state of the world
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Environment {
    /// Current weather
    pub weather: Weather,
    /// Wind vector (m/s, direction the air moves to)
    pub wind: Vector2,
}

impl Environment {
    /// Environment with a wind typical for `weather`, blowing towards `wind_heading`
    pub fn new(weather: Weather, wind_heading: crate::math::Angle) -> Self {
        Environment {
            weather,
            wind: wind_heading.direction() * weather.wind_speed(),
        }
    }

    /// Maximum view distance at `time` (m)
    ///
    /// Night visibility is a fifth of daylight visibility, with a smooth
    /// transition during dawn and dusk.
    pub fn max_view_distance(&self, time: f64) -> f64 {
        self.weather.daylight_view_distance() * (0.2 + 0.8 * daylight(time))
    }
}

/// Daylight factor in `[0, 1]` from the hour of day
pub fn daylight(time: f64) -> f64 {
    let sun_elevation = -(2.0 * PI * day_fraction(time)).cos();
    ((sun_elevation + 0.1) / 0.3).clamp(0.0, 1.0)
}

/// Check if it is daytime
pub fn is_day_mode(time: f64) -> bool {
    daylight(time) >= 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::GameDate;

    fn at(hour: u32) -> f64 {
        GameDate::new(1941, 6, 1).with_time(hour, 0, 0).to_time()
    }

    #[test]
    fn test_day_mode() {
        assert!(is_day_mode(at(12)));
        assert!(!is_day_mode(at(0)));
        assert!(!is_day_mode(at(2)));
        assert!(is_day_mode(at(9)));
    }

    #[test]
    fn test_view_distance() {
        let env = Environment::new(Weather::Sunny, crate::math::Angle::new(90.0));
        assert_eq!(env.max_view_distance(at(12)), 30_000.0);
        assert!((env.max_view_distance(at(0)) - 6_000.0).abs() < 1e-9);
        let storm = Environment::new(Weather::Storm, crate::math::Angle::new(0.0));
        assert!(storm.max_view_distance(at(12)) < env.max_view_distance(at(12)));
    }

    #[test]
    fn test_wind_direction() {
        let env = Environment::new(Weather::Raining, crate::math::Angle::new(90.0));
        assert!((env.wind.x - 10.0).abs() < 1e-9);
        assert!(env.wind.y.abs() < 1e-9);
    }
}
