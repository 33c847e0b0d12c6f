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
//! Simulation time, calendar dates and the injected wall clock
//!
//! Simulation time is a count of seconds since 1939-01-01 00:00 UTC.
//! Wall-clock time only matters for freeze compensation: while the world is
//! frozen (menus, loading) the elapsed wall time must not turn into a huge
//! simulation delta afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

const fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

const EPOCH_DAYS: i64 = days_from_civil(1939, 1, 1);

/// Calendar date and time of day
///
/// # Examples
///
/// ```
/// use naval_sim::time::GameDate;
///
/// let date = GameDate::new(1939, 1, 2).with_time(6, 30, 0);
/// assert_eq!(date.to_time(), 86_400.0 + 6.5 * 3600.0);
/// assert_eq!(GameDate::from_time(date.to_time()), date);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameDate {
    /// Year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// Day of month, 1-31
    pub day: u32,
    /// Hour, 0-23
    pub hour: u32,
    /// Minute, 0-59
    pub minute: u32,
    /// Second, 0-59
    pub second: u32,
}

impl GameDate {
    /// Midnight of the given day
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        GameDate {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    /// Same day at the given time
    pub fn with_time(mut self, hour: u32, minute: u32, second: u32) -> Self {
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self
    }

    /// Date of a simulation time (fractional seconds are dropped)
    pub fn from_time(time: f64) -> Self {
        let total = time.floor() as i64;
        let days = total.div_euclid(86_400);
        let secs = total.rem_euclid(86_400) as u32;
        let (year, month, day) = civil_from_days(EPOCH_DAYS + days);
        GameDate {
            year: year as i32,
            month,
            day,
            hour: secs / 3600,
            minute: (secs / 60) % 60,
            second: secs % 60,
        }
    }

    /// Simulation time of this date
    pub fn to_time(&self) -> f64 {
        let days = days_from_civil(self.year as i64, self.month as i64, self.day as i64) - EPOCH_DAYS;
        days as f64 * SECONDS_PER_DAY
            + (self.hour * 3600 + self.minute * 60 + self.second) as f64
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Fraction of the day elapsed at `time`, in `[0, 1)`
pub fn day_fraction(time: f64) -> f64 {
    time.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_DAY
}

/// Source of wall-clock milliseconds
pub trait Clock: Send + Sync {
    /// Monotonic milliseconds since an arbitrary origin
    fn now_ms(&self) -> u64;
}

/// Monotonic clock backed by [`Instant`]
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock with its origin at the current instant
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock advanced by hand, for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `start_ms`
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Advance the clock
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Pause bookkeeping
///
/// Wall time spent frozen accumulates until the frame loop collects it with
/// [`FreezeTimer::take_frozen_ms`] and subtracts it from its next delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeTimer {
    frozen_since: Option<u64>,
    accumulated: u64,
}

impl FreezeTimer {
    /// Check if time is currently frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen_since.is_some()
    }

    /// Start a freeze at `now_ms`; nested freezes are ignored
    pub fn freeze(&mut self, now_ms: u64) {
        if self.frozen_since.is_none() {
            self.frozen_since = Some(now_ms);
        }
    }

    /// End a freeze at `now_ms`
    pub fn unfreeze(&mut self, now_ms: u64) {
        if let Some(start) = self.frozen_since.take() {
            self.accumulated += now_ms.saturating_sub(start);
        }
    }

    /// Collect and reset the accumulated frozen milliseconds
    pub fn take_frozen_ms(&mut self) -> u64 {
        std::mem::take(&mut self.accumulated)
    }
}

/// Frame delta source that excludes frozen wall time
#[derive(Debug, Clone, Copy)]
pub struct FrameTimer {
    last_ms: u64,
}

impl FrameTimer {
    /// Start measuring at `now_ms`
    pub fn new(now_ms: u64) -> Self {
        FrameTimer { last_ms: now_ms }
    }

    /// Seconds since the previous call minus `frozen_ms`
    pub fn next_delta(&mut self, now_ms: u64, frozen_ms: u64) -> f64 {
        let elapsed = now_ms.saturating_sub(self.last_ms).saturating_sub(frozen_ms);
        self.last_ms = now_ms;
        elapsed as f64 / 1000.0
    }
}
