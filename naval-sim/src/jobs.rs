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
//! Periodic jobs
//!
//! A job is a callback with a period in game seconds. Due jobs run on the
//! coordinating thread after the ticks of a
//! [`Scheduler::simulate`](crate::ecs::scheduler::Scheduler::simulate)
//! call, at most once per call; missed periods are skipped, not replayed.

use crate::error::SimError;
use crate::world::World;
use std::time::{Duration, Instant};

/// Wall time after which a job run is reported as slow
pub const SLOW_JOB: Duration = Duration::from_millis(50);

/// A periodic callback
pub trait Job: Send {
    /// Game seconds between runs
    fn period(&self) -> f64;

    /// Run the job
    fn run(&mut self, world: &mut World);

    /// Name used in log messages
    fn name(&self) -> &str {
        "job"
    }
}

/// Handle of a registered job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

struct Scheduled {
    id: JobId,
    job: Box<dyn Job>,
    next_due: f64,
}

/// Registered jobs of a world
#[derive(Default)]
pub struct JobList {
    entries: Vec<Scheduled>,
    next_id: u64,
    running: bool,
    detached: Vec<JobId>,
    removed: Vec<JobId>,
}

impl JobList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job`; its first run is one period after `now`
    pub fn register(&mut self, job: Box<dyn Job>, now: f64) -> Result<JobId, SimError> {
        let period = job.period();
        if !(period > 0.0 && period.is_finite()) {
            return Err(SimError::Rejected(format!("job period {} must be positive", period)));
        }
        let id = JobId(self.next_id);
        self.next_id += 1;
        log::debug!("registered {} every {} s", job.name(), period);
        self.entries.push(Scheduled {
            id,
            job,
            next_due: now + period,
        });
        Ok(id)
    }

    /// Remove a job; returns false if it was not registered
    pub fn unregister(&mut self, id: JobId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() != before {
            return true;
        }
        // the entries are detached while jobs run
        if self.running && self.detached.contains(&id) && !self.removed.contains(&id) {
            self.removed.push(id);
            return true;
        }
        false
    }

    /// Number of registered jobs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no job is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// First due time after `now` on the grid `due + k * period`
///
/// A period too small to advance `now` makes the job due on every call.
fn next_due_after(due: f64, period: f64, now: f64) -> f64 {
    if !(period > 0.0 && period.is_finite()) {
        return now;
    }
    let skipped = ((now - due) / period).floor().max(0.0) + 1.0;
    let next = due + skipped * period;
    if next > now {
        next
    } else {
        now + period
    }
}

/// Run every job of `world` that is due at the current time
///
/// Returns the number of jobs that ran.
pub(crate) fn run_due(world: &mut World) -> usize {
    let now = world.time();
    let jobs = world.jobs_mut();
    let mut entries = std::mem::take(&mut jobs.entries);
    jobs.detached = entries.iter().map(|e| e.id).collect();
    jobs.running = true;
    let mut ran = 0;
    for entry in &mut entries {
        if now < entry.next_due {
            continue;
        }
        let start = Instant::now();
        entry.job.run(world);
        let elapsed = start.elapsed();
        if elapsed > SLOW_JOB {
            log::warn!("{} took {:?}, longer than {:?}", entry.job.name(), elapsed, SLOW_JOB);
        }
        entry.next_due = next_due_after(entry.next_due, entry.job.period(), now);
        ran += 1;
    }

    let jobs = world.jobs_mut();
    jobs.running = false;
    jobs.detached.clear();
    let added = std::mem::replace(&mut jobs.entries, entries);
    jobs.entries.extend(added);
    let removed = std::mem::take(&mut jobs.removed);
    jobs.entries.retain(|e| !removed.contains(&e.id));
    ran
}
