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
//! Tick scheduler with parallel integration support
//!
//! One tick runs in a fixed order on the coordinating thread:
//!
//! 1. the world builds a read-only [`TickContext`] snapshot
//! 2. simulatable entities are split into disjoint partitions and
//!    integrated, in parallel when a worker pool is configured
//! 3. the world runs its serial phases: collisions, explosion and sinking
//!    effects, spawn and eviction, run state, journal
//!
//! Tick N completes before tick N+1 starts. Cancellation is observed only
//! between ticks.
//!
//! # Partitioning
//!
//! Entities are distributed round-robin: item `i` goes to partition
//! `i % n`. Every entity lands in exactly one partition and no entity is
//! reachable from two workers, so integration needs no locks.

use crate::config::SimConfig;
use crate::ecs::system::{integrate_checked, Simulatable, TickContext};
use crate::ecs::Entity;
use crate::error::{ConfigError, SimError};
use crate::integration::validate_timestep;
use crate::world::World;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use rayon::ThreadPool;

/// Upper bound on the ticks a single [`Scheduler::simulate`] call may run
pub const MAX_TICKS_PER_CALL: usize = 1_000_000;

/// Split `items` into `n` stride partitions (`i % n`)
///
/// `n == 0` is treated as one partition. The union of the partitions is
/// exactly `items`, each item once.
///
/// # Examples
///
/// ```
/// use naval_sim::ecs::scheduler::partition;
///
/// let parts = partition((0..7).collect::<Vec<_>>(), 3);
/// assert_eq!(parts, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
/// ```
pub fn partition<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let mut parts: Vec<Vec<T>> = (0..n).map(|_| Vec::with_capacity(items.len() / n + 1)).collect();
    for (i, item) in items.into_iter().enumerate() {
        parts[i % n].push(item);
    }
    parts
}

/// Shared flag that aborts a running [`Scheduler::simulate`] at the next
/// tick boundary
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Outcome of integrating one or more partitions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartitionReport {
    /// Entities whose new state was committed
    pub integrated: usize,
    /// Entities whose new state was rejected as non-finite
    pub rejected: usize,
    /// Distance from the player to the nearest live contact
    pub nearest_contact: Option<f64>,
}

impl PartitionReport {
    /// Combine two reports; the result does not depend on merge order
    pub fn merge(self, other: PartitionReport) -> PartitionReport {
        let nearest_contact = match (self.nearest_contact, other.nearest_contact) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        PartitionReport {
            integrated: self.integrated + other.integrated,
            rejected: self.rejected + other.rejected,
            nearest_contact,
        }
    }
}

/// Summary of one [`Scheduler::simulate`] call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Ticks executed
    pub ticks: usize,
    /// Game seconds advanced
    pub elapsed: f64,
    /// Integrations committed, summed over ticks
    pub integrated: usize,
    /// Integrations rejected, summed over ticks
    pub rejected: usize,
    /// Collisions resolved, summed over ticks
    pub collisions: usize,
    /// Entities evicted, summed over ticks
    pub evicted: usize,
    /// Journal events appended, summed over ticks
    pub events: usize,
}

/// Result of the serial phases of one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct SerialReport {
    pub collisions: usize,
    pub evicted: usize,
    pub events: usize,
}

fn integrate_partition(items: Vec<(Entity, &mut dyn Simulatable)>, ctx: &TickContext) -> PartitionReport {
    let mut report = PartitionReport::default();
    for (entity, item) in items {
        if integrate_checked(entity, item, ctx) {
            report.integrated += 1;
        } else if !item.body().is_defunct() {
            report.rejected += 1;
        }
        if Some(entity) == ctx.player || !item.is_contact() || !item.is_alive() {
            continue;
        }
        if let Some(player) = ctx.player_position {
            let d = item.body().position.xy().distance(player.xy());
            report.nearest_contact = Some(report.nearest_contact.map_or(d, |n| n.min(d)));
        }
    }
    report
}

/// Drives a [`World`] forward in time
///
/// # Examples
///
/// ```
/// use naval_sim::config::SimConfig;
/// use naval_sim::ecs::scheduler::Scheduler;
/// use naval_sim::world::World;
///
/// let config = SimConfig::default().with_workers(1);
/// let mut world = World::new(config.clone()).unwrap();
/// let scheduler = Scheduler::new(&config).unwrap();
/// let report = scheduler.simulate(&mut world, 0.25).unwrap();
/// assert_eq!(report.ticks, 3);
/// ```
pub struct Scheduler {
    workers: usize,
    cancel: CancelToken,
    #[cfg(feature = "parallel")]
    pool: Option<ThreadPool>,
}

impl Scheduler {
    /// Create a scheduler with the worker count from `config`
    ///
    /// One worker (or a failed pool build) integrates on the calling thread.
    pub fn new(config: &SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if let Err(warning) = validate_timestep(config.max_substep) {
            log::warn!("{}", warning);
        }
        let workers = config.effective_workers();
        log::debug!("scheduler using {} integration workers", workers);
        Ok(Scheduler {
            workers,
            cancel: CancelToken::new(),
            #[cfg(feature = "parallel")]
            pool: build_pool(workers),
        })
    }

    /// Number of partitions per tick
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Check if integration runs on a worker pool
    pub fn is_parallel(&self) -> bool {
        #[cfg(feature = "parallel")]
        {
            self.pool.is_some()
        }
        #[cfg(not(feature = "parallel"))]
        {
            false
        }
    }

    /// Token that aborts [`simulate`](Self::simulate) between ticks
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Advance the world by `delta` wall seconds
    ///
    /// The delta is scaled by the world's time compression and split into
    /// ticks no longer than `max_substep`. Due jobs run once afterwards.
    ///
    /// # Errors
    ///
    /// - [`SimError::Frozen`] if the world is frozen; nothing advances
    /// - [`SimError::Aborted`] if the cancel token was set; ticks already
    ///   run stay applied
    /// - [`SimError::Rejected`] for a negative or non-finite delta, or one
    ///   needing more than [`MAX_TICKS_PER_CALL`] ticks
    pub fn simulate(&self, world: &mut World, delta: f64) -> Result<TickReport, SimError> {
        if world.is_frozen() {
            return Err(SimError::Frozen);
        }
        if !(delta >= 0.0 && delta.is_finite()) {
            return Err(SimError::Rejected(format!("invalid delta {}", delta)));
        }

        let total = delta * world.config().time_compression;
        let max_substep = world.config().max_substep;
        let ticks = (total / max_substep).ceil();
        if ticks > MAX_TICKS_PER_CALL as f64 {
            return Err(SimError::Rejected(format!(
                "delta {} needs {} ticks, more than {}",
                delta, ticks, MAX_TICKS_PER_CALL
            )));
        }
        let ticks = ticks as usize;
        let mut report = TickReport::default();
        if ticks == 0 {
            return Ok(report);
        }
        let dt = total / ticks as f64;

        for _ in 0..ticks {
            if self.cancel.is_cancelled() {
                log::info!("simulation aborted after {} ticks", report.ticks);
                return Err(SimError::Aborted);
            }
            let (partition_report, serial) = self.tick(world, dt);
            report.ticks += 1;
            report.elapsed += dt;
            report.integrated += partition_report.integrated;
            report.rejected += partition_report.rejected;
            report.collisions += serial.collisions;
            report.evicted += serial.evicted;
            report.events += serial.events;
        }

        world.run_due_jobs();
        Ok(report)
    }

    fn tick(&self, world: &mut World, dt: f64) -> (PartitionReport, SerialReport) {
        let ctx = world.begin_tick(dt);
        let gameplay = world.run_state().is_running();
        let items = world.registry_mut().simulatables(gameplay);
        let parts = partition(items, self.workers);
        let report = self.integrate(parts, &ctx);
        let serial = world.finish_tick(&ctx, report.nearest_contact);
        (report, serial)
    }

    #[cfg(feature = "parallel")]
    fn integrate(&self, parts: Vec<Vec<(Entity, &mut dyn Simulatable)>>, ctx: &TickContext) -> PartitionReport {
        match &self.pool {
            Some(pool) => pool.install(|| {
                parts
                    .into_par_iter()
                    .map(|part| integrate_partition(part, ctx))
                    .reduce(PartitionReport::default, PartitionReport::merge)
            }),
            None => integrate_sequential(parts, ctx),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn integrate(&self, parts: Vec<Vec<(Entity, &mut dyn Simulatable)>>, ctx: &TickContext) -> PartitionReport {
        integrate_sequential(parts, ctx)
    }
}

fn integrate_sequential(parts: Vec<Vec<(Entity, &mut dyn Simulatable)>>, ctx: &TickContext) -> PartitionReport {
    parts
        .into_iter()
        .map(|part| integrate_partition(part, ctx))
        .fold(PartitionReport::default(), PartitionReport::merge)
}

#[cfg(feature = "parallel")]
fn build_pool(workers: usize) -> Option<ThreadPool> {
    if workers <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("failed to build worker pool, integrating sequentially: {}", e);
            None
        }
    }
}
