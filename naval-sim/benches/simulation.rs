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
//! Benchmarks for the tick scheduler
//!
//! These benchmarks measure:
//! - Tick throughput of a convoy battle for 1 to N integration workers
//! - Cost of a full save/load cycle for the same world

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use naval_sim::config::{GroupSize, ScenarioConfig, SimConfig};
use naval_sim::ecs::scheduler::Scheduler;
use naval_sim::persistence::{load, save};
use naval_sim::scenario::create_custom_mission;
use naval_sim::world::World;

fn battle(workers: usize, size: GroupSize) -> (World, Scheduler) {
    let config = SimConfig::default().with_workers(workers);
    let scenario = ScenarioConfig {
        convoy_size: size,
        escort_size: size,
        ..ScenarioConfig::default()
    };
    let world = create_custom_mission(&scenario, config.clone()).unwrap();
    let scheduler = Scheduler::new(&config).unwrap();
    (world, scheduler)
}

fn bench_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate_workers");
    let max_workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8);

    let mut workers = 1;
    while workers <= max_workers {
        let (mut world, scheduler) = battle(workers, GroupSize::Large);
        group.throughput(Throughput::Elements(world.registry().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, _| {
            b.iter(|| {
                let report = scheduler.simulate(&mut world, black_box(1.0)).unwrap();
                black_box(report.ticks);
            });
        });
        workers *= 2;
    }
    group.finish();
}

fn bench_group_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate_group_size");
    for (name, size) in [
        ("small", GroupSize::Small),
        ("medium", GroupSize::Medium),
        ("large", GroupSize::Large),
    ] {
        let (mut world, scheduler) = battle(1, size);
        group.throughput(Throughput::Elements(world.registry().len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| scheduler.simulate(&mut world, black_box(0.1)).unwrap());
        });
    }
    group.finish();
}

fn bench_save_load(c: &mut Criterion) {
    let (world, _) = battle(1, GroupSize::Large);
    let config = world.config().clone();
    c.bench_function("save_load_large_convoy", |b| {
        b.iter(|| {
            let text = save(black_box(&world), "bench").unwrap();
            let loaded = load(&text, config.clone()).unwrap();
            black_box(loaded.registry().len());
        });
    });
}

criterion_group!(benches, bench_workers, bench_group_size, bench_save_load);
criterion_main!(benches);
