//! Criterion benchmarks for u-lineup model assembly.
//!
//! Uses synthetic rosters on the standard dual meet program to measure
//! formulation cost independent of the MIP backend.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_lineup::lineup::{LineupModel, MeetConfig};
use u_lineup::meet::{Column, Meet, OpponentLineup, RawPerformance, ScenarioSet};

/// Rough base times (seconds) per column label prefix.
fn base_time(label: &str) -> f64 {
    match label.split(' ').next().unwrap_or(label) {
        "50F" => 21.0,
        "100F" | "100FL" | "100BS" => 48.0,
        "100BR" => 56.0,
        "200F" | "200FL" | "200BS" | "200IM" => 110.0,
        "200BR" => 125.0,
        "500F" => 290.0,
        "1000F" => 600.0,
        "200FR" => 21.5,
        "200MR" => 25.0,
        _ => 60.0,
    }
}

fn synthetic_raw(meet: &Meet, athletes: usize, rng: &mut StdRng) -> RawPerformance {
    let mut raw = RawPerformance::new();
    for i in 0..athletes {
        let name = format!("athlete{i}");
        for &column in meet.columns() {
            // roughly two thirds of the table is known
            if rng.random_range(0..3) == 0 && i > 0 {
                continue;
            }
            let base = base_time(&meet.column_label(column));
            raw.record(&name, column, base * rng.random_range(1.0..1.15));
        }
    }
    raw
}

fn synthetic_scenarios(meet: &Meet, count: usize, rng: &mut StdRng) -> ScenarioSet {
    let lineups = (0..count)
        .map(|_| {
            meet.event_ids().fold(OpponentLineup::new(), |lineup, event| {
                let column = meet
                    .columns_of(event)
                    .next()
                    .unwrap_or(Column::Individual(event));
                let legs = if meet.event(event).is_relay() { 4.0 } else { 1.0 };
                let base = base_time(&meet.column_label(column)) * legs;
                let times = (0..3).map(|_| base * rng.random_range(0.98..1.12)).collect();
                lineup.with_times(event, times)
            })
        })
        .collect();
    let probabilities = vec![1.0 / count as f64; count];
    ScenarioSet::new(lineups, probabilities).expect("uniform probabilities")
}

fn bench_build(c: &mut Criterion) {
    let meet = Meet::dual_meet();
    let config = MeetConfig::default();
    let mut group = c.benchmark_group("lineup_build");

    for &(athletes, scenarios) in &[(16usize, 1usize), (24, 2), (32, 4)] {
        let mut rng = StdRng::seed_from_u64(42);
        let raw = synthetic_raw(&meet, athletes, &mut rng);
        let set = synthetic_scenarios(&meet, scenarios, &mut rng);

        group.bench_with_input(
            BenchmarkId::new("dual_meet", format!("{athletes}x{scenarios}")),
            &(raw, set),
            |b, (raw, set)| {
                b.iter(|| {
                    let model = LineupModel::prepare(&meet, raw, set, &config).expect("valid");
                    black_box(model.model().constraint_count())
                })
            },
        );
    }
    group.finish();
}

fn bench_write_lp(c: &mut Criterion) {
    let meet = Meet::dual_meet();
    let mut rng = StdRng::seed_from_u64(7);
    let raw = synthetic_raw(&meet, 24, &mut rng);
    let set = synthetic_scenarios(&meet, 2, &mut rng);
    let model = LineupModel::prepare(&meet, &raw, &set, &MeetConfig::default()).expect("valid");

    c.bench_function("lineup_write_lp", |b| {
        b.iter(|| {
            let mut out = String::new();
            model.model().write_lp(&mut out).expect("write to string");
            black_box(out.len())
        })
    });
}

criterion_group!(benches, bench_build, bench_write_lp);
criterion_main!(benches);
