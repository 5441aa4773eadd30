//! Statistically sampled counterpart of the filter suite: the same trips file
//! scanned by every engine under every pushdown strategy, with criterion
//! doing the timing instead of the mean-of-N harness.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use engine_speed_eval::{
  io::{write_parquet, DEFAULT_ROW_GROUP_SIZE},
  scan::{scan, Engine, Predicate, Pushdown, ScanConfig},
  util::{gen_trips, AMOUNT_COLUMN, PICKUP_COLUMN, PICKUP_CUTOFF_MICROS},
};

fn bench_scan(criterion: &mut Criterion) {
  let dir = tempfile::tempdir().unwrap();
  let input_file = dir.path().join("trips.parquet");
  write_parquet(&[gen_trips(1_000_000, 42).unwrap()], &input_file, DEFAULT_ROW_GROUP_SIZE).unwrap();

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .unwrap();

  let strategies = [
    ("Full Scan", Pushdown::NONE),
    ("Projection Pushdown", Pushdown::PROJECTION),
    ("Filter Pushdown", Pushdown::FILTER),
    ("Filter And Projection Pushdown", Pushdown::ALL),
  ];

  for engine in [Engine::Eager, Engine::Streaming] {
    let mut group = criterion.benchmark_group(format!("Scan {}", engine.name()));
    for (name, pushdown) in strategies {
      let config = ScanConfig::new(engine)
        .pushdown(pushdown)
        .project([PICKUP_COLUMN, AMOUNT_COLUMN])
        .filter(Predicate::after(PICKUP_COLUMN, PICKUP_CUTOFF_MICROS));
      group.bench_function(BenchmarkId::new(name, 0), |b| {
        b.iter(|| scan(&input_file, &config, &runtime).unwrap())
      });
    }
    group.finish();
  }
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
