use std::sync::Arc;

use anyhow::Result;
use arrow::{
  array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray, TimestampMicrosecondArray},
  datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// 2019-04-01T00:00:00Z in microseconds.
pub const PICKUP_START_MICROS: i64 = 1_554_076_800_000_000;
/// 2019-08-01T00:00:00Z in microseconds.
pub const PICKUP_END_MICROS: i64 = 1_564_617_600_000_000;
/// 2019-06-30T00:00:00Z in microseconds, the cutoff of every filter experiment.
pub const PICKUP_CUTOFF_MICROS: i64 = 1_561_852_800_000_000;

pub const PICKUP_COLUMN: &str = "pickup_at";
pub const AMOUNT_COLUMN: &str = "total_amount";

pub fn sales_schema() -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new("A", DataType::Int64, false),
    Field::new("B", DataType::Float64, false),
    Field::new("C", DataType::Utf8, false),
  ]))
}

pub fn trips_schema() -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new("vendor_id", DataType::Int64, false),
    Field::new(
      PICKUP_COLUMN,
      DataType::Timestamp(TimeUnit::Microsecond, None),
      false,
    ),
    Field::new(AMOUNT_COLUMN, DataType::Float64, false),
  ]))
}

/// Sales-like records: `A` an integer in `[0, 1000)`, `B` a uniform float in
/// `[0, 1)`, `C` one of `X`, `Y`, `Z`.
pub fn gen_sales(rows: usize, seed: u64) -> Result<RecordBatch> {
  let mut rng = SmallRng::seed_from_u64(seed);
  let categories = ["X", "Y", "Z"];

  let a: Int64Array = (0..rows).map(|_| rng.gen_range(0..1000i64)).collect();
  let b: Float64Array = (0..rows).map(|_| rng.gen::<f64>()).collect();
  let c: StringArray = (0..rows)
    .map(|_| Some(categories[rng.gen_range(0..categories.len())]))
    .collect();

  let columns: Vec<ArrayRef> = vec![Arc::new(a), Arc::new(b), Arc::new(c)];
  Ok(RecordBatch::try_new(sales_schema(), columns)?)
}

/// Taxi-trip-like records with pickup times spread over April to July 2019.
///
/// Pickup times are sorted so that row-group statistics on `pickup_at` are
/// selective, which is what makes zone-map pruning measurable.
pub fn gen_trips(rows: usize, seed: u64) -> Result<RecordBatch> {
  let mut rng = SmallRng::seed_from_u64(seed);

  let mut pickups: Vec<i64> = (0..rows)
    .map(|_| rng.gen_range(PICKUP_START_MICROS..PICKUP_END_MICROS))
    .collect();
  pickups.sort_unstable();

  let vendors: Int64Array = (0..rows).map(|_| rng.gen_range(1..=2i64)).collect();
  let amounts: Float64Array = (0..rows)
    .map(|_| {
      let z: f64 = StandardNormal.sample(&mut rng);
      (18.0 + 12.0 * z).max(0.0)
    })
    .collect();

  let columns: Vec<ArrayRef> = vec![
    Arc::new(vendors),
    Arc::new(TimestampMicrosecondArray::from(pickups)),
    Arc::new(amounts),
  ];
  Ok(RecordBatch::try_new(trips_schema(), columns)?)
}

pub fn row_count(batches: &[RecordBatch]) -> usize {
  batches.iter().map(RecordBatch::num_rows).sum()
}

#[cfg(test)]
mod tests {
  use arrow::array::AsArray;
  use arrow::datatypes::TimestampMicrosecondType;

  use super::*;

  #[test]
  fn test_gen_sales_shape() {
    let batch = gen_sales(1000, 7).unwrap();
    assert_eq!(batch.num_rows(), 1000);
    assert_eq!(batch.schema(), sales_schema());

    let categories = batch.column(2).as_string::<i32>();
    assert!(categories.iter().flatten().all(|c| ["X", "Y", "Z"].contains(&c)));
  }

  #[test]
  fn test_gen_trips_sorted_and_in_range() {
    let batch = gen_trips(5000, 11).unwrap();
    let pickups = batch.column(1).as_primitive::<TimestampMicrosecondType>();
    let values = pickups.values();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert!(values
      .iter()
      .all(|v| (PICKUP_START_MICROS..PICKUP_END_MICROS).contains(v)));
    // About a quarter of the range lies past the cutoff.
    let after = values.iter().filter(|v| **v > PICKUP_CUTOFF_MICROS).count();
    assert!((1000..2000).contains(&after), "after = {after}");
  }

  #[test]
  fn test_generation_is_deterministic() {
    assert_eq!(gen_trips(100, 3).unwrap(), gen_trips(100, 3).unwrap());
  }
}
