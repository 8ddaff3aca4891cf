//! Floor quantization of readings onto a standard's threshold buckets.

use crate::{Decibels, StandardTable};

/// Index of the bucket a reading falls into
///
/// Greatest threshold not exceeding `db`; anything above the top threshold
/// lands in the top bucket. `None` when the reading is below the lowest
/// threshold or is NaN.
pub fn bucket_index(db: Decibels, table: &StandardTable) -> Option<usize> {
    // Number of thresholds <= db. NaN compares false and yields 0.
    let at_or_below = table.thresholds.partition_point(|&t| t <= db);
    at_or_below.checked_sub(1)
}

/// Threshold level a reading classifies to, or `None` for "no
/// corresponding limit"
pub fn classify(db: Decibels, table: &StandardTable) -> Option<Decibels> {
    bucket_index(db, table).map(|i| table.thresholds[i])
}
