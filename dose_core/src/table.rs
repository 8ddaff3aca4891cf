//! Projection of accumulated exposure into a full exposure table.

use crate::duration::allowed_duration;
use crate::{ExposureBucket, ExposureTable, Seconds, StandardTable};

/// Build the exposure table for `table` from per-threshold accumulated seconds
///
/// Every threshold gets a bucket, used or not. Positions missing from
/// `accumulated` count as 0. The total is the sum of the bucket doses and
/// nothing else.
pub fn snapshot(table: &StandardTable, accumulated: &[Seconds]) -> ExposureTable {
    let buckets: Vec<ExposureBucket> = table
        .thresholds
        .iter()
        .enumerate()
        .map(|(i, &level)| {
            let allowed = allowed_duration(level, table);
            let spent = accumulated.get(i).copied().unwrap_or(0.0);
            ExposureBucket {
                sound_level: level,
                allowed_duration: allowed,
                accumulated_duration: spent,
                current_level_dose: spent / allowed * 100.0,
            }
        })
        .collect();

    let total_dose: f64 = buckets.iter().map(|b| b.current_level_dose).sum();

    ExposureTable {
        standard: table.standard,
        buckets,
        total_dose,
    }
}
