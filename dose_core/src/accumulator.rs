//! Per-bucket exposure time integration for one standard.

use crate::classifier::bucket_index;
use crate::{table, Decibels, ExposureTable, NoiseStandard, Seconds, StandardTable};

/// Accumulated exposure seconds for each threshold of one standard
///
/// Accumulation only grows; the only way back to zero is [`clear`](Self::clear).
#[derive(Clone, Debug, PartialEq)]
pub struct DoseAccumulator {
    table: &'static StandardTable,
    accumulated: Vec<Seconds>,
}

impl DoseAccumulator {
    pub fn new(standard: NoiseStandard) -> Self {
        let table = StandardTable::for_standard(standard);
        Self {
            table,
            accumulated: vec![0.0; table.thresholds.len()],
        }
    }

    pub fn standard(&self) -> NoiseStandard {
        self.table.standard
    }

    pub fn table(&self) -> &'static StandardTable {
        self.table
    }

    /// Credit `elapsed` seconds to the bucket `db` classifies to
    ///
    /// Returns the credited threshold. Readings with no corresponding limit
    /// change nothing. Negative or non-finite elapsed times are dropped so
    /// that accumulation never decreases.
    pub fn ingest(&mut self, db: Decibels, elapsed: Seconds) -> Option<Decibels> {
        let index = bucket_index(db, self.table)?;
        let level = self.table.thresholds[index];

        if !(elapsed.is_finite() && elapsed >= 0.0) {
            tracing::warn!(
                "Ignoring invalid elapsed time {}s for {}dB reading",
                elapsed,
                db
            );
            return Some(level);
        }

        self.accumulated[index] += elapsed;
        tracing::trace!(
            "{}: +{}s at {}dB (total {}s)",
            self.table.standard,
            elapsed,
            level,
            self.accumulated[index]
        );
        Some(level)
    }

    /// Accumulated seconds at an exact threshold level (0 for unknown levels)
    pub fn accumulated_at(&self, level: Decibels) -> Seconds {
        self.table
            .thresholds
            .iter()
            .position(|&t| t == level)
            .map(|i| self.accumulated[i])
            .unwrap_or(0.0)
    }

    /// Accumulated seconds in threshold order
    pub fn accumulated(&self) -> &[Seconds] {
        &self.accumulated
    }

    /// Total time credited to any bucket
    pub fn total_seconds(&self) -> Seconds {
        self.accumulated.iter().sum()
    }

    pub fn clear(&mut self) {
        self.accumulated.iter_mut().for_each(|s| *s = 0.0);
    }

    pub fn snapshot(&self) -> ExposureTable {
        table::snapshot(self.table, &self.accumulated)
    }
}
