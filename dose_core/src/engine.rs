//! The dose engine: one value owning every accumulator.
//!
//! ## Switching policy
//!
//! Each standard has its own accumulator. Measurements are credited to the
//! active standard only; switching standards leaves every accumulator as it
//! is, and switching back resumes where that standard left off. Nothing is
//! reset or re-mapped on a switch.
//!
//! ## Concurrency
//!
//! All state sits behind a single `RwLock`. `ingest`, `set_standard` and
//! `clear` take the write lock; snapshots take the read lock, so a reader
//! never sees half of a measurement or half of a switch.

use crate::accumulator::DoseAccumulator;
use crate::config::EngineConfig;
use crate::{
    classifier, standard, Decibels, ExposureTable, Measurement, NoiseStandard, Result, Seconds,
    StandardTable,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct EngineState {
    active: NoiseStandard,
    accumulators: BTreeMap<NoiseStandard, DoseAccumulator>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl EngineState {
    fn accumulator_mut(&mut self, standard: NoiseStandard) -> &mut DoseAccumulator {
        self.accumulators
            .entry(standard)
            .or_insert_with(|| DoseAccumulator::new(standard))
    }

    fn snapshot(&self, standard: NoiseStandard) -> ExposureTable {
        match self.accumulators.get(&standard) {
            Some(acc) => acc.snapshot(),
            None => DoseAccumulator::new(standard).snapshot(),
        }
    }
}

/// Noise exposure dose engine
///
/// `Send + Sync`; share it behind an `Arc` between the sampling loop and
/// any readers.
#[derive(Debug)]
pub struct DoseEngine {
    state: RwLock<EngineState>,
}

impl DoseEngine {
    /// Create an engine with `standard` active
    ///
    /// Fails if any built-in standard table is invalid.
    pub fn new(standard: NoiseStandard) -> Result<Self> {
        standard::validate_builtin_tables()?;

        let accumulators = NoiseStandard::ALL
            .into_iter()
            .map(|s| (s, DoseAccumulator::new(s)))
            .collect();

        tracing::info!("Dose engine started with {} active", standard);

        Ok(Self {
            state: RwLock::new(EngineState {
                active: standard,
                accumulators,
                last_timestamp: None,
            }),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.standard)
    }

    // Every mutation is a single float add, so state behind a poisoned lock
    // is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn active_standard(&self) -> NoiseStandard {
        self.read().active
    }

    /// Make `standard` the target of later measurements and snapshots
    pub fn set_standard(&self, standard: NoiseStandard) {
        let mut state = self.write();
        if state.active == standard {
            return;
        }
        tracing::info!("Switching standard from {} to {}", state.active, standard);
        state.active = standard;
    }

    /// Feed one timestamped measurement
    ///
    /// The time since the previous measurement is credited to the bucket
    /// this reading classifies to. The first measurement only sets the
    /// timing reference; a measurement older than the previous one credits
    /// nothing.
    pub fn ingest(&self, measurement: Measurement) -> Option<Decibels> {
        let mut state = self.write();

        let elapsed = match state.last_timestamp {
            None => 0.0,
            Some(previous) if measurement.timestamp < previous => {
                tracing::warn!(
                    "Measurement at {} is older than previous at {}; crediting no time",
                    measurement.timestamp,
                    previous
                );
                0.0
            }
            Some(previous) => seconds_between(previous, measurement.timestamp),
        };

        if state
            .last_timestamp
            .map_or(true, |previous| measurement.timestamp > previous)
        {
            state.last_timestamp = Some(measurement.timestamp);
        }

        let active = state.active;
        state.accumulator_mut(active).ingest(measurement.db, elapsed)
    }

    /// Replay a sequence of measurements in order
    ///
    /// Returns how many readings classified to a bucket.
    pub fn ingest_all<I>(&self, measurements: I) -> usize
    where
        I: IntoIterator<Item = Measurement>,
    {
        let mut classified = 0;
        let mut total = 0;
        for measurement in measurements {
            total += 1;
            if self.ingest(measurement).is_some() {
                classified += 1;
            }
        }
        tracing::debug!("Replayed {} measurements, {} classified", total, classified);
        classified
    }

    /// Feed a reading with a caller-supplied elapsed time
    pub fn ingest_elapsed(&self, db: Decibels, elapsed: Seconds) -> Option<Decibels> {
        let mut state = self.write();
        let active = state.active;
        state.accumulator_mut(active).ingest(db, elapsed)
    }

    /// Classify a reading under any standard without touching accumulators
    pub fn classify(&self, db: Decibels, standard: NoiseStandard) -> Option<Decibels> {
        classifier::classify(db, StandardTable::for_standard(standard))
    }

    /// Exposure table of the active standard
    pub fn snapshot(&self) -> ExposureTable {
        let state = self.read();
        state.snapshot(state.active)
    }

    /// Exposure table of any standard, without switching to it
    pub fn get_permissible_exposure_duration_table(
        &self,
        standard: NoiseStandard,
    ) -> ExposureTable {
        self.read().snapshot(standard)
    }

    /// Reset every accumulator and forget the timing reference
    pub fn clear(&self) {
        let mut state = self.write();
        state.accumulators.values_mut().for_each(DoseAccumulator::clear);
        state.last_timestamp = None;
        tracing::info!("Cleared accumulated exposure for all standards");
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Seconds {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
