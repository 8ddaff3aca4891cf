//! Per-standard exposure parameters and threshold tables.
//!
//! The built-in tables are constructed once and shared; [`validate_builtin_tables`]
//! is run by the engine constructor so a bad table stops the engine before
//! any dose is computed.

use crate::{Decibels, Error, NoiseStandard, Result, Seconds};
use once_cell::sync::Lazy;

/// Criterion duration shared by all built-in standards: 8 hours
pub const CRITERION_DURATION_SECONDS: Seconds = 8.0 * 3600.0;

/// Exposure parameters of a single standard
#[derive(Clone, Debug, PartialEq)]
pub struct StandardTable {
    pub standard: NoiseStandard,
    /// Level at which the allowed duration equals `criterion_duration`
    pub criterion_level: Decibels,
    /// Level increase that halves the allowed duration
    pub exchange_rate: Decibels,
    pub criterion_duration: Seconds,
    /// Bucket boundaries, strictly ascending
    pub thresholds: Vec<Decibels>,
}

static NIOSH: Lazy<StandardTable> = Lazy::new(|| StandardTable {
    standard: NoiseStandard::Niosh,
    criterion_level: 85.0,
    exchange_rate: 3.0,
    criterion_duration: CRITERION_DURATION_SECONDS,
    thresholds: stepped(85, 115, 3),
});

static OSHA: Lazy<StandardTable> = Lazy::new(|| StandardTable {
    standard: NoiseStandard::Osha,
    criterion_level: 90.0,
    exchange_rate: 5.0,
    criterion_duration: CRITERION_DURATION_SECONDS,
    thresholds: stepped(90, 115, 5),
});

static EU: Lazy<StandardTable> = Lazy::new(|| StandardTable {
    standard: NoiseStandard::Eu,
    criterion_level: 87.0,
    exchange_rate: 3.0,
    criterion_duration: CRITERION_DURATION_SECONDS,
    thresholds: stepped(87, 114, 3),
});

fn stepped(first: u16, last: u16, step: usize) -> Vec<Decibels> {
    (first..=last).step_by(step).map(Decibels::from).collect()
}

impl StandardTable {
    /// Built-in table for a standard
    pub fn for_standard(standard: NoiseStandard) -> &'static StandardTable {
        match standard {
            NoiseStandard::Niosh => &NIOSH,
            NoiseStandard::Osha => &OSHA,
            NoiseStandard::Eu => &EU,
        }
    }

    /// Build a custom parameter set, rejecting anything that would produce
    /// meaningless doses
    pub fn new(
        standard: NoiseStandard,
        criterion_level: Decibels,
        exchange_rate: Decibels,
        criterion_duration: Seconds,
        thresholds: Vec<Decibels>,
    ) -> Result<Self> {
        let table = Self {
            standard,
            criterion_level,
            exchange_rate,
            criterion_duration,
            thresholds,
        };
        table.validate()?;
        Ok(table)
    }

    /// Check the table invariants
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidStandard {
            standard: self.standard.to_string(),
            reason,
        };

        let first = *self
            .thresholds
            .first()
            .ok_or_else(|| invalid("threshold list is empty".into()))?;

        if let Some(bad) = self.thresholds.iter().find(|t| !t.is_finite()) {
            return Err(invalid(format!("threshold {} is not finite", bad)));
        }

        if let Some(pair) = self.thresholds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(invalid(format!(
                "thresholds must be strictly ascending, found {} then {}",
                pair[0], pair[1]
            )));
        }

        if !(self.exchange_rate.is_finite() && self.exchange_rate > 0.0) {
            return Err(invalid(format!(
                "exchange rate must be positive, got {}",
                self.exchange_rate
            )));
        }

        if !(self.criterion_duration.is_finite() && self.criterion_duration > 0.0) {
            return Err(invalid(format!(
                "criterion duration must be positive, got {}",
                self.criterion_duration
            )));
        }

        if self.criterion_level != first {
            return Err(invalid(format!(
                "criterion level {} does not match first threshold {}",
                self.criterion_level, first
            )));
        }

        Ok(())
    }

    /// Lowest threshold; readings below it have no corresponding limit
    pub fn floor(&self) -> Decibels {
        self.thresholds[0]
    }

    /// Highest threshold; readings above it are clamped to it
    pub fn ceiling(&self) -> Decibels {
        self.thresholds[self.thresholds.len() - 1]
    }
}

/// Validate every built-in table
pub fn validate_builtin_tables() -> Result<()> {
    for standard in NoiseStandard::ALL {
        let table = StandardTable::for_standard(standard);
        table.validate()?;
        tracing::debug!(
            "Validated {} table: {} thresholds from {}dB to {}dB",
            standard,
            table.thresholds.len(),
            table.floor(),
            table.ceiling()
        );
    }
    Ok(())
}
