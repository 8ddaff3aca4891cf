//! Core domain types for the noise dose engine.
//!
//! - Regulatory standards
//! - Measurements fed into the engine
//! - Exposure buckets and tables produced from accumulated state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sound pressure level in decibels.
pub type Decibels = f64;

/// Durations inside the engine are plain seconds so that dose math never
/// goes through a rounding integer type.
pub type Seconds = f64;

// ============================================================================
// Standards
// ============================================================================

/// Regulatory noise exposure standard
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum NoiseStandard {
    #[default]
    Niosh,
    Osha,
    Eu,
}

impl NoiseStandard {
    /// Every supported standard, in display order
    pub const ALL: [NoiseStandard; 3] = [NoiseStandard::Niosh, NoiseStandard::Osha, NoiseStandard::Eu];

    /// Short uppercase label used in tables and logs
    pub fn label(self) -> &'static str {
        match self {
            NoiseStandard::Niosh => "NIOSH",
            NoiseStandard::Osha => "OSHA",
            NoiseStandard::Eu => "EU",
        }
    }
}

impl fmt::Display for NoiseStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NoiseStandard {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "niosh" => Ok(NoiseStandard::Niosh),
            "osha" => Ok(NoiseStandard::Osha),
            "eu" => Ok(NoiseStandard::Eu),
            other => Err(crate::Error::Config(format!(
                "Unknown standard '{}' (expected niosh, osha or eu)",
                other
            ))),
        }
    }
}

// ============================================================================
// Measurements
// ============================================================================

/// One sound level reading from the upstream level meter
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub db: Decibels,
}

impl Measurement {
    pub fn new(timestamp: DateTime<Utc>, db: Decibels) -> Self {
        Self { timestamp, db }
    }
}

// ============================================================================
// Exposure table
// ============================================================================

/// Exposure state of one threshold level
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExposureBucket {
    pub sound_level: Decibels,
    pub allowed_duration: Seconds,
    pub accumulated_duration: Seconds,
    /// Percent of the permissible exposure used at this level
    pub current_level_dose: f64,
}

/// Snapshot of every bucket of one standard plus the combined dose
///
/// Rebuilt from accumulator state on every request and never stored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExposureTable {
    pub standard: NoiseStandard,
    pub buckets: Vec<ExposureBucket>,
    pub total_dose: f64,
}

impl ExposureTable {
    /// Bucket for an exact threshold level, if the standard has one
    pub fn bucket(&self, sound_level: Decibels) -> Option<&ExposureBucket> {
        self.buckets.iter().find(|b| b.sound_level == sound_level)
    }

    /// True once the combined dose reaches the permissible limit
    pub fn limit_reached(&self) -> bool {
        self.total_dose >= 100.0
    }
}
