#![forbid(unsafe_code)]

//! Noise exposure dose engine.
//!
//! This crate provides:
//! - Regulatory standard tables (NIOSH, OSHA, EU)
//! - Floor classification of dB readings onto threshold buckets
//! - Exchange-rate allowed durations and per-bucket dose accumulation
//! - Exposure table snapshots and their text/JSON/CSV renderings
//! - A JSONL measurement log

pub mod types;
pub mod error;
pub mod standard;
pub mod classifier;
pub mod duration;
pub mod accumulator;
pub mod table;
pub mod engine;
pub mod config;
pub mod logging;
pub mod measurements;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use standard::StandardTable;
pub use classifier::classify;
pub use duration::allowed_duration;
pub use accumulator::DoseAccumulator;
pub use engine::DoseEngine;
pub use config::Config;
pub use measurements::{JsonlSink, MeasurementSink};
pub use export::ExportFormat;
