//! Raw measurement history.
//!
//! Measurements are appended to a JSONL (JSON Lines) file with file locking
//! so the recorder and a reporting process can share it. CSV files with a
//! `timestamp,db` header can be read as well.

use crate::{Error, Measurement, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Destination for recorded measurements
pub trait MeasurementSink {
    fn append(&mut self, measurement: &Measurement) -> Result<()>;
}

/// JSONL-based measurement sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl MeasurementSink for JsonlSink {
    fn append(&mut self, measurement: &Measurement) -> Result<()> {
        self.ensure_parent_dir()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        // A crash mid-append leaves a partial last line; start a fresh one
        let needs_newline = ends_without_newline(&mut file)?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(measurement)?;
        if needs_newline {
            writer.write_all(b"\n")?;
        }
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!(
            "Appended {}dB at {} to {:?}",
            measurement.db,
            measurement.timestamp,
            self.path
        );
        Ok(())
    }
}

fn ends_without_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read every measurement from a JSONL log
///
/// A missing log is empty. Lines that fail to parse are skipped with a
/// warning so one bad write does not hide the rest of the history.
pub fn read_measurements(path: &Path) -> Result<Vec<Measurement>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut measurements = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Measurement>(&line) {
            Ok(measurement) => measurements.push(measurement),
            Err(e) => {
                tracing::warn!("Failed to parse measurement at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} measurements from {:?}", measurements.len(), path);
    Ok(measurements)
}

/// CSV row format for imported measurements
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    db: f64,
}

impl TryFrom<CsvRow> for Measurement {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let timestamp = DateTime::parse_from_rfc3339(row.timestamp.trim())
            .map_err(|e| Error::Measurement(format!("Invalid timestamp '{}': {}", row.timestamp, e)))?
            .with_timezone(&Utc);
        Ok(Measurement::new(timestamp, row.db))
    }
}

/// Read measurements from a CSV file with a `timestamp,db` header
///
/// Unlike the JSONL log this is user-provided input, so the first bad row
/// is reported as an error with its row number.
pub fn read_measurements_csv(path: &Path) -> Result<Vec<Measurement>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut measurements = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let measurement = Measurement::try_from(row?)
            .map_err(|e| Error::Measurement(format!("row {}: {}", index + 1, e)))?;
        measurements.push(measurement);
    }

    tracing::debug!("Read {} measurements from CSV {:?}", measurements.len(), path);
    Ok(measurements)
}

/// Move the log aside so the next recording starts fresh
///
/// The log is renamed to `*.processed` rather than deleted so it can still
/// be inspected. Returns the archive path, or `None` when there was no log.
pub fn archive_log(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "measurements.jsonl".into());
    let archived = path.with_file_name(format!("{}.{}.processed", file_name, stamp));

    std::fs::rename(path, &archived)?;
    tracing::info!("Archived measurement log to {:?}", archived);
    Ok(Some(archived))
}

/// Remove archived logs from a directory
pub fn cleanup_archived_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed archived log: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} archived measurement logs", count);
    }

    Ok(count)
}
