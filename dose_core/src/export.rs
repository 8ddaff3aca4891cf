//! Text, JSON and CSV renderings of an exposure table.
//!
//! Everything here works on an [`ExposureTable`] and rounds for display only.
//! Every rendering has the same four columns and ends with a `totalDose`
//! summary.

use crate::{Decibels, Error, ExposureTable, Result, Seconds};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Output format for exposure tables
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::Config(format!(
                "Unknown export format '{}' (expected text, json or csv)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Text => "text",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

pub const TOTAL_DOSE_LABEL: &str = "totalDose";

const HEADERS: [&str; 4] = [
    "soundLevel",
    "allowedDuration",
    "accumulatedDuration",
    "currentLevelDose",
];

/// "85dB"
pub fn format_sound_level(level: Decibels) -> String {
    format!("{}dB", level.round() as i64)
}

/// Human-readable duration: hours from 3600s, minutes from 60s, else seconds
pub fn format_duration(seconds: Seconds) -> String {
    if seconds >= 3600.0 {
        format!("{}h", (seconds / 3600.0).round() as i64)
    } else if seconds >= 60.0 {
        format!("{}min", (seconds / 60.0).round() as i64)
    } else {
        format!("{}s", seconds.round() as i64)
    }
}

/// Whole seconds for the accumulated column
pub fn format_accumulated(seconds: Seconds) -> u64 {
    seconds.max(0.0).round() as u64
}

/// "20.0%"
pub fn format_dose(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// One formatted table row
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub sound_level: String,
    pub allowed_duration: String,
    pub accumulated_duration: u64,
    pub current_level_dose: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    standard: crate::NoiseStandard,
    rows: &'a [ExportRow],
    total_dose: String,
}

/// Formatted rows in threshold order
pub fn rows(table: &ExposureTable) -> Vec<ExportRow> {
    table
        .buckets
        .iter()
        .map(|b| ExportRow {
            sound_level: format_sound_level(b.sound_level),
            allowed_duration: format_duration(b.allowed_duration),
            accumulated_duration: format_accumulated(b.accumulated_duration),
            current_level_dose: format_dose(b.current_level_dose),
        })
        .collect()
}

/// Render a table in the requested format
pub fn render(table: &ExposureTable, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Text => Ok(render_text(table)),
        ExportFormat::Json => render_json(table),
        ExportFormat::Csv => {
            let mut buf = Vec::new();
            write_csv(table, &mut buf)?;
            String::from_utf8(buf).map_err(|e| Error::Other(format!("CSV is not UTF-8: {}", e)))
        }
    }
}

fn render_text(table: &ExposureTable) -> String {
    let rows = rows(table);
    let mut out = format!("{} permissible exposure\n", table.standard);
    out.push_str(&format!(
        "{:<12}{:<17}{:<21}{}\n",
        HEADERS[0], HEADERS[1], HEADERS[2], HEADERS[3]
    ));
    for row in &rows {
        out.push_str(&format!(
            "{:<12}{:<17}{:<21}{}\n",
            row.sound_level, row.allowed_duration, row.accumulated_duration, row.current_level_dose
        ));
    }
    out.push_str(&format!(
        "{}: {}\n",
        TOTAL_DOSE_LABEL,
        format_dose(table.total_dose)
    ));
    out
}

fn render_json(table: &ExposureTable) -> Result<String> {
    let rows = rows(table);
    let export = JsonExport {
        standard: table.standard,
        rows: &rows,
        total_dose: format_dose(table.total_dose),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Write the table as CSV with a header and a trailing `totalDose` row
pub fn write_csv<W: Write>(table: &ExposureTable, writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for row in rows(table) {
        writer.serialize(row)?;
    }

    let total = format_dose(table.total_dose);
    writer.write_record([TOTAL_DOSE_LABEL, "", "", total.as_str()])?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{table, NoiseStandard, StandardTable};

    fn sample_table() -> ExposureTable {
        let niosh = StandardTable::for_standard(NoiseStandard::Niosh);
        table::snapshot(niosh, &[1800.0, 2700.0, 1200.0, 720.0, 360.0, 180.0])
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(28_800.0), "8h");
        assert_eq!(format_duration(3_600.0), "1h");
        assert_eq!(format_duration(1_800.0), "30min");
        assert_eq!(format_duration(900.0), "15min");
        assert_eq!(format_duration(450.0), "8min");
        assert_eq!(format_duration(225.0), "4min");
        assert_eq!(format_duration(60.0), "1min");
        assert_eq!(format_duration(56.25), "56s");
        assert_eq!(format_duration(28.125), "28s");
    }

    #[test]
    fn test_format_columns() {
        assert_eq!(format_sound_level(85.0), "85dB");
        assert_eq!(format_accumulated(299.6), 300);
        assert_eq!(format_dose(20.0), "20.0%");
        assert_eq!(format_dose(16.666_666), "16.7%");
    }

    #[test]
    fn test_rows_cover_every_bucket() {
        let rows = rows(&sample_table());
        assert_eq!(rows.len(), 11);
        assert_eq!(
            rows[3],
            ExportRow {
                sound_level: "94dB".into(),
                allowed_duration: "1h".into(),
                accumulated_duration: 720,
                current_level_dose: "20.0%".into(),
            }
        );
        assert_eq!(rows[10].current_level_dose, "0.0%");
    }

    #[test]
    fn test_csv_has_header_rows_and_total() {
        let csv = render(&sample_table(), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "soundLevel,allowedDuration,accumulatedDuration,currentLevelDose"
        );
        assert!(lines[1].starts_with("85dB,8h,1800,"), "{}", lines[1]);
        assert_eq!(lines[4], "94dB,1h,720,20.0%");
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[12], "totalDose,,,101.7%");
    }

    #[test]
    fn test_json_export_shape() {
        let json = render(&sample_table(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["standard"], "niosh");
        assert_eq!(value["rows"].as_array().unwrap().len(), 11);
        assert_eq!(value["rows"][2]["soundLevel"], "91dB");
        assert_eq!(value["rows"][2]["allowedDuration"], "2h");
        assert_eq!(value["rows"][2]["accumulatedDuration"], 1200);
        assert_eq!(value["totalDose"], "101.7%");
    }

    #[test]
    fn test_text_export_ends_with_total() {
        let text = render(&sample_table(), ExportFormat::Text).unwrap();
        assert!(text.starts_with("NIOSH permissible exposure"));
        assert!(text.contains("115dB"));
        assert!(text.trim_end().ends_with("totalDose: 101.7%"));
    }

    #[test]
    fn test_empty_table_still_has_total() {
        let osha = StandardTable::for_standard(NoiseStandard::Osha);
        let csv = render(&table::snapshot(osha, &[]), ExportFormat::Csv).unwrap();
        assert!(csv.trim_end().ends_with("totalDose,,,0.0%"));
    }

    #[test]
    fn test_parse_export_format() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
