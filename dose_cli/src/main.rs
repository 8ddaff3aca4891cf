use chrono::{DateTime, Utc};
use dose_core::measurements::{self, read_measurements, read_measurements_csv};
use dose_core::*;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "noisedose")]
#[command(about = "Noise exposure dose calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which threshold bucket a reading falls into
    Classify {
        /// Sound level in dB
        #[arg(allow_negative_numbers = true)]
        db: f64,

        /// Standard to classify against (niosh, osha, eu)
        #[arg(long)]
        standard: Option<String>,
    },

    /// Append a measurement to the log
    Record {
        /// Sound level in dB
        #[arg(allow_negative_numbers = true)]
        db: f64,

        /// Measurement time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Replay measurements and print the exposure table
    Report {
        /// Standard to evaluate against (niosh, osha, eu)
        #[arg(long)]
        standard: Option<String>,

        /// Output format (text, json, csv)
        #[arg(long)]
        format: Option<String>,

        /// Read measurements from a CSV file (timestamp,db) instead of the log
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print the permissible exposure table with no accumulated exposure
    Table {
        /// Standard to show (niosh, osha, eu)
        #[arg(long)]
        standard: Option<String>,

        /// Output format (text, json, csv)
        #[arg(long)]
        format: Option<String>,
    },

    /// Archive the measurement log and start over
    Reset {
        /// Delete archived logs as well
        #[arg(long)]
        cleanup: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    dose_core::logging::init_for_cli(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let mut config = if cli.config.is_some() {
        Config::load_from(&config_path)?
    } else {
        Config::load()?
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    match cli.command {
        Commands::Classify { db, standard } => cmd_classify(&config, db, standard.as_deref()),
        Commands::Record { db, at } => cmd_record(&config, db, at.as_deref()),
        Commands::Report {
            standard,
            format,
            input,
        } => cmd_report(
            &config,
            standard.as_deref(),
            format.as_deref(),
            input.as_deref(),
        ),
        Commands::Table { standard, format } => {
            cmd_table(&config, standard.as_deref(), format.as_deref())
        }
        Commands::Reset { cleanup } => cmd_reset(&config, cleanup),
        Commands::Config { write } => cmd_config(&config, &config_path, write),
    }
}

fn resolve_standard(config: &Config, standard: Option<&str>) -> Result<NoiseStandard> {
    match standard {
        Some(s) => s.parse(),
        None => Ok(config.engine.standard),
    }
}

fn resolve_format(config: &Config, format: Option<&str>) -> Result<ExportFormat> {
    match format {
        Some(f) => f.parse(),
        None => Ok(config.export.format),
    }
}

fn cmd_classify(config: &Config, db: f64, standard: Option<&str>) -> Result<()> {
    let standard = resolve_standard(config, standard)?;
    let table = StandardTable::for_standard(standard);

    match classify(db, table) {
        Some(level) => println!(
            "{}dB -> {} ({}): allowed {}",
            db,
            export::format_sound_level(level),
            standard,
            export::format_duration(allowed_duration(level, table))
        ),
        None => println!(
            "{}dB -> no corresponding limit ({} starts at {})",
            db,
            standard,
            export::format_sound_level(table.floor())
        ),
    }
    Ok(())
}

fn cmd_record(config: &Config, db: f64, at: Option<&str>) -> Result<()> {
    if !db.is_finite() {
        return Err(Error::Measurement(format!("Sound level must be finite, got {}", db)));
    }

    let timestamp = match at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::Measurement(format!("Invalid timestamp '{}': {}", s, e)))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let log_path = config.data.log_path();
    let mut sink = JsonlSink::new(&log_path);
    sink.append(&Measurement::new(timestamp, db))?;

    println!("✓ Recorded {}dB at {}", db, timestamp.to_rfc3339());
    Ok(())
}

fn cmd_report(
    config: &Config,
    standard: Option<&str>,
    format: Option<&str>,
    input: Option<&Path>,
) -> Result<()> {
    let standard = resolve_standard(config, standard)?;
    let format = resolve_format(config, format)?;

    let mut measurements = match input {
        Some(path) => read_measurements_csv(path)?,
        None => read_measurements(&config.data.log_path())?,
    };
    // Elapsed time comes from consecutive timestamps
    measurements.sort_by_key(|m| m.timestamp);

    let engine = DoseEngine::new(standard)?;
    let classified = engine.ingest_all(measurements.iter().copied());
    tracing::info!(
        "{} of {} measurements had a corresponding limit",
        classified,
        measurements.len()
    );

    print!("{}", with_trailing_newline(export::render(&engine.snapshot(), format)?));
    Ok(())
}

fn cmd_table(config: &Config, standard: Option<&str>, format: Option<&str>) -> Result<()> {
    let standard = resolve_standard(config, standard)?;
    let format = resolve_format(config, format)?;

    let engine = DoseEngine::new(config.engine.standard)?;
    let table = engine.get_permissible_exposure_duration_table(standard);
    print!("{}", with_trailing_newline(export::render(&table, format)?));
    Ok(())
}

fn cmd_reset(config: &Config, cleanup: bool) -> Result<()> {
    let log_path = config.data.log_path();

    match measurements::archive_log(&log_path)? {
        Some(archived) => println!("✓ Archived measurement log to {}", archived.display()),
        None => println!("No measurement log found - nothing to reset."),
    }

    if cleanup {
        let cleaned = measurements::cleanup_archived_logs(&config.data.data_dir)?;
        if cleaned > 0 {
            println!("✓ Removed {} archived logs", cleaned);
        }
    }
    Ok(())
}

fn cmd_config(config: &Config, config_path: &Path, write: bool) -> Result<()> {
    if write {
        config.save_to(config_path)?;
        println!("✓ Wrote {}", config_path.display());
    } else {
        print!("{}", config.to_toml_string()?);
    }
    Ok(())
}

fn with_trailing_newline(mut rendered: String) -> String {
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    rendered
}
