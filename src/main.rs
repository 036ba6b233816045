//! turbine-insight - Wind Farm SCADA Investigation
//!
//! Classifies every 10-minute interval of every turbine and checks wind
//! sensors against their neighbours.
//!
//! # Usage
//!
//! ```bash
//! # Classify a SCADA export, writing the states to CSV
//! turbine-insight classify --data scada.csv --layout layout.csv --output states.csv
//!
//! # Check one anemometer against its adjacent turbines and metmasts
//! turbine-insight sensor-check --data scada.csv --layout layout.csv --target WTG_004
//!
//! # Availability report for one turbine
//! turbine-insight report --data scada.csv --layout layout.csv --station WTG_004
//! ```
//!
//! # Environment Variables
//!
//! - `TURBINE_INSIGHT_CONFIG`: Path to farm_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use turbine_insight::acquisition::{load_layout_csv, parse_timestamp};
use turbine_insight::config::{self, validation, FarmConfig};
use turbine_insight::types::ClassifiedRecord;
use turbine_insight::{AnalysisSession, ReferenceId, TimeRange};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "turbine-insight")]
#[command(about = "Wind farm operational state classification and wind sensor integrity analysis")]
#[command(version)]
struct CliArgs {
    /// Farm configuration TOML (default: ./farm_config.toml, then built-in defaults)
    #[arg(long, global = true, value_name = "PATH", env = "TURBINE_INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Args, Debug)]
struct DataArgs {
    /// SCADA export (CSV, 10-minute rows)
    #[arg(long, value_name = "CSV")]
    data: PathBuf,

    /// Turbine/metmast coordinates (CSV)
    #[arg(long, value_name = "CSV")]
    layout: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Classify every row into an operational state
    Classify {
        #[command(flatten)]
        input: DataArgs,
        /// Only this station
        #[arg(long)]
        station: Option<String>,
        /// Write the classified rows as CSV (default: summary only)
        #[arg(long, value_name = "CSV")]
        output: Option<PathBuf>,
    },

    /// Show the adjacent turbines and metmasts of every turbine
    Adjacency {
        #[arg(long, value_name = "CSV")]
        layout: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare a turbine's wind sensor with its references
    SensorCheck {
        #[command(flatten)]
        input: DataArgs,
        /// Turbine under investigation
        #[arg(long)]
        target: String,
        /// Reference turbine (e.g. WTG_002) or metmast (met:38); repeatable.
        /// Defaults to the adjacent turbines and metmasts.
        #[arg(long = "reference", value_name = "ID")]
        references: Vec<String>,
        /// Start of the window (inclusive)
        #[arg(long, value_name = "TIMESTAMP")]
        from: Option<String>,
        /// End of the window (inclusive)
        #[arg(long, value_name = "TIMESTAMP")]
        to: Option<String>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Availability report, farm-wide or for one station
    Report {
        #[command(flatten)]
        input: DataArgs,
        #[arg(long)]
        station: Option<String>,
    },

    /// Validate a farm_config.toml and print the effective values
    CheckConfig {
        /// Config file (default: the normal search order)
        path: Option<PathBuf>,
    },
}

// ============================================================================
// Commands
// ============================================================================

fn open_session(input: &DataArgs) -> Result<AnalysisSession> {
    AnalysisSession::load(&input.data, input.layout.as_deref(), config::get().clone())
        .with_context(|| format!("Failed to load SCADA data from {}", input.data.display()))
}

fn run_classify(input: &DataArgs, station: Option<&str>, output: Option<&Path>) -> Result<()> {
    let session = open_session(input)?;
    let classified = match station {
        Some(id) => session.classify_station(id),
        None => session.classify(),
    };
    if classified.is_empty() {
        bail!("No rows to classify");
    }

    if let Some(path) = output {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for row in &classified {
            writer.serialize(ClassifiedRecord::from(row))?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = classified.len(), "Classified rows written");
    }

    let summary = turbine_insight::AvailabilitySummary::from_rows(&classified);
    println!("Rows:                 {}", summary.total_rows);
    println!("Data missing:         {}", summary.data_missing_rows);
    println!("Availability:         {:.1}%", summary.availability_pct);
    println!("Unexplained loss:     {:.1}%", summary.unexplained_loss_pct);
    println!();
    for (reason, count) in &summary.reason_distribution {
        println!("  {:<45} {:>6}  [{}]", reason.display_name(), count, reason.state().short_code());
    }
    Ok(())
}

fn run_adjacency(layout_path: &Path, json: bool) -> Result<()> {
    let layout = load_layout_csv(layout_path)
        .with_context(|| format!("Failed to load layout from {}", layout_path.display()))?;
    let map = turbine_insight::resolve_adjacency(Some(&layout), [], &config::get().adjacency);

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    for entry in map.values() {
        let refs: Vec<String> = entry
            .references
            .iter()
            .map(|r| format!("{} ({:.0} m)", r.id(), r.distance_m))
            .collect();
        let shown = if refs.is_empty() { "-".to_string() } else { refs.join(", ") };
        println!("{:<12} {}", entry.source_id, shown);
    }
    Ok(())
}

fn parse_bound(raw: Option<&str>, flag: &str) -> Result<Option<chrono::NaiveDateTime>> {
    raw.map(|s| parse_timestamp(s).with_context(|| format!("Invalid {flag} timestamp '{s}'")))
        .transpose()
}

fn run_sensor_check(
    input: &DataArgs,
    target: &str,
    references: &[String],
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let session = open_session(input)?;
    if !session.dataset().has_station(target) {
        bail!("Station '{target}' not found in {}", input.data.display());
    }

    let references = if references.is_empty() {
        None
    } else {
        let parsed = references
            .iter()
            .map(|r| r.parse::<ReferenceId>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?;
        Some(parsed)
    };

    let bounds = session.dataset().time_bounds();
    let start = parse_bound(from, "--from")?;
    let end = parse_bound(to, "--to")?;
    let time_range = match (start, end, bounds) {
        (None, None, _) => None,
        (s, e, Some((first, last))) => Some(TimeRange::new(s.unwrap_or(first), e.unwrap_or(last))),
        (_, _, None) => None,
    };

    let report = session.analyze_sensor(target, references, time_range);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.references.is_empty() {
        warn!(target, "No references available, every sample is insufficient");
    }

    let s = &report.summary;
    let refs: Vec<String> = report.references.iter().map(ToString::to_string).collect();
    println!("Target:               {}", report.target_id);
    println!("References:           {}", if refs.is_empty() { "-".to_string() } else { refs.join(", ") });
    println!("Aggregator:           {}", report.aggregator);
    println!("Samples:              {} ({} evaluated, {} insufficient, {} target missing)",
        s.sample_count, s.evaluated_count, s.insufficient_reference_count, s.target_missing_count);
    println!("Anomalies:            {} (low {}, moderate {}, high {})",
        s.anomaly_count, s.low_count, s.moderate_count, s.high_count);
    if let Some(rate) = s.anomaly_rate_pct() {
        println!("Anomaly rate:         {rate:.1}%");
    }
    if let (Some(bias), Some(mad)) = (s.mean_deviation, s.mean_absolute_deviation) {
        println!("Mean deviation:       {bias:+.2} m/s (mean abs {mad:.2} m/s)");
    }
    if let Some(max) = s.max_absolute_deviation {
        println!("Max abs deviation:    {max:.2} m/s");
    }
    if let Some(sd) = s.deviation_std_dev {
        println!("Deviation std dev:    {sd:.2} m/s");
    }
    println!("Direction flags:      {}", s.direction_flag_count);
    Ok(())
}

fn run_report(input: &DataArgs, station: Option<&str>) -> Result<()> {
    let session = open_session(input)?;
    if let Some(id) = station {
        let report = session
            .report(id)
            .with_context(|| format!("Station '{id}' not found"))?;
        print!("{report}");
        return Ok(());
    }

    println!(
        "{:<12} {:<38} {:>9} {:>9} {:>9} {:>7}",
        "Station", "Current state", "Power kW", "Avail %", "Unexpl %", "Rows"
    );
    for row in session.overview() {
        println!(
            "{:<12} {:<38} {:>9} {:>9.1} {:>9.1} {:>7}",
            row.station_id,
            row.current_state.display_name(),
            row.current_power_kw.map_or_else(|| "-".to_string(), |p| format!("{p:.1}")),
            row.availability_pct,
            row.unexplained_loss_pct,
            row.total_rows
        );
    }
    Ok(())
}

fn run_check_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))?;
            for w in validation::validate_unknown_keys(&raw) {
                println!("warning: {w}");
            }
            FarmConfig::load_from_file(p)?
        }
        None => FarmConfig::load(),
    };

    let (errors, warnings) = validation::validate_physical_ranges(&config);
    for w in &warnings {
        println!("warning: {w}");
    }
    if !errors.is_empty() {
        for e in &errors {
            println!("error: {e}");
        }
        bail!("{} configuration error(s)", errors.len());
    }

    println!("{}", config.to_toml()?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    if let SubCommand::CheckConfig { path } = &args.command {
        return run_check_config(path.as_deref().or(args.config.as_deref()));
    }

    // Load farm configuration
    let farm_config = match &args.config {
        Some(path) => FarmConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FarmConfig::load(),
    };
    info!(
        farm = if farm_config.farm.name.is_empty() { "unset" } else { farm_config.farm.name.as_str() },
        cut_in = farm_config.thresholds.wind.cut_in_wind_speed,
        aggregator = %farm_config.analysis.aggregator,
        "Farm config ready"
    );
    config::init(farm_config);

    match &args.command {
        SubCommand::Classify { input, station, output } => {
            run_classify(input, station.as_deref(), output.as_deref())
        }
        SubCommand::Adjacency { layout, json } => run_adjacency(layout, *json),
        SubCommand::SensorCheck {
            input,
            target,
            references,
            from,
            to,
            json,
        } => run_sensor_check(input, target, references, from.as_deref(), to.as_deref(), *json),
        SubCommand::Report { input, station } => run_report(input, station.as_deref()),
        SubCommand::CheckConfig { .. } => Ok(()),
    }
}
