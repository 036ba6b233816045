//! Synthetic Wind Farm SCADA Generator
//!
//! Writes a 10-minute SCADA export and a matching layout for a small farm so
//! the classifier and sensor checks can be exercised end to end. The farm
//! sees:
//! - A shared wind field with a diurnal cycle and calm spells
//! - Alarm stops with pipe-separated alarm text
//! - Grid-operator and OEM (code 2006) curtailment
//! - One turbine with a stuck anemometer reading near zero
//! - One turbine standing still in good wind with no alarm
//!
//! # Usage
//! ```bash
//! ./sample-data --turbines 9 --days 3 --seed 7 --out-dir ./sample
//! turbine-insight classify --data sample/scada.csv --layout sample/layout.csv
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::path::{Path, PathBuf};
use tracing::info;

use turbine_insight::types::columns;

// ============================================================================
// Farm Constants
// ============================================================================

/// Rated power (kW)
const RATED_POWER_KW: f64 = 2_300.0;
/// Cut-in / rated / cut-out wind speeds (m/s)
const CUT_IN: f64 = 3.0;
const RATED_WIND: f64 = 12.5;
const CUT_OUT: f64 = 25.0;
/// Grid spacing between turbines (m)
const SPACING_M: f64 = 400.0;
/// Metmast id, matching the `met_*_<id>` column suffix
const METMAST_ID: &str = "38";
const INTERVAL_MINUTES: i64 = 10;
const INTERVAL_SECONDS: f64 = 600.0;

const ALARM_TEXTS: &[&str] = &[
    "Pitch system fault",
    "Yaw misalignment|Yaw motor overload",
    "Generator over temperature",
    "Grid voltage out of range|Converter trip",
];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sample-data")]
#[command(about = "Synthetic wind farm SCADA export for turbine-insight testing")]
#[command(version)]
struct Args {
    /// Number of turbines (laid out on a square grid)
    #[arg(short, long, default_value = "9", value_parser = clap::value_parser!(u32).range(2..=200))]
    turbines: u32,

    /// Days of 10-minute data
    #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=365))]
    days: u32,

    /// Random seed for reproducibility
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output directory for scada.csv and layout.csv
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

// ============================================================================
// Simulation
// ============================================================================

/// Per-turbine behavior injected into the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Normal,
    /// Anemometer stuck near zero while the turbine keeps producing
    StuckSensor,
    /// Stops in good wind during the second day, no alarm
    SilentStop,
}

struct Turbine {
    id: String,
    x: f64,
    y: f64,
    behaviour: Behaviour,
    energy_kwh: f64,
    alarm_left: u32,
    alarm_text: &'static str,
}

fn power_curve(wind: f64) -> f64 {
    if !(CUT_IN..CUT_OUT).contains(&wind) {
        0.0
    } else if wind >= RATED_WIND {
        RATED_POWER_KW
    } else {
        let frac = (wind - CUT_IN) / (RATED_WIND - CUT_IN);
        RATED_POWER_KW * frac.powi(3)
    }
}

/// Farm-wide wind at one step: diurnal cycle, slow random walk, calm spells.
struct WindField {
    level: f64,
    direction: f64,
    calm_left: u32,
}

impl WindField {
    fn step(&mut self, hour: f64, rng: &mut StdRng, walk: &Normal<f64>) -> (f64, f64) {
        self.level = (self.level + walk.sample(rng)).clamp(2.0, 16.0);
        self.direction = (self.direction + walk.sample(rng) * 4.0).rem_euclid(360.0);
        if self.calm_left == 0 && rng.gen_bool(0.004) {
            self.calm_left = rng.gen_range(6..24);
        }
        let diurnal = 1.5 * (std::f64::consts::TAU * (hour - 15.0) / 24.0).cos();
        let speed = if self.calm_left > 0 {
            self.calm_left -= 1;
            rng.gen_range(0.5..2.5)
        } else {
            (self.level + diurnal).max(0.0)
        };
        (speed, self.direction)
    }
}

fn fmt_num(value: f64) -> String {
    format!("{value:.2}")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let noise = Normal::new(0.0, 0.35).context("wind noise distribution")?;
    let walk = Normal::new(0.0, 0.25).context("wind walk distribution")?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cols = f64::from(args.turbines).sqrt().ceil() as u32;
    let mut turbines: Vec<Turbine> = (0..args.turbines)
        .map(|i| Turbine {
            id: format!("WTG_{:03}", i + 1),
            x: f64::from(i % cols) * SPACING_M,
            y: f64::from(i / cols) * SPACING_M,
            behaviour: match i {
                2 => Behaviour::StuckSensor,
                4 => Behaviour::SilentStop,
                _ => Behaviour::Normal,
            },
            energy_kwh: rng.gen_range(1.0e6..5.0e6),
            alarm_left: 0,
            alarm_text: ALARM_TEXTS[0],
        })
        .collect();

    let centre = f64::from(cols - 1) * SPACING_M / 2.0;
    write_layout(&args.out_dir.join("layout.csv"), &turbines, (centre, centre))?;

    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("start timestamp")?;
    let steps = i64::from(args.days) * 24 * 60 / INTERVAL_MINUTES;

    let scada_path = args.out_dir.join("scada.csv");
    let mut writer = csv::Writer::from_path(&scada_path)
        .with_context(|| format!("Failed to create {}", scada_path.display()))?;
    let met_speed = format!("{}{METMAST_ID}", columns::METMAST_WIND_SPEED_PREFIX);
    let met_dir = format!("{}{METMAST_ID}", columns::METMAST_WIND_DIRECTION_PREFIX);
    let mut header: Vec<&str> = columns::REQUIRED_COLUMNS.to_vec();
    header.push(&met_speed);
    header.push(&met_dir);
    writer.write_record(&header)?;

    let mut field = WindField {
        level: 8.0,
        direction: 240.0,
        calm_left: 0,
    };
    let mut curtailment_left = 0u32;
    let mut rows = 0usize;

    for step in 0..steps {
        let ts = start + Duration::minutes(step * INTERVAL_MINUTES);
        #[allow(clippy::cast_precision_loss)]
        let hour = (step % (24 * 6)) as f64 / 6.0;
        let (wind, direction) = field.step(hour, &mut rng, &walk);
        let met_wind = (wind + noise.sample(&mut rng) * 0.5).max(0.0);

        if curtailment_left == 0 && rng.gen_bool(0.003) {
            curtailment_left = rng.gen_range(3..12);
        }
        let curtailed = curtailment_left > 0;
        curtailment_left = curtailment_left.saturating_sub(1);

        for (index, turbine) in turbines.iter_mut().enumerate() {
            let local_wind = (wind + noise.sample(&mut rng)).max(0.0);
            let local_dir = (direction + noise.sample(&mut rng) * 5.0).rem_euclid(360.0);

            if turbine.alarm_left == 0 && rng.gen_bool(0.002) {
                turbine.alarm_left = rng.gen_range(2..9);
                turbine.alarm_text = ALARM_TEXTS[rng.gen_range(0..ALARM_TEXTS.len())];
            }
            let alarm = turbine.alarm_left > 0;
            turbine.alarm_left = turbine.alarm_left.saturating_sub(1);

            let silent = turbine.behaviour == Behaviour::SilentStop
                && (24 * 6..24 * 6 + 18).contains(&step);
            // OEM curtailment on the odd-numbered turbines, grid curtailment on the rest
            let (internal, external) = match (curtailed, index % 2 == 1) {
                (true, true) => (INTERVAL_SECONDS, 0.0),
                (true, false) => (0.0, INTERVAL_SECONDS),
                _ => (0.0, 0.0),
            };

            let mut power = power_curve(local_wind);
            if alarm || silent {
                power = rng.gen_range(-5.0..0.5);
            } else if curtailed {
                power = power.min(0.8);
            }
            let spread = power.abs() * 0.15 + 1.0;
            turbine.energy_kwh += (power.max(0.0) * INTERVAL_SECONDS / 3_600.0).round();

            let reported_wind = match turbine.behaviour {
                Behaviour::StuckSensor if step > 12 => rng.gen_range(0.0..0.6),
                _ => local_wind,
            };

            let alarm_seconds = if alarm { INTERVAL_SECONDS } else { 0.0 };
            // Occasional blank power cell, classified as data missing
            let power_cell = if rng.gen_bool(0.001) { String::new() } else { fmt_num(power) };

            let record = vec![
                turbine.id.clone(),
                ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                fmt_num(alarm_seconds),
                if alarm { turbine.alarm_text.to_string() } else { String::new() },
                fmt_num(internal),
                fmt_num(turbine.energy_kwh),
                power_cell,
                fmt_num(power - spread),
                fmt_num(power + spread),
                fmt_num(reported_wind),
                fmt_num(local_dir),
                fmt_num(external),
                fmt_num(met_wind),
                fmt_num(direction),
            ];
            writer.write_record(&record)?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(
        rows,
        turbines = turbines.len(),
        days = args.days,
        path = %scada_path.display(),
        "SCADA export written"
    );
    Ok(())
}

fn write_layout(path: &Path, turbines: &[Turbine], metmast: (f64, f64)) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record([
        columns::LAYOUT_STATION_ID,
        columns::LAYOUT_X,
        columns::LAYOUT_Y,
        columns::LAYOUT_TYPE,
    ])?;
    for t in turbines {
        writer.write_record([t.id.clone(), fmt_num(t.x), fmt_num(t.y), "turbine".to_string()])?;
    }
    // Offset from the grid so it never coincides with a turbine
    writer.write_record([
        METMAST_ID.to_string(),
        fmt_num(metmast.0 + SPACING_M / 4.0),
        fmt_num(metmast.1 + SPACING_M / 4.0),
        "metmast".to_string(),
    ])?;
    writer.flush()?;
    info!(path = %path.display(), turbines = turbines.len(), "Layout written");
    Ok(())
}
