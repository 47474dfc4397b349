use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};

use groundtrack::{
    propagation::Branch, time::parse_datetime_spec, GravityModel, OpsMode, OrbitalElementSet, Propagator,
    TrackConfig, TrajectorySampler, DEFAULT_TLE,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "compute the ground track of a satellite as CSV (time, longitude, latitude, altitude_km)")]
struct Args {
    /// first TLE line
    #[arg(long, requires = "line2", conflicts_with = "tle_file")]
    line1: Option<String>,

    /// second TLE line
    #[arg(long, requires = "line1")]
    line2: Option<String>,

    /// file with a 2 or 3 line element set (default is the ISS)
    #[arg(long, short)]
    tle_file: Option<PathBuf>,

    /// start time: 'now', RFC 3339 or YYYY.MM.DD.HH.MM.SS (UTC)
    #[arg(long, short, default_value = "now")]
    start: String,

    /// step between samples in seconds
    #[arg(long)]
    step: Option<f64>,

    /// length of the track in hours
    #[arg(long)]
    hours: Option<f64>,

    /// RON file with TrackConfig settings, overridden by the options above
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// wgs72old, wgs72 or wgs84
    #[arg(long)]
    gravity: Option<GravityModel>,

    /// afspc or improved
    #[arg(long)]
    opsmode: Option<OpsMode>,

    /// output file (default is stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// output format
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    /// time, longitude, latitude, altitude_km columns
    Csv,
    /// element set and track points as RON
    Ron,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackConfig::load(path)?,
        None => TrackConfig::default(),
    };
    if let Some(step) = args.step {
        config.step_seconds = step;
    }
    if let Some(hours) = args.hours {
        config.duration_hours = hours;
    }
    if let Some(gravity) = args.gravity {
        config.gravity = gravity;
    }
    if let Some(opsmode) = args.opsmode {
        config.opsmode = opsmode;
    }
    debug!("{config:?}");

    let elements = read_elements(&args)?;
    let start = parse_datetime_spec(&args.start)?;

    let propagator = Propagator::with_model(&elements, config.gravity, config.opsmode)?;
    info!(
        "{} ({}): period {:.2} min, perigee {:.1} km, apogee {:.1} km, {}",
        elements.name.as_deref().unwrap_or("unnamed"),
        elements.catalog_number,
        propagator.period_minutes(),
        propagator.perigee_altitude_km(),
        propagator.apogee_altitude_km(),
        match propagator.branch() {
            Branch::NearEarth { simplified_drag: false } => "near earth".to_string(),
            Branch::NearEarth { simplified_drag: true } => "near earth, simplified drag".to_string(),
            Branch::DeepSpace { resonance } => format!("deep space, {resonance:?} resonance"),
        }
    );

    let sampler = TrajectorySampler::with_propagator(propagator, start, config.duration()?, config.step()?)?;
    let track = sampler
        .evaluate()
        .with_context(|| format!("ground track of catalog number {} failed", elements.catalog_number))?;

    match (&args.output, args.format) {
        (Some(path), Format::Csv) => {
            let file = fs::File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
            track.write_csv(file)?;
        }
        (Some(path), Format::Ron) => {
            fs::write(path, track.to_ron(&elements)?).with_context(|| format!("cannot write {}", path.display()))?;
        }
        (None, Format::Csv) => track.write_csv(io::stdout().lock())?,
        (None, Format::Ron) => println!("{}", track.to_ron(&elements)?),
    }
    if let Some(path) = &args.output {
        info!("{} points written to {}", track.len(), path.display());
    }

    Ok(())
}

fn read_elements(args: &Args) -> Result<OrbitalElementSet> {
    let elements = match (&args.line1, &args.line2, &args.tle_file) {
        (Some(line1), Some(line2), _) => OrbitalElementSet::from_lines(line1, line2)?,
        (_, _, Some(path)) => {
            let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
            OrbitalElementSet::from_text(&text)?
        }
        _ => {
            info!("no element set given, using the built-in ISS TLE");
            OrbitalElementSet::from_text(DEFAULT_TLE)?
        }
    };
    Ok(elements)
}
