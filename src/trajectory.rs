//! Sampling a propagator over a time window into a ground track.
//!
//! Longitudes are reported as computed, normalized to (-180, 180]. A track that crosses
//! the antimeridian therefore jumps from about +180 to -180 between two samples; it is
//! not split into segments here. [`Trajectory::antimeridian_crossings`] gives the
//! indices where such jumps happen so a renderer can split the line itself.

use std::io::Write;

use chrono::{Duration, SecondsFormat};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{invalid_sample_config, Result, TrackError};
use crate::frames::{to_geodetic, GeodeticPoint};
use crate::propagation::Propagator;
use crate::time::EpochTime;
use crate::tle::OrbitalElementSet;

/// One ground track sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub time: EpochTime,
    pub point: GeodeticPoint,
}

/// Lazily evaluated, evenly spaced samples of a propagator.
///
/// Every sample is computed from scratch, so [`sample_at`](Self::sample_at) can address
/// any index in any order and [`iter`](Self::iter) holds no more than one point.
#[derive(Debug, Clone)]
pub struct TrajectorySampler {
    propagator: Propagator,
    start: EpochTime,
    step: Duration,
    step_ns: i64,
    count: usize,
}

impl TrajectorySampler {
    pub fn new(elements: &OrbitalElementSet, start: EpochTime, duration: Duration, step: Duration) -> Result<Self> {
        TrajectorySampler::with_propagator(Propagator::new(elements)?, start, duration, step)
    }

    /// Samples `start + i * step` for `i` in `0..ceil(duration / step)`.
    pub fn with_propagator(propagator: Propagator, start: EpochTime, duration: Duration, step: Duration) -> Result<Self> {
        let duration_ns = duration
            .num_nanoseconds()
            .ok_or_else(|| invalid_sample_config!("duration of {duration} is too long"))?;
        let step_ns = step
            .num_nanoseconds()
            .ok_or_else(|| invalid_sample_config!("step of {step} is too long"))?;

        if duration_ns <= 0 {
            return Err(invalid_sample_config!("duration must be positive, got {duration}"));
        }
        if step_ns <= 0 {
            return Err(invalid_sample_config!("step must be positive, got {step}"));
        }
        if step_ns > duration_ns {
            return Err(invalid_sample_config!("step of {step} exceeds duration of {duration}"));
        }

        let count = usize::try_from((duration_ns - 1) / step_ns + 1)
            .map_err(|_| invalid_sample_config!("too many samples"))?;

        Ok(TrajectorySampler { propagator, start, step, step_ns, count })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn start(&self) -> EpochTime {
        self.start
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    pub fn time_at(&self, index: usize) -> EpochTime {
        let ns = self.step_ns as f64 * index as f64;
        self.start.advance(ns * 1.0e-9)
    }

    pub fn sample_at(&self, index: usize) -> Result<TrackPoint> {
        if index >= self.count {
            return Err(invalid_sample_config!("sample index {index} out of range 0..{}", self.count));
        }

        let time = self.time_at(index);
        self.propagator
            .propagate(time)
            .and_then(|state| to_geodetic(&state, time))
            .map(|point| TrackPoint { time, point })
            .map_err(|e| TrackError::SampleFailed { index, source: Box::new(e) })
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<TrackPoint>> + '_ {
        (0..self.count).map(move |i| self.sample_at(i))
    }

    /// Evaluate all samples, stopping at the first failure.
    pub fn evaluate(&self) -> Result<Trajectory> {
        debug!(
            "sampling {} points of catalog number {} every {} s",
            self.count,
            self.propagator.elements().catalog_number,
            self.step_ns as f64 * 1.0e-9
        );

        let points = self.iter().collect::<Result<Vec<_>>>()?;
        Ok(Trajectory { points, start: self.start, step: self.step })
    }
}

/// Sample the ground track of `elements` with the default gravity model.
///
/// The first failing sample aborts the track as `SampleFailed` carrying its index;
/// [`TrackError::root`] gives the propagation error underneath.
pub fn sample(elements: &OrbitalElementSet, start: EpochTime, duration: Duration, step: Duration) -> Result<Trajectory> {
    TrajectorySampler::new(elements, start, duration, step)?.evaluate()
}

/// A fully evaluated ground track.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub points: Vec<TrackPoint>,
    pub start: EpochTime,
    pub step: Duration,
}

#[derive(Serialize)]
struct RonTrack<'a> {
    elements: &'a OrbitalElementSet,
    start: EpochTime,
    step_seconds: f64,
    points: &'a [TrackPoint],
}

#[derive(Serialize)]
struct CsvRow {
    time: String,
    longitude: f64,
    latitude: f64,
    altitude_km: f64,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(longitude, latitude)` pairs in degrees, unsplit at the antimeridian.
    pub fn lon_lat(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.point.longitude, p.point.latitude)).collect()
    }

    /// Indices `i` where the track jumps across ±180° between sample `i - 1` and `i`.
    pub fn antimeridian_crossings(&self) -> Vec<usize> {
        self.points
            .windows(2)
            .enumerate()
            .filter(|(_, w)| (w[1].point.longitude - w[0].point.longitude).abs() > 180.0)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Pretty RON record of the element set the track was sampled from and its points.
    pub fn to_ron(&self, elements: &OrbitalElementSet) -> Result<String> {
        let track = RonTrack {
            elements,
            start: self.start,
            step_seconds: self.step.num_nanoseconds().map_or(f64::NAN, |ns| ns as f64 * 1.0e-9),
            points: &self.points,
        };
        Ok(ron::ser::to_string_pretty(&track, ron::ser::PrettyConfig::default())?)
    }

    /// Columns `time,longitude,latitude,altitude_km`, one row per sample.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for p in &self.points {
            let time = match p.time.to_datetime() {
                Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
                None => format!("JD {:.8}", p.time.julian_date()),
            };
            wtr.serialize(CsvRow {
                time,
                longitude: p.point.longitude,
                latitude: p.point.latitude,
                altitude_km: p.point.altitude,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
