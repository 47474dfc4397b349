use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackError>;

/// Everything that can go wrong between TLE text and a sampled ground track.
///
/// Core failures are terminal for the request that produced them; propagation is a
/// deterministic function of its inputs so there is nothing to retry.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("malformed element set: {0}")]
    MalformedElementSet(String),

    #[error("invalid calendar date {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")]
    InvalidCalendarDate {
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    },

    #[error("propagation time {0} min is not finite")]
    NonFiniteTime(f64),

    #[error("Kepler's equation did not converge within {iterations} iterations at {tsince} min (last correction {residual:e} rad)")]
    KeplerNonConvergence {
        tsince: f64,
        iterations: usize,
        residual: f64,
    },

    #[error("satellite has decayed: radius {radius_km:.3} km is below the Earth's surface at {tsince} min")]
    DecayedOrbit { tsince: f64, radius_km: f64 },

    #[error("eccentricity {eccentricity} out of range at {tsince} min")]
    InvalidEccentricity { tsince: f64, eccentricity: f64 },

    #[error("{quantity} {value} out of range at {tsince} min")]
    InvalidSemiMajorAxis {
        tsince: f64,
        quantity: &'static str,
        value: f64,
    },

    #[error("invalid sample configuration: {0}")]
    InvalidSampleConfiguration(String),

    #[error("sample {index} failed: {source}")]
    SampleFailed {
        index: usize,
        #[source]
        source: Box<TrackError>,
    },

    #[error("non-physical position {0:?}")]
    NonPhysicalPosition([f64; 3]),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("CSV error {0}")]
    CsvError(#[from] csv::Error),

    #[error("RON error {0}")]
    RonError(#[from] ron::Error),
}

impl TrackError {
    /// The propagation failure underneath any `SampleFailed` wrapping.
    pub fn root(&self) -> &TrackError {
        match self {
            TrackError::SampleFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

macro_rules! malformed {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::TrackError::MalformedElementSet( format!( $fmt $(, $arg)* ))
    };
}
pub(crate) use malformed;

macro_rules! invalid_sample_config {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::TrackError::InvalidSampleConfiguration( format!( $fmt $(, $arg)* ))
    };
}
pub(crate) use invalid_sample_config;

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::TrackError::ConfigError( format!( $fmt $(, $arg)* ))
    };
}
pub(crate) use config_error;
