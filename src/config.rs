use std::{fs, path::Path};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::earth_gravity::{GravityModel, OpsMode};
use crate::errors::{config_error, invalid_sample_config, Result};

pub const DEFAULT_STEP_SECONDS: f64 = 180.0;
pub const DEFAULT_DURATION_HOURS: f64 = 24.0;

/// Ground track settings, typically read from a RON file such as
/// ```ron
/// TrackConfig(
///     step_seconds: 60.0,
///     duration_hours: 6.0,
///     gravity: wgs84,
/// )
/// ```
/// Omitted fields take their defaults (3 min step over 24 h, WGS-72, improved mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub step_seconds: f64,
    pub duration_hours: f64,
    pub gravity: GravityModel,
    pub opsmode: OpsMode,
}

impl Default for TrackConfig {
    fn default() -> Self {
        TrackConfig {
            step_seconds: DEFAULT_STEP_SECONDS,
            duration_hours: DEFAULT_DURATION_HOURS,
            gravity: GravityModel::default(),
            opsmode: OpsMode::default(),
        }
    }
}

impl TrackConfig {
    pub fn from_ron(s: &str) -> Result<Self> {
        ron::from_str(s).map_err(|e| config_error!("{e}"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|e| config_error!("cannot read {}: {e}", path.display()))?;
        TrackConfig::from_ron(&s)
    }

    pub fn step(&self) -> Result<Duration> {
        to_duration(self.step_seconds, "step")
    }

    pub fn duration(&self) -> Result<Duration> {
        to_duration(self.duration_hours * 3600.0, "duration")
    }
}

/// Millisecond-resolution duration from seconds.
fn to_duration(seconds: f64, what: &str) -> Result<Duration> {
    let ms = (seconds * 1000.0).round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return Err(invalid_sample_config!("{what} of {seconds} s is not representable"));
    }
    Ok(Duration::milliseconds(ms as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_three_minutes_over_a_day() {
        let c = TrackConfig::default();
        assert_eq!(c.step().unwrap(), Duration::minutes(3));
        assert_eq!(c.duration().unwrap(), Duration::hours(24));
        assert_eq!(c.gravity, GravityModel::Wgs72);
        assert_eq!(c.opsmode, OpsMode::Improved);
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let c = TrackConfig::from_ron("TrackConfig(step_seconds: 60.0, gravity: wgs84)").unwrap();
        assert_eq!(c.step().unwrap(), Duration::seconds(60));
        assert_eq!(c.duration_hours, DEFAULT_DURATION_HOURS);
        assert_eq!(c.gravity, GravityModel::Wgs84);

        let c = TrackConfig::from_ron("(opsmode: afspc)").unwrap();
        assert_eq!(c.opsmode, OpsMode::Afspc);
    }

    #[test]
    fn bad_ron_is_a_config_error() {
        assert!(matches!(
            TrackConfig::from_ron("TrackConfig(gravity: egm2008)"),
            Err(crate::errors::TrackError::ConfigError(_))
        ));
        assert!(TrackConfig::load("/nonexistent/track.ron").is_err());
    }

    #[test]
    fn non_finite_durations_are_rejected() {
        let c = TrackConfig { step_seconds: f64::NAN, ..TrackConfig::default() };
        assert!(c.step().is_err());

        // -2^63 ms would be i64::MIN, which chrono refuses
        let c = TrackConfig { step_seconds: -(2.0_f64.powi(63)) / 1000.0, ..TrackConfig::default() };
        assert!(matches!(c.step(), Err(crate::errors::TrackError::InvalidSampleConfiguration(_))));
        let c = TrackConfig { duration_hours: f64::INFINITY, ..TrackConfig::default() };
        assert!(c.duration().is_err());
    }
}
