//! Inertial (TEME) to Earth-fixed to geodetic conversion.
//!
//! The Earth-fixed frame is obtained by a single rotation about the pole by the
//! Greenwich mean sidereal angle. Polar motion and the equation of the equinoxes are
//! ignored, which is consistent with the accuracy of SGP4 itself.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrackError};
use crate::propagation::StateVector;
use crate::time::{gmst, EpochTime};

/// WGS-84 equatorial radius, km.
pub const WGS84_A: f64 = 6378.137;
/// WGS-84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
const LATITUDE_TOLERANCE: f64 = 1.0e-12;
const MAX_LATITUDE_ITERATIONS: usize = 10;

/// Point over the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Geodetic latitude in degrees, [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, (-180, 180].
    pub longitude: f64,
    /// Height above the ellipsoid, km. Negative below the surface.
    pub altitude: f64,
}

impl GeodeticPoint {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        GeodeticPoint { latitude, longitude: normalize_longitude(longitude), altitude }
    }
}

/// Map any longitude in degrees onto (-180, 180].
pub fn normalize_longitude(deg: f64) -> f64 {
    let lon = deg.rem_euclid(360.0);
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Rotate a TEME vector into the Earth-fixed frame for sidereal angle `gmst` (rad).
pub fn teme_to_ecef(teme: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -gmst) * teme
}

/// Geodetic coordinates of an Earth-fixed position (km), iterating on latitude until
/// successive estimates agree to 1e-12 rad.
pub fn ecef_to_geodetic(ecef: &Vector3<f64>) -> GeodeticPoint {
    let (x, y, z) = (ecef.x, ecef.y, ecef.z);
    let p = x.hypot(y);

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let s = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * s * s).sqrt();
        let next = (z + n * WGS84_E2 * s).atan2(p);
        let delta = (next - lat).abs();
        lat = next;
        if delta < LATITUDE_TOLERANCE {
            break;
        }
    }

    // valid at the poles too, unlike p / cos(lat) - n
    let (s, c) = lat.sin_cos();
    let altitude = p * c + z * s - WGS84_A * (1.0 - WGS84_E2 * s * s).sqrt();

    GeodeticPoint {
        latitude: lat.to_degrees(),
        longitude: normalize_longitude(y.atan2(x).to_degrees()),
        altitude,
    }
}

pub fn geodetic_to_ecef(point: &GeodeticPoint) -> Vector3<f64> {
    let (slat, clat) = point.latitude.to_radians().sin_cos();
    let (slon, clon) = point.longitude.to_radians().sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * slat * slat).sqrt();

    Vector3::new(
        (n + point.altitude) * clat * clon,
        (n + point.altitude) * clat * slon,
        (n * (1.0 - WGS84_E2) + point.altitude) * slat,
    )
}

/// Sub-satellite point of `state` at time `at`.
///
/// A position below the surface is reported with a negative altitude; only non-finite
/// positions are rejected.
pub fn to_geodetic(state: &StateVector, at: EpochTime) -> Result<GeodeticPoint> {
    if !state.position.iter().all(|c| c.is_finite()) {
        return Err(TrackError::NonPhysicalPosition([state.position.x, state.position.y, state.position.z]));
    }

    let ecef = teme_to_ecef(&state.position, gmst(at));
    let point = ecef_to_geodetic(&ecef);
    if !(point.latitude.is_finite() && point.longitude.is_finite() && point.altitude.is_finite()) {
        return Err(TrackError::NonPhysicalPosition([state.position.x, state.position.y, state.position.z]));
    }

    Ok(point)
}
