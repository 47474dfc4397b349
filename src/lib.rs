//! Satellite ground tracks from two-line element sets.
//!
//! The pipeline is TLE text → [`OrbitalElementSet`] → [`Propagator`] (SGP4/SDP4, TEME
//! state vectors) → [`to_geodetic`] (WGS-84 sub-satellite point) → [`Trajectory`].
//!
//! ```no_run
//! use chrono::Duration;
//! use groundtrack::{sample, OrbitalElementSet};
//!
//! let els = OrbitalElementSet::from_lines(
//!     "1 25544U 98067A   20136.53767674  .00002826  00000-0  58675-4 0  9990",
//!     "2 25544  51.6449 150.0725 0001795 321.2979 176.4300 15.49373505226953",
//! )?;
//! let track = sample(&els, els.epoch, Duration::hours(24), Duration::minutes(3))?;
//! for (lon, lat) in track.lon_lat() {
//!     println!("{lon:.3} {lat:.3}");
//! }
//! # Ok::<(), groundtrack::TrackError>(())
//! ```
//!
//! Longitudes are not split at the antimeridian, see [`trajectory`].
//!
//! Nothing below the trajectory layer logs or performs I/O; all failures are returned
//! as [`TrackError`].

pub mod alpha5;
pub mod config;
pub mod earth_gravity;
pub mod errors;
pub mod frames;
pub mod propagation;
pub mod time;
pub mod tle;
pub mod trajectory;

pub use config::TrackConfig;
pub use earth_gravity::{EarthGravity, GravityModel, OpsMode};
pub use errors::{Result, TrackError};
pub use frames::{to_geodetic, GeodeticPoint};
pub use propagation::{propagate, Branch, MeanElements, Propagator, StateVector};
pub use time::{advance, to_epoch, EpochTime};
pub use tle::OrbitalElementSet;
pub use trajectory::{sample, TrackPoint, Trajectory, TrajectorySampler};

/// ISS (ZARYA) element set used when no other satellite is given.
pub const DEFAULT_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   20136.53767674  .00002826  00000-0  58675-4 0  9990
2 25544  51.6449 150.0725 0001795 321.2979 176.4300 15.49373505226953";
