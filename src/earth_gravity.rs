use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{config_error, TrackError};

/// Earth gravity model parameters used by SGP4.
///
/// `xke` is sqrt(mu / radius³) expressed in earth radii per minute, `tumin` its inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarthGravity {
    pub tumin: f64,
    pub mu: f64,
    pub radiusearthkm: f64,
    pub xke: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    pub j3oj2: f64,
}

/// The constant sets element sets are generated against. TLEs are fitted with WGS-72.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GravityModel {
    Wgs72Old,
    #[default]
    Wgs72,
    Wgs84,
}

impl GravityModel {
    pub fn constants(self) -> EarthGravity {
        match self {
            GravityModel::Wgs72Old => {
                let radiusearthkm = 6378.135_f64;
                let xke = 0.074_366_916_1_f64;
                let j2 = 0.001_082_616_f64;
                let j3 = -0.000_002_538_81_f64;
                EarthGravity {
                    tumin: 1.0 / xke,
                    mu: 398_600.799_64,
                    radiusearthkm,
                    xke,
                    j2,
                    j3,
                    j4: -0.000_001_655_97,
                    j3oj2: j3 / j2,
                }
            }
            GravityModel::Wgs72 => {
                let mu = 398_600.8_f64;
                let radiusearthkm = 6378.135_f64;
                let xke = 60.0 / (radiusearthkm * radiusearthkm * radiusearthkm / mu).sqrt();
                let j2 = 0.001_082_616_f64;
                let j3 = -0.000_002_538_81_f64;
                EarthGravity {
                    tumin: 1.0 / xke,
                    mu,
                    radiusearthkm,
                    xke,
                    j2,
                    j3,
                    j4: -0.000_001_655_97,
                    j3oj2: j3 / j2,
                }
            }
            GravityModel::Wgs84 => {
                let mu = 398_600.5_f64;
                let radiusearthkm = 6378.137_f64;
                let xke = 60.0 / (radiusearthkm * radiusearthkm * radiusearthkm / mu).sqrt();
                let j2 = 0.001_082_629_989_05_f64;
                let j3 = -0.000_002_532_153_06_f64;
                EarthGravity {
                    tumin: 1.0 / xke,
                    mu,
                    radiusearthkm,
                    xke,
                    j2,
                    j3,
                    j4: -0.000_001_610_987_61,
                    j3oj2: j3 / j2,
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GravityModel::Wgs72Old => "wgs72old",
            GravityModel::Wgs72 => "wgs72",
            GravityModel::Wgs84 => "wgs84",
        }
    }
}

impl fmt::Display for GravityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GravityModel {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgs72old" => Ok(GravityModel::Wgs72Old),
            "wgs72" => Ok(GravityModel::Wgs72),
            "wgs84" => Ok(GravityModel::Wgs84),
            other => Err(config_error!(
                "unknown gravity model {other} (use wgs72old, wgs72, wgs84)"
            )),
        }
    }
}

/// Operation mode of the propagator. `Afspc` reproduces the original Air Force Space
/// Command sidereal time and node handling, `Improved` is the modern variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpsMode {
    Afspc,
    #[default]
    Improved,
}

impl fmt::Display for OpsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpsMode::Afspc => f.write_str("afspc"),
            OpsMode::Improved => f.write_str("improved"),
        }
    }
}

impl FromStr for OpsMode {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "afspc" => Ok(OpsMode::Afspc),
            "i" | "improved" => Ok(OpsMode::Improved),
            other => Err(config_error!("unknown opsmode {other} (use afspc, improved)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "expected {b}, got {a}");
    }

    #[test]
    fn wgs72_derived_constants() {
        let g = GravityModel::Wgs72.constants();
        approx_eq(g.xke, 0.074_366_916_133_173_4, 1.0e-12);
        approx_eq(g.tumin * g.xke, 1.0, 1.0e-15);
        approx_eq(g.j3oj2, -0.000_002_538_81 / 0.001_082_616, 1.0e-15);
    }

    #[test]
    fn models_differ_where_expected() {
        let old = GravityModel::Wgs72Old.constants();
        let w72 = GravityModel::Wgs72.constants();
        let w84 = GravityModel::Wgs84.constants();

        assert_eq!(old.radiusearthkm, w72.radiusearthkm);
        assert_eq!(old.j2, w72.j2);
        assert!(old.xke != w72.xke);
        assert!(w84.radiusearthkm > w72.radiusearthkm);
        assert!(w84.j4 != w72.j4);
    }

    #[test]
    fn names_round_trip() {
        for m in [GravityModel::Wgs72Old, GravityModel::Wgs72, GravityModel::Wgs84] {
            assert_eq!(m.to_string().parse::<GravityModel>().unwrap(), m);
        }
        assert!("egm96".parse::<GravityModel>().is_err());
        assert_eq!("a".parse::<OpsMode>().unwrap(), OpsMode::Afspc);
        assert_eq!("Improved".parse::<OpsMode>().unwrap(), OpsMode::Improved);
    }
}
