//! TEME state vectors and their osculating classical elements.

use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::time::{EpochTime, TWOPI};

const SMALL: f64 = 1.0e-8;

/// Position (km) and velocity (km/s) in the True Equator Mean Equinox frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub epoch: EpochTime,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl StateVector {
    pub fn radius_km(&self) -> f64 {
        self.position.norm()
    }

    pub fn speed_km_s(&self) -> f64 {
        self.velocity.norm()
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }

    /// Osculating two-body elements for gravitational parameter `mu` (km³/s²).
    pub fn osculating_elements(&self, mu: f64) -> Option<ClassicalElements> {
        rv2coe(&self.position, &self.velocity, mu)
    }
}

/// Classical orbital elements. Angles are radians; quantities that are undefined for
/// the orbit's geometry (node of an equatorial orbit, perigee of a circular one) are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassicalElements {
    /// Semi-latus rectum, km.
    pub p: f64,
    /// Semi-major axis, km. `None` for parabolic orbits.
    pub a: Option<f64>,
    pub ecc: f64,
    pub incl: f64,
    pub raan: Option<f64>,
    pub argp: Option<f64>,
    pub nu: Option<f64>,
    pub mean_anomaly: Option<f64>,
    /// Argument of latitude, circular inclined orbits only.
    pub arglat: Option<f64>,
    /// True longitude, circular equatorial orbits only.
    pub truelon: Option<f64>,
    /// Longitude of periapsis, elliptical equatorial orbits only.
    pub lonper: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OrbitShape {
    EllipticalInclined,
    CircularEquatorial,
    CircularInclined,
    EllipticalEquatorial,
}

/// Angle between two vectors in [0, π], `None` if either is degenerate.
fn angle(v1: &Vector3<f64>, v2: &Vector3<f64>) -> Option<f64> {
    let m = v1.norm() * v2.norm();
    (m > SMALL * SMALL).then(|| (v1.dot(v2) / m).clamp(-1.0, 1.0).acos())
}

/// Eccentric (or hyperbolic/parabolic) anomaly and mean anomaly from true anomaly `nu`.
///
/// Returns `None` where the anomaly is undefined: a hyperbolic `nu` beyond the asymptote,
/// or a near-parabolic `nu` beyond 168°.
pub fn newtonnu(ecc: f64, nu: f64) -> Option<(f64, f64)> {
    let (e0, m) = if ecc.abs() < SMALL {
        (nu, nu)
    } else if ecc < 1.0 - SMALL {
        let sine = ((1.0 - ecc * ecc).sqrt() * nu.sin()) / (1.0 + ecc * nu.cos());
        let cose = (ecc + nu.cos()) / (1.0 + ecc * nu.cos());
        let e0 = sine.atan2(cose);
        (e0, e0 - ecc * e0.sin())
    } else if ecc > 1.0 + SMALL {
        if nu.abs() + 0.00001 >= PI - (1.0 / ecc).acos() {
            return None;
        }
        let sine = ((ecc * ecc - 1.0).sqrt() * nu.sin()) / (1.0 + ecc * nu.cos());
        let e0 = sine.asinh();
        (e0, ecc * e0.sinh() - e0)
    } else {
        if nu.abs() >= 168.0_f64.to_radians() {
            return None;
        }
        let e0 = (nu * 0.5).tan();
        (e0, e0 + e0 * e0 * e0 / 3.0)
    };

    if ecc < 1.0 {
        Some((e0 % TWOPI, m.rem_euclid(TWOPI)))
    } else {
        Some((e0, m))
    }
}

/// Classical elements from a position (km) and velocity (km/s).
/// `None` when the angular momentum vanishes (rectilinear motion).
pub fn rv2coe(r: &Vector3<f64>, v: &Vector3<f64>, mu: f64) -> Option<ClassicalElements> {
    let magr = r.norm();
    let magv = v.norm();

    let hbar = r.cross(v);
    let magh = hbar.norm();
    if magh <= SMALL {
        return None;
    }

    let nbar = Vector3::new(-hbar.y, hbar.x, 0.0);
    let magn = nbar.norm();
    let c1 = magv * magv - mu / magr;
    let rdotv = r.dot(v);
    let ebar = (c1 * r - rdotv * v) / mu;
    let ecc = ebar.norm();

    let sme = 0.5 * magv * magv - mu / magr;
    let a = (sme.abs() > SMALL).then(|| -mu / (2.0 * sme));
    let p = magh * magh / mu;
    let incl = (hbar.z / magh).acos();

    let equatorial = incl < SMALL || (incl - PI).abs() < SMALL;
    let shape = match (ecc < SMALL, equatorial) {
        (true, true) => OrbitShape::CircularEquatorial,
        (true, false) => OrbitShape::CircularInclined,
        (false, true) => OrbitShape::EllipticalEquatorial,
        (false, false) => OrbitShape::EllipticalInclined,
    };

    let raan = (magn > SMALL).then(|| {
        let omega = (nbar.x / magn).clamp(-1.0, 1.0).acos();
        if nbar.y < 0.0 {
            TWOPI - omega
        } else {
            omega
        }
    });

    let argp = match shape {
        OrbitShape::EllipticalInclined => {
            angle(&nbar, &ebar).map(|argp| if ebar.z < 0.0 { TWOPI - argp } else { argp })
        }
        _ => None,
    };

    let nu = match shape {
        OrbitShape::EllipticalInclined | OrbitShape::EllipticalEquatorial => {
            angle(&ebar, r).map(|nu| if rdotv < 0.0 { TWOPI - nu } else { nu })
        }
        _ => None,
    };

    let arglat = match shape {
        OrbitShape::CircularInclined => {
            angle(&nbar, r).map(|u| if r.z < 0.0 { TWOPI - u } else { u })
        }
        _ => None,
    };

    let lonper = (shape == OrbitShape::EllipticalEquatorial).then(|| {
        let mut lonper = (ebar.x / ecc).clamp(-1.0, 1.0).acos();
        if ebar.y < 0.0 {
            lonper = TWOPI - lonper;
        }
        if incl > 0.5 * PI {
            lonper = TWOPI - lonper;
        }
        lonper
    });

    let truelon = (magr > SMALL && shape == OrbitShape::CircularEquatorial).then(|| {
        let mut truelon = (r.x / magr).clamp(-1.0, 1.0).acos();
        if r.y < 0.0 {
            truelon = TWOPI - truelon;
        }
        if incl > 0.5 * PI {
            truelon = TWOPI - truelon;
        }
        truelon
    });

    let mean_anomaly = match shape {
        OrbitShape::CircularInclined => arglat,
        OrbitShape::CircularEquatorial => truelon,
        _ => nu.and_then(|nu| newtonnu(ecc, nu)).map(|(_, m)| m),
    };

    Some(ClassicalElements {
        p,
        a,
        ecc,
        incl,
        raan,
        argp,
        nu,
        mean_anomaly,
        arglat,
        truelon,
        lonper,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn newtonnu_elliptic() {
        let (e0, m) = newtonnu(0.1, 40.0_f64.to_radians()).unwrap();
        // E = atan2(sqrt(1 - e^2) sin nu, e + cos nu), M = E - e sin E
        assert_abs_diff_eq!(e0, 0.636_094_245_730_360_9, epsilon = 1.0e-12);
        assert_abs_diff_eq!(m, 0.576_688_435_198_464_7, epsilon = 1.0e-12);
    }

    #[test]
    fn newtonnu_parabolic_and_hyperbolic() {
        let (e0, m) = newtonnu(1.0, 2.9).unwrap();
        assert_abs_diff_eq!(e0, 8.238_092_752_965_605, epsilon = 1.0e-12);
        assert_abs_diff_eq!(m, 194.600_699_894_828_98, epsilon = 1.0e-10);

        let (e0, m) = newtonnu(1.1, 2.7).unwrap();
        assert_abs_diff_eq!(e0, 4.262_200_676_156_417, epsilon = 1.0e-12);
        assert_abs_diff_eq!(m, 34.761_340_820_283_72, epsilon = 1.0e-10);

        // beyond the asymptote
        assert!(newtonnu(1.1, 3.0).is_none());
    }

    #[test]
    fn rv2coe_inclined_ellipse() {
        let mu = 398_600.8;
        let r = Vector3::new(7000.0, 0.0, 0.0);
        let v = Vector3::new(0.0, 7.546_049_108_166_282, 1.0);

        let coe = rv2coe(&r, &v, mu).unwrap();
        let a = coe.a.unwrap();
        assert!(coe.ecc < 0.1);
        assert_abs_diff_eq!(coe.p, a * (1.0 - coe.ecc * coe.ecc), epsilon = 1.0e-6);
        assert_abs_diff_eq!(coe.incl, (1.0_f64 / 7.546_049_108_166_282).atan(), epsilon = 1.0e-12);
        assert_abs_diff_eq!(coe.raan.unwrap(), 0.0, epsilon = 1.0e-12);
        assert!(coe.argp.is_some());
        assert!(coe.arglat.is_none());
        assert!(coe.truelon.is_none());
    }

    #[test]
    fn rv2coe_circular_equatorial() {
        let mu = 398_600.8;
        let r = Vector3::new(0.0, 7000.0, 0.0);
        let v = Vector3::new(-(mu / 7000.0_f64).sqrt(), 0.0, 0.0);

        let coe = rv2coe(&r, &v, mu).unwrap();
        assert!(coe.ecc < SMALL);
        assert!(coe.raan.is_none());
        assert!(coe.argp.is_none());
        assert_abs_diff_eq!(coe.truelon.unwrap(), 0.5 * PI, epsilon = 1.0e-9);
        assert_eq!(coe.mean_anomaly, coe.truelon);
    }

    #[test]
    fn rv2coe_rejects_rectilinear_motion() {
        let r = Vector3::new(7000.0, 0.0, 0.0);
        let v = Vector3::new(1.0, 0.0, 0.0);
        assert!(rv2coe(&r, &v, 398_600.8).is_none());
    }
}
