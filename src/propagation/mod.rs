//! SGP4/SDP4 propagation of an [`OrbitalElementSet`] to a TEME [`StateVector`].
//!
//! A [`Propagator`] does all epoch-dependent setup once and is immutable afterwards:
//! [`Propagator::propagate`] is a pure function of the target time, so a single
//! propagator can be shared between threads and queried in any order.
//!
//! Orbits with a period of 225 minutes or more take the deep-space branch, which adds
//! lunar-solar perturbations and the geopotential resonances of 12h and 24h orbits.

mod deep_space;
mod near_earth;
mod state;

use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::earth_gravity::{EarthGravity, GravityModel, OpsMode};
use crate::errors::{Result, TrackError};
use crate::time::{EpochTime, TWOPI};
use crate::tle::OrbitalElementSet;

use deep_space::{DeepSpace, DeepSpaceInit};
use near_earth::{NearEarth, X2O3};

pub use deep_space::Resonance;
pub use near_earth::{DEEP_SPACE_PERIOD, SIMPLIFIED_DRAG_PERIGEE};
pub use state::{newtonnu, rv2coe, ClassicalElements, StateVector};

/// Newton-Raphson iterations allowed for Kepler's equation before giving up.
pub const MAX_KEPLER_ITERATIONS: usize = 25;
const KEPLER_TOLERANCE: f64 = 1.0e-12;
const KEPLER_MAX_STEP: f64 = 0.95;

/// Which set of perturbation terms a propagator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Period under 225 min. Perigees below 220 km use simplified drag.
    NearEarth { simplified_drag: bool },
    DeepSpace { resonance: Resonance },
}

/// Singly averaged mean elements at some time since epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanElements {
    /// Minutes since the element set epoch.
    pub tsince: f64,
    /// Semi-major axis, km.
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub right_ascension: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
    /// Brouwer mean motion, rad/min.
    pub mean_motion: f64,
}

/// Mean state as used internally, angles not yet normalized.
#[derive(Debug, Clone, Copy)]
struct MeanState {
    am: f64,
    em: f64,
    inclm: f64,
    nodem: f64,
    argpm: f64,
    mm: f64,
    nm: f64,
}

#[derive(Debug, Clone)]
pub struct Propagator {
    elements: OrbitalElementSet,
    model: GravityModel,
    opsmode: OpsMode,
    gravity: EarthGravity,
    near: NearEarth,
    deep: Option<Box<DeepSpace>>,
}

impl Propagator {
    /// Propagator with the WGS-72 constants TLEs are generated against.
    pub fn new(elements: &OrbitalElementSet) -> Result<Self> {
        Self::with_model(elements, GravityModel::default(), OpsMode::default())
    }

    pub fn with_model(elements: &OrbitalElementSet, model: GravityModel, opsmode: OpsMode) -> Result<Self> {
        let gravity = model.constants();
        let near = NearEarth::new(elements, &gravity, opsmode)?;

        let deep = near.is_deep_space().then(|| {
            Box::new(DeepSpace::new(&DeepSpaceInit {
                epoch_1950: elements.epoch.days_since_1950(),
                xke: gravity.xke,
                gsto: near.gsto,
                ecco: near.ecco,
                inclo: near.inclo,
                nodeo: near.nodeo,
                argpo: near.argpo,
                mo: near.mo,
                no: near.no_unkozai,
                mdot: near.mdot,
                argpdot: near.argpdot,
                nodedot: near.nodedot,
            }))
        });

        Ok(Propagator {
            elements: elements.clone(),
            model,
            opsmode,
            gravity,
            near,
            deep,
        })
    }

    pub fn elements(&self) -> &OrbitalElementSet {
        &self.elements
    }

    pub fn epoch(&self) -> EpochTime {
        self.elements.epoch
    }

    pub fn gravity_model(&self) -> GravityModel {
        self.model
    }

    pub fn opsmode(&self) -> OpsMode {
        self.opsmode
    }

    pub fn branch(&self) -> Branch {
        match &self.deep {
            Some(ds) => Branch::DeepSpace { resonance: ds.resonance() },
            None => Branch::NearEarth { simplified_drag: self.near.drag.is_none() },
        }
    }

    /// Anomalistic period from the Brouwer mean motion, minutes.
    pub fn period_minutes(&self) -> f64 {
        TWOPI / self.near.no_unkozai
    }

    /// Mean perigee altitude above the equatorial radius at epoch, km.
    pub fn perigee_altitude_km(&self) -> f64 {
        (self.near.a * (1.0 - self.near.ecco) - 1.0) * self.gravity.radiusearthkm
    }

    /// Mean apogee altitude above the equatorial radius at epoch, km.
    pub fn apogee_altitude_km(&self) -> f64 {
        (self.near.a * (1.0 + self.near.ecco) - 1.0) * self.gravity.radiusearthkm
    }

    /// State at an absolute time.
    pub fn propagate(&self, at: EpochTime) -> Result<StateVector> {
        let tsince = at.minutes_since(&self.elements.epoch);
        let (position, velocity) = self.teme_state(tsince)?;
        Ok(StateVector { epoch: at, position, velocity })
    }

    /// State at `tsince` minutes from the element set epoch (negative is fine).
    pub fn propagate_minutes(&self, tsince: f64) -> Result<StateVector> {
        let (position, velocity) = self.teme_state(tsince)?;
        Ok(StateVector {
            epoch: self.elements.epoch.advance(tsince * 60.0),
            position,
            velocity,
        })
    }

    /// Mean elements after the secular and resonance updates. At `tsince == 0` these
    /// reproduce the element set, with the mean motion un-Kozai'd.
    pub fn mean_elements(&self, tsince: f64) -> Result<MeanElements> {
        let m = self.mean_state(tsince)?;
        Ok(MeanElements {
            tsince,
            semi_major_axis: m.am * self.gravity.radiusearthkm,
            eccentricity: m.em,
            inclination: m.inclm,
            right_ascension: m.nodem.rem_euclid(TWOPI),
            argument_of_perigee: m.argpm.rem_euclid(TWOPI),
            mean_anomaly: m.mm.rem_euclid(TWOPI),
            mean_motion: m.nm,
        })
    }

    fn mean_state(&self, t: f64) -> Result<MeanState> {
        // the resonance integrator steps towards t and never reaches a non-finite one
        if !t.is_finite() {
            return Err(TrackError::NonFiniteTime(t));
        }

        let g = &self.gravity;
        let (mut s, drag) = self.near.secular(t);
        if let Some(ds) = &self.deep {
            s = ds.secular(t, s);
        }

        if s.nm.is_nan() || s.nm <= 0.0 {
            return Err(TrackError::InvalidSemiMajorAxis {
                tsince: t,
                quantity: "mean motion",
                value: s.nm,
            });
        }

        let am = (g.xke / s.nm).powf(X2O3) * drag.tempa * drag.tempa;
        let nm = g.xke / am.powf(1.5);
        let mut em = s.em - drag.tempe;

        if em >= 1.0 || em < -0.001 {
            return Err(TrackError::InvalidEccentricity { tsince: t, eccentricity: em });
        }
        if em < 1.0e-6 {
            em = 1.0e-6;
        }

        let mm = s.mm + self.near.no_unkozai * drag.templ;
        let xlm = (mm + s.argpm + s.nodem) % TWOPI;
        let nodem = s.nodem % TWOPI;
        let argpm = s.argpm % TWOPI;

        Ok(MeanState {
            am,
            em,
            inclm: s.inclm,
            nodem,
            argpm,
            mm: (xlm - argpm - nodem) % TWOPI,
            nm,
        })
    }

    fn teme_state(&self, t: f64) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let g = &self.gravity;
        let m = self.mean_state(t)?;

        let perigee = m.am * (1.0 - m.em);
        if perigee < 1.0 {
            return Err(TrackError::DecayedOrbit { tsince: t, radius_km: perigee * g.radiusearthkm });
        }

        let mut ep = m.em;
        let mut xincp = m.inclm;
        let mut nodep = m.nodem;
        let mut argpp = m.argpm;
        let mut mp = m.mm;
        let mut con41 = self.near.con41;
        let mut x1mth2 = self.near.x1mth2;
        let mut x7thm1 = self.near.x7thm1;
        let mut aycof = self.near.aycof;
        let mut xlcof = self.near.xlcof;

        if let Some(ds) = &self.deep {
            [ep, xincp, nodep, argpp, mp] = ds.periodics(t, self.opsmode, [ep, xincp, nodep, argpp, mp]);
            if xincp < 0.0 {
                xincp = -xincp;
                nodep += PI;
                argpp -= PI;
            }
            if !(0.0..=1.0).contains(&ep) {
                return Err(TrackError::InvalidEccentricity { tsince: t, eccentricity: ep });
            }

            // long-period and short-period coefficients follow the perturbed inclination
            let (sinip, cosip) = xincp.sin_cos();
            let cosisq = cosip * cosip;
            aycof = -0.5 * g.j3oj2 * sinip;
            let den = if (cosip + 1.0).abs() > 1.5e-12 { 1.0 + cosip } else { 1.5e-12 };
            xlcof = -0.25 * g.j3oj2 * sinip * (3.0 + 5.0 * cosip) / den;
            con41 = 3.0 * cosisq - 1.0;
            x1mth2 = 1.0 - cosisq;
            x7thm1 = 7.0 * cosisq - 1.0;
        }

        //--- long-period periodics
        let axnl = ep * argpp.cos();
        let temp = 1.0 / (m.am * (1.0 - ep * ep));
        let aynl = ep * argpp.sin() + temp * aycof;
        let xl = mp + argpp + nodep + temp * xlcof * axnl;

        //--- Kepler's equation
        let u = (xl - nodep) % TWOPI;
        let (sineo1, coseo1) = solve_kepler(u, axnl, aynl).map_err(|(iterations, residual)| {
            TrackError::KeplerNonConvergence { tsince: t, iterations, residual }
        })?;

        //--- short-period periodics
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = m.am * (1.0 - el2);
        if pl < 0.0 {
            return Err(TrackError::InvalidSemiMajorAxis {
                tsince: t,
                quantity: "semi-latus rectum",
                value: pl,
            });
        }

        let rl = m.am * (1.0 - ecose);
        let rdotl = m.am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = m.am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = m.am / rl * (coseo1 - axnl + aynl * temp);
        let mut su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * g.j2 * temp;
        let temp2 = temp1 * temp;

        let (sinip, cosip) = xincp.sin_cos();
        let mrt = rl * (1.0 - 1.5 * temp2 * betal * con41) + 0.5 * temp1 * x1mth2 * cos2u;
        su -= 0.25 * temp2 * x7thm1 * sin2u;
        let xnode = nodep + 1.5 * temp2 * cosip * sin2u;
        let xinc = xincp + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - m.nm * temp1 * x1mth2 * sin2u / g.xke;
        let rvdot = rvdotl + m.nm * temp1 * (x1mth2 * cos2u + 1.5 * con41) / g.xke;

        if mrt < 1.0 {
            return Err(TrackError::DecayedOrbit { tsince: t, radius_km: mrt * g.radiusearthkm });
        }

        //--- orientation vectors
        let (sinsu, cossu) = su.sin_cos();
        let (snod, cnod) = xnode.sin_cos();
        let (sini, cosi) = xinc.sin_cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let uu = Vector3::new(xmx * sinsu + cnod * cossu, xmy * sinsu + snod * cossu, sini * sinsu);
        let vv = Vector3::new(xmx * cossu - cnod * sinsu, xmy * cossu - snod * sinsu, sini * cossu);

        let vkmpersec = g.radiusearthkm * g.xke / 60.0;
        let position = uu * (mrt * g.radiusearthkm);
        let velocity = (uu * mvt + vv * rvdot) * vkmpersec;

        Ok((position, velocity))
    }
}

/// Solve the modified Kepler equation for `(sin E+ω, cos E+ω)`.
/// On failure returns the iteration count and last correction.
fn solve_kepler(u: f64, axnl: f64, aynl: f64) -> std::result::Result<(f64, f64), (usize, f64)> {
    let mut eo1 = u;
    let mut tem5 = f64::INFINITY;

    for _ in 0..MAX_KEPLER_ITERATIONS {
        let (sineo1, coseo1) = eo1.sin_cos();
        tem5 = 1.0 - coseo1 * axnl - sineo1 * aynl;
        tem5 = (u - aynl * coseo1 + axnl * sineo1 - eo1) / tem5;
        tem5 = tem5.clamp(-KEPLER_MAX_STEP, KEPLER_MAX_STEP);
        eo1 += tem5;
        if tem5.abs() < KEPLER_TOLERANCE {
            return Ok(eo1.sin_cos());
        }
    }

    Err((MAX_KEPLER_ITERATIONS, tem5))
}

/// Propagate `elements` to `at` with the default WGS-72 constants.
pub fn propagate(elements: &OrbitalElementSet, at: EpochTime) -> Result<StateVector> {
    Propagator::new(elements)?.propagate(at)
}
