//! Epoch setup shared by every orbit, plus the near-earth secular and drag terms.

use crate::earth_gravity::{EarthGravity, OpsMode};
use crate::errors::{Result, TrackError};
use crate::time::{gmst, TWOPI};
use crate::tle::OrbitalElementSet;

use super::deep_space::Secular;

pub(crate) const X2O3: f64 = 2.0 / 3.0;

/// Orbits at or above this period (minutes) use the deep-space terms.
pub const DEEP_SPACE_PERIOD: f64 = 225.0;

/// Below this perigee altitude (km) the higher-order drag terms are dropped.
pub const SIMPLIFIED_DRAG_PERIGEE: f64 = 220.0;

/// Higher-order atmospheric drag terms.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HigherOrderDrag {
    cc5: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
    omgcof: f64,
    xmcof: f64,
    delmo: f64,
    sinmao: f64,
}

/// Drag polynomials applied to semi-major axis, eccentricity and mean longitude.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DragFactors {
    pub tempa: f64,
    pub tempe: f64,
    pub templ: f64,
}

/// Epoch elements and the coefficients derived from them.
#[derive(Debug, Clone)]
pub(crate) struct NearEarth {
    pub ecco: f64,
    pub inclo: f64,
    pub nodeo: f64,
    pub argpo: f64,
    pub mo: f64,
    pub bstar: f64,
    /// Brouwer mean motion, rad/min.
    pub no_unkozai: f64,
    /// Semi-major axis, earth radii.
    pub a: f64,
    pub gsto: f64,
    pub con41: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub xlcof: f64,
    pub aycof: f64,
    pub mdot: f64,
    pub argpdot: f64,
    pub nodedot: f64,
    eta: f64,
    cc1: f64,
    cc4: f64,
    nodecf: f64,
    t2cof: f64,
    pub drag: Option<HigherOrderDrag>,
}

/// Greenwich sidereal angle at epoch as computed by the original AFSPC code.
fn gstime_afspc(epoch_1950: f64) -> f64 {
    const C1: f64 = 1.720_279_169_407_036_39e-2;
    const THGR70: f64 = 1.732_134_385_650_937_4;
    const FK5R: f64 = 5.075_514_194_322_694_42e-15;

    let ts70 = epoch_1950 - 7305.0;
    let ds70 = (ts70 + 1.0e-8).floor();
    let tfrac = ts70 - ds70;
    let c1p2p = C1 + TWOPI;
    (THGR70 + C1 * ds70 + c1p2p * tfrac + ts70 * ts70 * FK5R).rem_euclid(TWOPI)
}

impl NearEarth {
    pub fn new(elements: &OrbitalElementSet, g: &EarthGravity, opsmode: OpsMode) -> Result<Self> {
        let ecco = elements.eccentricity;
        let inclo = elements.inclination;
        let argpo = elements.argument_of_perigee;
        let mo = elements.mean_anomaly;
        let bstar = elements.bstar;
        let no_kozai = elements.mean_motion;

        if !(0.0..1.0).contains(&ecco) {
            return Err(TrackError::InvalidEccentricity { tsince: 0.0, eccentricity: ecco });
        }
        if !(no_kozai > 0.0) {
            return Err(TrackError::InvalidSemiMajorAxis {
                tsince: 0.0,
                quantity: "mean motion",
                value: no_kozai,
            });
        }

        let ss = 78.0 / g.radiusearthkm + 1.0;
        let qzms2t = ((120.0 - 78.0) / g.radiusearthkm).powi(4);

        // recover the Brouwer mean motion from the Kozai value in the TLE
        let eccsq = ecco * ecco;
        let omeosq = 1.0 - eccsq;
        let rteosq = omeosq.sqrt();
        let (sinio, cosio) = inclo.sin_cos();
        let cosio2 = cosio * cosio;

        let ak = (g.xke / no_kozai).powf(X2O3);
        let d1 = 0.75 * g.j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
        let del = d1 / (ak * ak);
        let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
        let del = d1 / (adel * adel);
        let no_unkozai = no_kozai / (1.0 + del);

        let ao = (g.xke / no_unkozai).powf(X2O3);
        let po = ao * omeosq;
        let con42 = 1.0 - 5.0 * cosio2;
        let con41 = -con42 - cosio2 - cosio2;
        let posq = po * po;
        let rp = ao * (1.0 - ecco);

        let gsto = match opsmode {
            OpsMode::Afspc => gstime_afspc(elements.epoch.days_since_1950()),
            OpsMode::Improved => gmst(elements.epoch),
        };

        let a = (no_unkozai * g.tumin).powf(-X2O3);

        // atmospheric density parameter s, adjusted for low perigees
        let perige = (rp - 1.0) * g.radiusearthkm;
        let (sfour, qzms24) = if perige < 156.0 {
            let sfour = if perige < 98.0 { 20.0 } else { perige - 78.0 };
            (sfour / g.radiusearthkm + 1.0, ((120.0 - sfour) / g.radiusearthkm).powi(4))
        } else {
            (ss, qzms2t)
        };

        let pinvsq = 1.0 / posq;
        let tsi = 1.0 / (ao - sfour);
        let eta = ao * ecco * tsi;
        let etasq = eta * eta;
        let eeta = ecco * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qzms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);
        let cc2 = coef1
            * no_unkozai
            * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.375 * g.j2 * tsi / psisq * con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let cc1 = bstar * cc2;
        let cc3 = if ecco > 1.0e-4 {
            -2.0 * coef * tsi * g.j3oj2 * no_unkozai * sinio / ecco
        } else {
            0.0
        };
        let x1mth2 = 1.0 - cosio2;
        let cc4 = 2.0
            * no_unkozai
            * coef1
            * ao
            * omeosq
            * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
                - g.j2 * tsi / (ao * psisq)
                    * (-3.0 * con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * (2.0 * argpo).cos()));
        let cc5 = 2.0 * coef1 * ao * omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let cosio4 = cosio2 * cosio2;
        let temp1 = 1.5 * g.j2 * pinvsq * no_unkozai;
        let temp2 = 0.5 * temp1 * g.j2 * pinvsq;
        let temp3 = -0.46875 * g.j4 * pinvsq * pinvsq * no_unkozai;
        let mdot = no_unkozai
            + 0.5 * temp1 * rteosq * con41
            + 0.0625 * temp2 * rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
        let argpdot = -0.5 * temp1 * con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
        let xhdot1 = -temp1 * cosio;
        let nodedot = xhdot1 + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;

        let xlcof = if (cosio + 1.0).abs() > 1.5e-12 {
            -0.25 * g.j3oj2 * sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio)
        } else {
            -0.25 * g.j3oj2 * sinio * (3.0 + 5.0 * cosio) / 1.5e-12
        };

        let deep_space = TWOPI / no_unkozai >= DEEP_SPACE_PERIOD;
        let simplified = rp < SIMPLIFIED_DRAG_PERIGEE / g.radiusearthkm + 1.0;

        let drag = (!deep_space && !simplified).then(|| {
            let cc1sq = cc1 * cc1;
            let d2 = 4.0 * ao * tsi * cc1sq;
            let temp = d2 * tsi * cc1 / 3.0;
            let d3 = (17.0 * ao + sfour) * temp;
            let d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
            HigherOrderDrag {
                cc5,
                d2,
                d3,
                d4,
                t3cof: d2 + 2.0 * cc1sq,
                t4cof: 0.25 * (3.0 * d3 + cc1 * (12.0 * d2 + 10.0 * cc1sq)),
                t5cof: 0.2 * (3.0 * d4 + 12.0 * cc1 * d3 + 6.0 * d2 * d2 + 15.0 * cc1sq * (2.0 * d2 + cc1sq)),
                omgcof: bstar * cc3 * argpo.cos(),
                xmcof: if ecco > 1.0e-4 { -X2O3 * coef * bstar / eeta } else { 0.0 },
                delmo: (1.0 + eta * mo.cos()).powi(3),
                sinmao: mo.sin(),
            }
        });

        Ok(NearEarth {
            ecco,
            inclo,
            nodeo: elements.right_ascension,
            argpo,
            mo,
            bstar,
            no_unkozai,
            a,
            gsto,
            con41,
            x1mth2,
            x7thm1: 7.0 * cosio2 - 1.0,
            xlcof,
            aycof: -0.5 * g.j3oj2 * sinio,
            mdot,
            argpdot,
            nodedot,
            eta,
            cc1,
            cc4,
            nodecf: 3.5 * omeosq * xhdot1 * cc1,
            t2cof: 1.5 * cc1,
            drag,
        })
    }

    pub fn is_deep_space(&self) -> bool {
        TWOPI / self.no_unkozai >= DEEP_SPACE_PERIOD
    }

    /// Gravity and drag secular effects at `t` minutes since epoch.
    pub fn secular(&self, t: f64) -> (Secular, DragFactors) {
        let xmdf = self.mo + self.mdot * t;
        let argpdf = self.argpo + self.argpdot * t;
        let nodedf = self.nodeo + self.nodedot * t;
        let t2 = t * t;

        let mut s = Secular {
            em: self.ecco,
            argpm: argpdf,
            inclm: self.inclo,
            mm: xmdf,
            nodem: nodedf + self.nodecf * t2,
            nm: self.no_unkozai,
        };
        let mut f = DragFactors {
            tempa: 1.0 - self.cc1 * t,
            tempe: self.bstar * self.cc4 * t,
            templ: self.t2cof * t2,
        };

        if let Some(d) = &self.drag {
            let delomg = d.omgcof * t;
            let delm = d.xmcof * ((1.0 + self.eta * xmdf.cos()).powi(3) - d.delmo);
            let temp = delomg + delm;
            s.mm = xmdf + temp;
            s.argpm = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            f.tempa -= d.d2 * t2 + d.d3 * t3 + d.d4 * t4;
            f.tempe += self.bstar * d.cc5 * (s.mm.sin() - d.sinmao);
            f.templ += d.t3cof * t3 + t4 * (d.t4cof + t * d.t5cof);
        }

        (s, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earth_gravity::GravityModel;

    const LINE1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const LINE2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    fn approx(expected: f64, got: f64, eps: f64) {
        let diff = (expected - got).abs();
        assert!(diff <= eps, "expected {expected}, got {got} (|Δ| = {diff}, eps = {eps})");
    }

    #[test]
    fn brouwer_mean_motion_is_slightly_below_kozai() {
        let els = OrbitalElementSet::from_lines(LINE1, LINE2).unwrap();
        let g = GravityModel::Wgs72.constants();
        let ne = NearEarth::new(&els, &g, OpsMode::Improved).unwrap();

        approx(els.mean_motion, 0.047_229_445_440_778_57, 1.0e-12);
        assert!(ne.no_unkozai < els.mean_motion);
        approx(ne.no_unkozai, els.mean_motion, 1.0e-4);
        assert!(!ne.is_deep_space());
        assert!(ne.drag.is_some());
    }

    #[test]
    fn secular_terms_vanish_at_epoch() {
        let els = OrbitalElementSet::from_lines(LINE1, LINE2).unwrap();
        let g = GravityModel::Wgs72.constants();
        let ne = NearEarth::new(&els, &g, OpsMode::Improved).unwrap();

        let (s, f) = ne.secular(0.0);
        assert_eq!(s.mm, els.mean_anomaly);
        assert_eq!(s.argpm, els.argument_of_perigee);
        assert_eq!(s.nodem, els.right_ascension);
        assert_eq!(f.tempa, 1.0);
        assert_eq!(f.tempe, 0.0);
        assert_eq!(f.templ, 0.0);
    }

    #[test]
    fn afspc_sidereal_time_tracks_iau_82() {
        let els = OrbitalElementSet::from_lines(LINE1, LINE2).unwrap();
        let afspc = gstime_afspc(els.epoch.days_since_1950());
        let iau = gmst(els.epoch);
        approx(afspc, iau, 1.0e-4);
    }

    #[test]
    fn rejects_hyperbolic_elements() {
        let mut els = OrbitalElementSet::from_lines(LINE1, LINE2).unwrap();
        els.eccentricity = 1.2;
        let g = GravityModel::Wgs72.constants();
        assert!(matches!(
            NearEarth::new(&els, &g, OpsMode::Improved),
            Err(TrackError::InvalidEccentricity { .. })
        ));
    }
}
