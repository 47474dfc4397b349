//! Deep-space (SDP4) terms: lunar and solar gravity plus the 12h/24h geopotential
//! resonances, for orbits with a period of 225 minutes or more.
//!
//! Everything epoch-dependent is computed once by [`DeepSpace::new`]. Per-call work is
//! [`DeepSpace::secular`] (linear rates plus resonance integration) and
//! [`DeepSpace::periodics`] (the lunar-solar periodic corrections).

use std::f64::consts::PI;

use crate::earth_gravity::OpsMode;
use crate::time::TWOPI;

const X2O3: f64 = 2.0 / 3.0;

// solar and lunar mean motions (rad/min) and eccentricities
const ZNS: f64 = 1.19459e-5;
const ZES: f64 = 0.01675;
const ZNL: f64 = 1.5835218e-4;
const ZEL: f64 = 0.05490;

// earth rotation rate, rad/min
const RPTIM: f64 = 4.375_269_088_011_299_66e-3;

// resonance integrator step (min) and half its square
const STEPP: f64 = 720.0;
const STEPN: f64 = -720.0;
const STEP2: f64 = 259_200.0;

/// Which geopotential resonance the orbit is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resonance {
    None,
    /// 24h orbits (geosynchronous).
    Synchronous,
    /// 12h orbits with e >= 0.5 (Molniya-type).
    HalfDay,
}

/// One body's contribution to the periodic terms. Coefficient names follow the
/// element they perturb: e(ccentricity), i(nclination), l (mean longitude),
/// gh (argument of perigee) and h (node).
#[derive(Debug, Clone, Copy)]
struct PeriodicCoefficients {
    zmo: f64,
    zn: f64,
    ze: f64,
    e2: f64,
    e3: f64,
    i2: f64,
    i3: f64,
    l2: f64,
    l3: f64,
    l4: f64,
    gh2: f64,
    gh3: f64,
    gh4: f64,
    h2: f64,
    h3: f64,
}

impl PeriodicCoefficients {
    fn new(tb: &ThirdBody, emsq: f64, zmo: f64, zn: f64, ze: f64) -> Self {
        PeriodicCoefficients {
            zmo,
            zn,
            ze,
            e2: 2.0 * tb.s1 * tb.s6,
            e3: 2.0 * tb.s1 * tb.s7,
            i2: 2.0 * tb.s2 * tb.z12,
            i3: 2.0 * tb.s2 * (tb.z13 - tb.z11),
            l2: -2.0 * tb.s3 * tb.z2,
            l3: -2.0 * tb.s3 * (tb.z3 - tb.z1),
            l4: -2.0 * tb.s3 * (-21.0 - 9.0 * emsq) * ze,
            gh2: 2.0 * tb.s4 * tb.z32,
            gh3: 2.0 * tb.s4 * (tb.z33 - tb.z31),
            gh4: -18.0 * tb.s4 * ze,
            h2: -2.0 * tb.s2 * tb.z22,
            h3: -2.0 * tb.s2 * (tb.z23 - tb.z21),
        }
    }

    /// `[pe, pinc, pl, pgh, ph]` at `t` minutes since epoch.
    fn at(&self, t: f64) -> [f64; 5] {
        let zm = self.zmo + self.zn * t;
        let zf = zm + 2.0 * self.ze * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();

        [
            self.e2 * f2 + self.e3 * f3,
            self.i2 * f2 + self.i3 * f3,
            self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            self.h2 * f2 + self.h3 * f3,
        ]
    }
}

/// Intermediate third-body quantities of the orbit relative to the sun or the moon.
#[derive(Debug, Clone, Copy, Default)]
struct ThirdBody {
    s1: f64,
    s2: f64,
    s3: f64,
    s4: f64,
    s5: f64,
    s6: f64,
    s7: f64,
    z1: f64,
    z2: f64,
    z3: f64,
    z11: f64,
    z12: f64,
    z13: f64,
    z21: f64,
    z22: f64,
    z23: f64,
    z31: f64,
    z32: f64,
    z33: f64,
}

/// Orientation of the satellite orbit, shared by both third-body evaluations.
struct OrbitGeometry {
    em: f64,
    emsq: f64,
    betasq: f64,
    rtemsq: f64,
    sinim: f64,
    cosim: f64,
    sinomm: f64,
    cosomm: f64,
    xnoi: f64,
}

impl ThirdBody {
    /// `(zcosg, zsing)`, `(zcosi, zsini)` and `(zcosh, zsinh)` orient the perturbing body,
    /// `cc` is its gravitational coefficient.
    fn new(
        orbit: &OrbitGeometry,
        (zcosg, zsing): (f64, f64),
        (zcosi, zsini): (f64, f64),
        (zcosh, zsinh): (f64, f64),
        cc: f64,
    ) -> Self {
        let OrbitGeometry { em, emsq, betasq, rtemsq, sinim, cosim, sinomm, cosomm, xnoi } = *orbit;

        let a1 = zcosg * zcosh + zsing * zcosi * zsinh;
        let a3 = -zsing * zcosh + zcosg * zcosi * zsinh;
        let a7 = -zcosg * zsinh + zsing * zcosi * zcosh;
        let a8 = zsing * zsini;
        let a9 = zsing * zsinh + zcosg * zcosi * zcosh;
        let a10 = zcosg * zsini;
        let a2 = cosim * a7 + sinim * a8;
        let a4 = cosim * a9 + sinim * a10;
        let a5 = -sinim * a7 + cosim * a8;
        let a6 = -sinim * a9 + cosim * a10;

        let x1 = a1 * cosomm + a2 * sinomm;
        let x2 = a3 * cosomm + a4 * sinomm;
        let x3 = -a1 * sinomm + a2 * cosomm;
        let x4 = -a3 * sinomm + a4 * cosomm;
        let x5 = a5 * sinomm;
        let x6 = a6 * sinomm;
        let x7 = a5 * cosomm;
        let x8 = a6 * cosomm;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        let z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        let z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);

        let s3 = cc * xnoi;
        let s4 = s3 * rtemsq;

        ThirdBody {
            s1: -15.0 * em * s4,
            s2: -0.5 * s3 / rtemsq,
            s3,
            s4,
            s5: x1 * x3 + x2 * x4,
            s6: x2 * x3 + x1 * x4,
            s7: x2 * x4 - x1 * x3,
            z1: z1 + z1 + betasq * z31,
            z2: z2 + z2 + betasq * z32,
            z3: z3 + z3 + betasq * z33,
            z11,
            z12,
            z13,
            z21,
            z22,
            z23,
            z31,
            z32,
            z33,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ResonanceTerms {
    None,
    Synchronous {
        del1: f64,
        del2: f64,
        del3: f64,
    },
    HalfDay {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
    },
}

/// Inputs the deep-space initialization needs from the near-earth setup.
pub(crate) struct DeepSpaceInit {
    pub epoch_1950: f64,
    pub xke: f64,
    pub gsto: f64,
    pub ecco: f64,
    pub inclo: f64,
    pub nodeo: f64,
    pub argpo: f64,
    pub mo: f64,
    pub no: f64,
    pub mdot: f64,
    pub argpdot: f64,
    pub nodedot: f64,
}

/// Epoch-fixed deep-space coefficients.
#[derive(Debug, Clone)]
pub(crate) struct DeepSpace {
    solar: PeriodicCoefficients,
    lunar: PeriodicCoefficients,
    dedt: f64,
    didt: f64,
    dmdt: f64,
    dnodt: f64,
    domdt: f64,
    resonance: ResonanceTerms,
    xfact: f64,
    xlamo: f64,
    gsto: f64,
    no: f64,
    argpo: f64,
    argpdot: f64,
}

/// Mean elements carried through the secular update.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Secular {
    pub em: f64,
    pub argpm: f64,
    pub inclm: f64,
    pub mm: f64,
    pub nodem: f64,
    pub nm: f64,
}

impl DeepSpace {
    pub fn new(init: &DeepSpaceInit) -> Self {
        const C1SS: f64 = 2.986_479_7e-6;
        const C1L: f64 = 4.796_806_5e-7;
        const ZSINIS: f64 = 0.397_854_16;
        const ZCOSIS: f64 = 0.917_448_67;
        const ZCOSGS: f64 = 0.194_590_5;
        const ZSINGS: f64 = -0.980_884_58;

        let em = init.ecco;
        let emsq = em * em;
        let betasq = 1.0 - emsq;
        let (snodm, cnodm) = init.nodeo.sin_cos();
        let (sinim, cosim) = init.inclo.sin_cos();
        let (sinomm, cosomm) = init.argpo.sin_cos();
        let orbit = OrbitGeometry {
            em,
            emsq,
            betasq,
            rtemsq: betasq.sqrt(),
            sinim,
            cosim,
            sinomm,
            cosomm,
            xnoi: 1.0 / init.no,
        };

        // lunar orbit orientation at epoch
        let day = init.epoch_1950 + 18_261.5;
        let xnodce = (4.523_602_0 - 9.242_202_9e-4 * day) % TWOPI;
        let (stem, ctem) = xnodce.sin_cos();
        let zcosil = 0.913_751_64 - 0.035_680_96 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089_683_511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let gam = 5.835_151_4 + 0.001_944_368_0 * day;
        let zx = (0.397_854_16 * stem / zsinil).atan2(zcoshl * ctem + 0.917_448_67 * zsinhl * stem);
        let zx = gam + zx - xnodce;

        let sun = ThirdBody::new(&orbit, (ZCOSGS, ZSINGS), (ZCOSIS, ZSINIS), (cnodm, snodm), C1SS);
        let moon = ThirdBody::new(
            &orbit,
            (zx.cos(), zx.sin()),
            (zcosil, zsinil),
            (zcoshl * cnodm + zsinhl * snodm, snodm * zcoshl - cnodm * zsinhl),
            C1L,
        );

        let zmol = (4.719_967_2 + 0.229_971_50 * day - gam) % TWOPI;
        let zmos = (6.256_583_7 + 0.017_201_977 * day) % TWOPI;

        let solar = PeriodicCoefficients::new(&sun, emsq, zmos, ZNS, ZES);
        let lunar = PeriodicCoefficients::new(&moon, emsq, zmol, ZNL, ZEL);

        //--- secular rates
        let near_equatorial = init.inclo < 5.235_987_7e-2 || init.inclo > PI - 5.235_987_7e-2;

        let ses = sun.s1 * ZNS * sun.s5;
        let sis = sun.s2 * ZNS * (sun.z11 + sun.z13);
        let sls = -ZNS * sun.s3 * (sun.z1 + sun.z3 - 14.0 - 6.0 * emsq);
        let sghs = sun.s4 * ZNS * (sun.z31 + sun.z33 - 6.0);
        let mut shs = if near_equatorial { 0.0 } else { -ZNS * sun.s2 * (sun.z21 + sun.z23) };
        if sinim != 0.0 {
            shs /= sinim;
        }
        let sgs = sghs - cosim * shs;

        let dedt = ses + moon.s1 * ZNL * moon.s5;
        let didt = sis + moon.s2 * ZNL * (moon.z11 + moon.z13);
        let dmdt = sls - ZNL * moon.s3 * (moon.z1 + moon.z3 - 14.0 - 6.0 * emsq);
        let sghl = moon.s4 * ZNL * (moon.z31 + moon.z33 - 6.0);
        let shll = if near_equatorial { 0.0 } else { -ZNL * moon.s2 * (moon.z21 + moon.z23) };
        let mut domdt = sgs + sghl;
        let mut dnodt = shs;
        if sinim != 0.0 {
            domdt -= cosim / sinim * shll;
            dnodt += shll / sinim;
        }

        //--- resonances
        let nm = init.no;
        let theta = init.gsto % TWOPI;
        let aonv = (nm / init.xke).powf(X2O3);
        let xpidot = init.argpdot + init.nodedot;

        let (resonance, xfact, xlamo) = if nm > 0.003_490_658_5 && nm < 0.005_235_987_7 {
            const Q22: f64 = 1.789_167_9e-6;
            const Q31: f64 = 2.146_074_8e-6;
            const Q33: f64 = 2.212_301_5e-7;

            let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
            let g310 = 1.0 + 2.0 * emsq;
            let g300 = 1.0 + emsq * (-6.0 + 6.609_37 * emsq);
            let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
            let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
            let f330 = 1.875 * (1.0 + cosim) * (1.0 + cosim) * (1.0 + cosim);
            let del1 = 3.0 * nm * nm * aonv * aonv;

            let terms = ResonanceTerms::Synchronous {
                del1: del1 * f311 * g310 * Q31 * aonv,
                del2: 2.0 * del1 * f220 * g200 * Q22,
                del3: 3.0 * del1 * f330 * g300 * Q33 * aonv,
            };
            let xlamo = (init.mo + init.nodeo + init.argpo - theta) % TWOPI;
            let xfact = init.mdot + xpidot - RPTIM + dmdt + domdt + dnodt - init.no;
            (terms, xfact, xlamo)
        } else if (8.26e-3..=9.24e-3).contains(&nm) && em >= 0.5 {
            let terms = half_day_terms(init.ecco, sinim, cosim, nm, aonv);
            let xlamo = (init.mo + init.nodeo + init.nodeo - theta - theta) % TWOPI;
            let xfact = init.mdot + dmdt + 2.0 * (init.nodedot + dnodt - RPTIM) - init.no;
            (terms, xfact, xlamo)
        } else {
            (ResonanceTerms::None, 0.0, 0.0)
        };

        DeepSpace {
            solar,
            lunar,
            dedt,
            didt,
            dmdt,
            dnodt,
            domdt,
            resonance,
            xfact,
            xlamo,
            gsto: init.gsto,
            no: init.no,
            argpo: init.argpo,
            argpdot: init.argpdot,
        }
    }

    pub fn resonance(&self) -> Resonance {
        match self.resonance {
            ResonanceTerms::None => Resonance::None,
            ResonanceTerms::Synchronous { .. } => Resonance::Synchronous,
            ResonanceTerms::HalfDay { .. } => Resonance::HalfDay,
        }
    }

    /// Apply the deep-space secular rates and, for resonant orbits, integrate the
    /// resonance terms from epoch to `t`.
    ///
    /// The integration restarts from epoch on every call: O(|t| / 720 min) steps.
    pub fn secular(&self, t: f64, mut s: Secular) -> Secular {
        let theta = (self.gsto + t * RPTIM) % TWOPI;
        s.em += self.dedt * t;
        s.inclm += self.didt * t;
        s.argpm += self.domdt * t;
        s.nodem += self.dnodt * t;
        s.mm += self.dmdt * t;

        if matches!(self.resonance, ResonanceTerms::None) {
            return s;
        }

        let delt = if t > 0.0 { STEPP } else { STEPN };
        let mut atime = 0.0;
        let mut xni = self.no;
        let mut xli = self.xlamo;

        let (xndt, xldot, xnddt, ft) = loop {
            let (xndt, xldot, xnddt) = self.resonance_rates(atime, xli, xni);
            if (t - atime).abs() < STEPP {
                break (xndt, xldot, xnddt, t - atime);
            }
            xli += xldot * delt + xndt * STEP2;
            xni += xndt * delt + xnddt * STEP2;
            atime += delt;
        };

        s.nm = xni + xndt * ft + xnddt * ft * ft * 0.5;
        let xl = xli + xldot * ft + xndt * ft * ft * 0.5;
        s.mm = match self.resonance {
            ResonanceTerms::Synchronous { .. } => xl - s.nodem - s.argpm + theta,
            _ => xl - 2.0 * s.nodem + 2.0 * theta,
        };
        s
    }

    /// `(ṅ, λ̇, n̈)` of the resonance integrator.
    fn resonance_rates(&self, atime: f64, xli: f64, xni: f64) -> (f64, f64, f64) {
        const FASX2: f64 = 0.131_309_08;
        const FASX4: f64 = 2.884_319_8;
        const FASX6: f64 = 0.374_480_87;
        const G22: f64 = 5.768_639_6;
        const G32: f64 = 0.952_408_98;
        const G44: f64 = 1.801_499_8;
        const G52: f64 = 1.050_833_0;
        const G54: f64 = 4.410_889_8;

        let xldot = xni + self.xfact;

        match self.resonance {
            ResonanceTerms::None => (0.0, xldot, 0.0),
            ResonanceTerms::Synchronous { del1, del2, del3 } => {
                let xndt = del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin();
                let xnddt = del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos();
                (xndt, xldot, xnddt * xldot)
            }
            ResonanceTerms::HalfDay { d2201, d2211, d3210, d3222, d4410, d4422, d5220, d5232, d5421, d5433 } => {
                let xomi = self.argpo + self.argpdot * atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                let xndt = d2201 * (x2omi + xli - G22).sin()
                    + d2211 * (xli - G22).sin()
                    + d3210 * (xomi + xli - G32).sin()
                    + d3222 * (-xomi + xli - G32).sin()
                    + d4410 * (x2omi + x2li - G44).sin()
                    + d4422 * (x2li - G44).sin()
                    + d5220 * (xomi + xli - G52).sin()
                    + d5232 * (-xomi + xli - G52).sin()
                    + d5421 * (xomi + x2li - G54).sin()
                    + d5433 * (-xomi + x2li - G54).sin();
                let xnddt = d2201 * (x2omi + xli - G22).cos()
                    + d2211 * (xli - G22).cos()
                    + d3210 * (xomi + xli - G32).cos()
                    + d3222 * (-xomi + xli - G32).cos()
                    + d5220 * (xomi + xli - G52).cos()
                    + d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d4410 * (x2omi + x2li - G44).cos()
                            + d4422 * (x2li - G44).cos()
                            + d5421 * (xomi + x2li - G54).cos()
                            + d5433 * (-xomi + x2li - G54).cos());
                (xndt, xldot, xnddt * xldot)
            }
        }
    }

    /// Lunar-solar periodic corrections to `(ep, inclp, nodep, argpp, mp)` at `t`.
    pub fn periodics(&self, t: f64, opsmode: OpsMode, elements: [f64; 5]) -> [f64; 5] {
        let [mut ep, mut inclp, mut nodep, mut argpp, mut mp] = elements;

        let s = self.solar.at(t);
        let l = self.lunar.at(t);
        let [pe, pinc, pl, pgh, ph] = [s[0] + l[0], s[1] + l[1], s[2] + l[2], s[3] + l[3], s[4] + l[4]];

        inclp += pinc;
        ep += pe;
        let (sinip, cosip) = inclp.sin_cos();

        if inclp >= 0.2 {
            let ph = ph / sinip;
            argpp += pgh - cosip * ph;
            nodep += ph;
            mp += pl;
        } else {
            // Lyddane modification for low inclinations
            let (sinop, cosop) = nodep.sin_cos();
            let alfdp = sinip * sinop + (ph * cosop + pinc * cosip * sinop);
            let betdp = sinip * cosop + (-ph * sinop + pinc * cosip * cosop);

            nodep %= TWOPI;
            if nodep < 0.0 && opsmode == OpsMode::Afspc {
                nodep += TWOPI;
            }
            let xls = mp + argpp + cosip * nodep + pl + pgh - pinc * nodep * sinip;
            let xnoh = nodep;
            nodep = alfdp.atan2(betdp);
            if nodep < 0.0 && opsmode == OpsMode::Afspc {
                nodep += TWOPI;
            }
            if (xnoh - nodep).abs() > PI {
                if nodep < xnoh {
                    nodep += TWOPI;
                } else {
                    nodep -= TWOPI;
                }
            }
            mp += pl;
            argpp = xls - mp - cosip * nodep;
        }

        [ep, inclp, nodep, argpp, mp]
    }
}

fn half_day_terms(ecco: f64, sinim: f64, cosim: f64, nm: f64, aonv: f64) -> ResonanceTerms {
    const ROOT22: f64 = 1.789_167_9e-6;
    const ROOT32: f64 = 3.739_379_2e-7;
    const ROOT44: f64 = 7.363_695_3e-9;
    const ROOT52: f64 = 1.142_863_9e-7;
    const ROOT54: f64 = 2.176_580_3e-9;

    let em = ecco;
    let emsq = ecco * ecco;
    let eoc = em * emsq;
    let cosisq = cosim * cosim;

    let g201 = -0.306 - (em - 0.64) * 0.440;
    let (g211, g310, g322, g410, g422, g520) = if em <= 0.65 {
        (
            3.616 - 13.2470 * em + 16.2900 * emsq,
            -19.302 + 117.3900 * em - 228.4190 * emsq + 156.5910 * eoc,
            -18.9068 + 109.7927 * em - 214.6334 * emsq + 146.5816 * eoc,
            -41.122 + 242.6940 * em - 471.0940 * emsq + 313.9530 * eoc,
            -146.407 + 841.8800 * em - 1629.014 * emsq + 1083.4350 * eoc,
            -532.114 + 3017.977 * em - 5740.032 * emsq + 3708.2760 * eoc,
        )
    } else {
        let g520 = if em > 0.715 {
            -5149.66 + 29936.92 * em - 54087.36 * emsq + 31324.56 * eoc
        } else {
            1464.74 - 4664.75 * em + 3763.64 * emsq
        };
        (
            -72.099 + 331.819 * em - 508.738 * emsq + 266.724 * eoc,
            -346.844 + 1582.851 * em - 2415.925 * emsq + 1246.113 * eoc,
            -342.585 + 1554.908 * em - 2366.899 * emsq + 1215.972 * eoc,
            -1052.797 + 4758.686 * em - 7193.992 * emsq + 3651.957 * eoc,
            -3581.690 + 16178.110 * em - 24462.770 * emsq + 12422.520 * eoc,
            g520,
        )
    };
    let (g533, g521, g532) = if em < 0.7 {
        (
            -919.22770 + 4988.61 * em - 9064.77 * emsq + 5542.21 * eoc,
            -822.71072 + 4568.6173 * em - 8491.4146 * emsq + 5337.524 * eoc,
            -853.66600 + 4690.25 * em - 8624.77 * emsq + 5341.4 * eoc,
        )
    } else {
        (
            -37995.78 + 161616.52 * em - 229838.2 * emsq + 109377.94 * eoc,
            -51752.104 + 218913.95 * em - 309468.16 * emsq + 146349.42 * eoc,
            -40023.88 + 170470.89 * em - 242699.48 * emsq + 115605.82 * eoc,
        )
    };

    let sini2 = sinim * sinim;
    let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
    let f221 = 1.5 * sini2;
    let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
    let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
    let f441 = 35.0 * sini2 * f220;
    let f442 = 39.3750 * sini2 * sini2;
    let f522 = 9.84375
        * sinim
        * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq) + 0.33333333 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
    let f523 = sinim
        * (4.92187512 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
            + 6.56250012 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
    let f542 = 29.53125 * sinim * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
    let f543 = 29.53125 * sinim * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

    let ainv2 = aonv * aonv;
    let mut temp1 = 3.0 * nm * nm * ainv2;
    let temp = temp1 * ROOT22;
    let d2201 = temp * f220 * g201;
    let d2211 = temp * f221 * g211;
    temp1 *= aonv;
    let temp = temp1 * ROOT32;
    let d3210 = temp * f321 * g310;
    let d3222 = temp * f322 * g322;
    temp1 *= aonv;
    let temp = 2.0 * temp1 * ROOT44;
    let d4410 = temp * f441 * g410;
    let d4422 = temp * f442 * g422;
    temp1 *= aonv;
    let temp = temp1 * ROOT52;
    let d5220 = temp * f522 * g520;
    let d5232 = temp * f523 * g532;
    let temp = 2.0 * temp1 * ROOT54;
    let d5421 = temp * f542 * g521;
    let d5433 = temp * f543 * g533;

    ResonanceTerms::HalfDay { d2201, d2211, d3210, d3222, d4410, d4422, d5220, d5232, d5421, d5433 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(no: f64, ecco: f64, inclo: f64) -> DeepSpaceInit {
        DeepSpaceInit {
            epoch_1950: 20_630.332_154_44,
            xke: 0.074_366_916_133_173_4,
            gsto: 1.0,
            ecco,
            inclo,
            nodeo: 4.87,
            argpo: 4.62,
            mo: 0.35,
            no,
            mdot: no,
            argpdot: 1.0e-6,
            nodedot: -1.0e-6,
        }
    }

    #[test]
    fn resonance_selection_by_mean_motion() {
        // ~1 rev/day, ~2 rev/day at high and low eccentricity, ~1.5 rev/day
        let geo = DeepSpace::new(&init(0.004_375, 0.0002, 0.001));
        let molniya = DeepSpace::new(&init(0.008_748, 0.69, 1.12));
        let gps_like = DeepSpace::new(&init(0.008_748, 0.01, 0.96));
        let between = DeepSpace::new(&init(0.0065, 0.1, 0.5));

        assert_eq!(geo.resonance(), Resonance::Synchronous);
        assert_eq!(molniya.resonance(), Resonance::HalfDay);
        assert_eq!(gps_like.resonance(), Resonance::None);
        assert_eq!(between.resonance(), Resonance::None);
    }

    #[test]
    fn secular_is_identity_at_epoch() {
        let ds = DeepSpace::new(&init(0.0065, 0.1, 0.5));
        let s0 = Secular { em: 0.1, argpm: 4.62, inclm: 0.5, mm: 0.35, nodem: 4.87, nm: 0.0065 };
        let s = ds.secular(0.0, s0);
        assert_eq!(s.em, s0.em);
        assert_eq!(s.inclm, s0.inclm);
        assert_eq!(s.nm, s0.nm);
    }

    #[test]
    fn resonance_integration_is_stateless() {
        let ds = DeepSpace::new(&init(0.008_748, 0.69, 1.12));
        let s0 = Secular { em: 0.69, argpm: 4.62, inclm: 1.12, mm: 0.35, nodem: 4.87, nm: 0.008_748 };

        let forward = ds.secular(10_000.0, s0);
        let _ = ds.secular(-3_000.0, s0);
        let again = ds.secular(10_000.0, s0);
        assert_eq!(forward.nm.to_bits(), again.nm.to_bits());
        assert_eq!(forward.mm.to_bits(), again.mm.to_bits());
    }

    #[test]
    fn periodic_corrections_stay_small() {
        let ds = DeepSpace::new(&init(0.004_375, 0.0002, 0.001));
        for t in [0.0, 720.0, 5_000.0, -1_440.0] {
            let [ep, inclp, _, _, _] = ds.periodics(t, OpsMode::Improved, [0.0002, 0.001, 4.87, 4.62, 0.35]);
            assert!((ep - 0.0002).abs() < 1.0e-3);
            assert!((inclp - 0.001).abs() < 1.0e-2);
        }
    }
}
