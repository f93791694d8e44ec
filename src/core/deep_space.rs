//! Deep-space (SDP4) perturbations: lunar and solar periodics, their secular
//! rates and the resonance terms of 12-hour and geosynchronous orbits.

use std::f64::consts::PI;

use crate::core::gravity::OpsMode;

const TWO_PI: f64 = 2.0 * PI;
const X2O3: f64 = 2.0 / 3.0;

const ZNS: f64 = 1.19459e-5;
const ZES: f64 = 0.01675;
const ZNL: f64 = 1.5835218e-4;
const ZEL: f64 = 0.05490;
const C1SS: f64 = 2.9864797e-6;
const C1L: f64 = 4.7968065e-7;
const ZSINIS: f64 = 0.39785416;
const ZCOSIS: f64 = 0.91744867;
const ZCOSGS: f64 = 0.1945905;
const ZSINGS: f64 = -0.98088458;

/// Earth rotation in rad/min.
const RPTIM: f64 = 4.37526908801129966e-3;
const STEPP: f64 = 720.0;
const STEPN: f64 = -720.0;
const STEP2: f64 = 259_200.0;

const FASX2: f64 = 0.13130908;
const FASX4: f64 = 2.8843198;
const FASX6: f64 = 0.37448087;
const G22: f64 = 5.7686396;
const G32: f64 = 0.95240898;
const G44: f64 = 1.8014998;
const G52: f64 = 1.0508330;
const G54: f64 = 4.4108898;

/// Epoch quantities the deep-space setup needs from the near-earth initialisation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EpochState {
    /// Days since 1950 Jan 0.0.
    pub epoch: f64,
    pub ecco: f64,
    pub inclo: f64,
    pub nodeo: f64,
    pub argpo: f64,
    pub mo: f64,
    pub no_unkozai: f64,
    pub xke: f64,
    pub gsto: f64,
    pub mdot: f64,
    pub argpdot: f64,
    pub nodedot: f64,
}

/// Mean elements carried through the secular update.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MeanState {
    pub em: f64,
    pub argpm: f64,
    pub inclm: f64,
    pub mm: f64,
    pub nodem: f64,
    pub nm: f64,
}

/// Osculating-side elements perturbed by the lunar/solar periodics.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PeriodicState {
    pub ep: f64,
    pub inclp: f64,
    pub nodep: f64,
    pub argpp: f64,
    pub mp: f64,
}

/// Direction-cosine coefficients of one perturbing body at epoch.
#[derive(Debug, Clone, Copy)]
struct BodyCoefficients {
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

/// Orientation of a body's orbit and the satellite's epoch orbit.
struct Geometry {
    zcosg: f64,
    zsing: f64,
    zcosi: f64,
    zsini: f64,
    zcosh: f64,
    zsinh: f64,
    cc: f64,
}

struct SatelliteAngles {
    sinim: f64,
    cosim: f64,
    sinomm: f64,
    cosomm: f64,
    em: f64,
    emsq: f64,
    betasq: f64,
    rtemsq: f64,
    xnoi: f64,
}

impl BodyCoefficients {
    fn new(g: &Geometry, s: &SatelliteAngles) -> Self {
        let a1 = g.zcosg * g.zcosh + g.zsing * g.zcosi * g.zsinh;
        let a3 = -g.zsing * g.zcosh + g.zcosg * g.zcosi * g.zsinh;
        let a7 = -g.zcosg * g.zsinh + g.zsing * g.zcosi * g.zcosh;
        let a8 = g.zsing * g.zsini;
        let a9 = g.zsing * g.zsinh + g.zcosg * g.zcosi * g.zcosh;
        let a10 = g.zcosg * g.zsini;
        let a2 = s.cosim * a7 + s.sinim * a8;
        let a4 = s.cosim * a9 + s.sinim * a10;
        let a5 = -s.sinim * a7 + s.cosim * a8;
        let a6 = -s.sinim * a9 + s.cosim * a10;

        let x1 = a1 * s.cosomm + a2 * s.sinomm;
        let x2 = a3 * s.cosomm + a4 * s.sinomm;
        let x3 = -a1 * s.sinomm + a2 * s.cosomm;
        let x4 = -a3 * s.sinomm + a4 * s.cosomm;
        let x5 = a5 * s.sinomm;
        let x6 = a6 * s.sinomm;
        let x7 = a5 * s.cosomm;
        let x8 = a6 * s.cosomm;

        let emsq = s.emsq;
        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let mut z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        let mut z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        let mut z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5) + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6) + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        z1 = z1 + z1 + s.betasq * z31;
        z2 = z2 + z2 + s.betasq * z32;
        z3 = z3 + z3 + s.betasq * z33;

        let s3 = g.cc * s.xnoi;
        let s2 = -0.5 * s3 / s.rtemsq;
        let s4 = s3 * s.rtemsq;
        let s1 = -15.0 * s.em * s4;
        let s5 = x1 * x3 + x2 * x4;
        let s6 = x2 * x3 + x1 * x4;
        let s7 = x2 * x4 - x1 * x3;

        Self { s1, s2, s3, s4, s5, s6, s7, z1, z2, z3, z11, z12, z13, z21, z22, z23, z31, z32, z33 }
    }
}

/// Long-period amplitudes of one body.
#[derive(Debug, Clone, Copy)]
struct BodyPeriodics {
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
    /// Mean anomaly of the body at epoch.
    zmo: f64,
    zn: f64,
    ze: f64,
}

struct Perturbation {
    pe: f64,
    pinc: f64,
    pl: f64,
    pgh: f64,
    ph: f64,
}

impl BodyPeriodics {
    fn new(c: &BodyCoefficients, emsq: f64, zmo: f64, zn: f64, ze: f64) -> Self {
        Self {
            e2: 2.0 * c.s1 * c.s6,
            e3: 2.0 * c.s1 * c.s7,
            i2: 2.0 * c.s2 * c.z12,
            i3: 2.0 * c.s2 * (c.z13 - c.z11),
            l2: -2.0 * c.s3 * c.z2,
            l3: -2.0 * c.s3 * (c.z3 - c.z1),
            l4: -2.0 * c.s3 * (-21.0 - 9.0 * emsq) * ze,
            gh2: 2.0 * c.s4 * c.z32,
            gh3: 2.0 * c.s4 * (c.z33 - c.z31),
            gh4: -18.0 * c.s4 * ze,
            h2: -2.0 * c.s2 * c.z22,
            h3: -2.0 * c.s2 * (c.z23 - c.z21),
            zmo,
            zn,
            ze,
        }
    }

    fn at(&self, t: f64) -> Perturbation {
        let zm = self.zmo + self.zn * t;
        let zf = zm + 2.0 * self.ze * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        Perturbation {
            pe: self.e2 * f2 + self.e3 * f3,
            pinc: self.i2 * f2 + self.i3 * f3,
            pl: self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            pgh: self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            ph: self.h2 * f2 + self.h3 * f3,
        }
    }
}

/// Secular drift of the mean elements from lunar and solar gravity, per minute.
#[derive(Debug, Clone, Copy)]
struct SecularRates {
    dedt: f64,
    didt: f64,
    dmdt: f64,
    dnodt: f64,
    domdt: f64,
}

#[derive(Debug, Clone, Copy)]
enum ResonanceTerms {
    /// One revolution per sidereal day.
    Synchronous { del1: f64, del2: f64, del3: f64 },
    /// Twelve-hour eccentric orbits.
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

#[derive(Debug, Clone, Copy)]
struct Resonance {
    terms: ResonanceTerms,
    xfact: f64,
    xlamo: f64,
    no_unkozai: f64,
    argpo: f64,
    argpdot: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResonanceKind {
    None,
    Synchronous,
    HalfDay,
}

/// Deep-space state fixed at initialisation.
#[derive(Debug, Clone)]
pub(crate) struct DeepSpace {
    solar: BodyPeriodics,
    lunar: BodyPeriodics,
    secular: SecularRates,
    resonance: Option<Resonance>,
    gsto: f64,
}

impl DeepSpace {
    pub(crate) fn new(epoch: &EpochState) -> Self {
        let snodm = epoch.nodeo.sin();
        let cnodm = epoch.nodeo.cos();
        let sinim = epoch.inclo.sin();
        let cosim = epoch.inclo.cos();
        let em = epoch.ecco;
        let emsq = em * em;
        let betasq = 1.0 - emsq;
        let angles = SatelliteAngles {
            sinim,
            cosim,
            sinomm: epoch.argpo.sin(),
            cosomm: epoch.argpo.cos(),
            em,
            emsq,
            betasq,
            rtemsq: betasq.sqrt(),
            xnoi: 1.0 / epoch.no_unkozai,
        };

        // lunar orbit orientation at epoch
        let day = epoch.epoch + 18_261.5;
        let xnodce = (4.5236020 - 9.2422029e-4 * day) % TWO_PI;
        let stem = xnodce.sin();
        let ctem = xnodce.cos();
        let zcosil = 0.91375164 - 0.03568096 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089683511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let gam = 5.8351514 + 0.0019443680 * day;
        let zx = 0.39785416 * stem / zsinil;
        let zy = zcoshl * ctem + 0.91744867 * zsinhl * stem;
        let zx = gam + zx.atan2(zy) - xnodce;

        let solar_geometry = Geometry {
            zcosg: ZCOSGS,
            zsing: ZSINGS,
            zcosi: ZCOSIS,
            zsini: ZSINIS,
            zcosh: cnodm,
            zsinh: snodm,
            cc: C1SS,
        };
        let lunar_geometry = Geometry {
            zcosg: zx.cos(),
            zsing: zx.sin(),
            zcosi: zcosil,
            zsini: zsinil,
            zcosh: zcoshl * cnodm + zsinhl * snodm,
            zsinh: snodm * zcoshl - cnodm * zsinhl,
            cc: C1L,
        };
        let sun = BodyCoefficients::new(&solar_geometry, &angles);
        let moon = BodyCoefficients::new(&lunar_geometry, &angles);

        let zmol = (4.7199672 + 0.22997150 * day - gam) % TWO_PI;
        let zmos = (6.2565837 + 0.017201977 * day) % TWO_PI;

        let secular = secular_rates(&sun, &moon, &angles, epoch.inclo);
        let resonance = Resonance::new(epoch, &angles, &secular);

        Self {
            solar: BodyPeriodics::new(&sun, emsq, zmos, ZNS, ZES),
            lunar: BodyPeriodics::new(&moon, emsq, zmol, ZNL, ZEL),
            secular,
            resonance,
            gsto: epoch.gsto,
        }
    }

    pub(crate) fn resonance_kind(&self) -> ResonanceKind {
        match self.resonance.map(|r| r.terms) {
            None => ResonanceKind::None,
            Some(ResonanceTerms::Synchronous { .. }) => ResonanceKind::Synchronous,
            Some(ResonanceTerms::HalfDay { .. }) => ResonanceKind::HalfDay,
        }
    }

    /// Applies lunar/solar secular drift and, for resonant orbits, integrates
    /// the resonance from epoch to `t` minutes.
    pub(crate) fn secular(&self, t: f64, mean: MeanState) -> MeanState {
        let rates = &self.secular;
        let mut state = MeanState {
            em: mean.em + rates.dedt * t,
            inclm: mean.inclm + rates.didt * t,
            argpm: mean.argpm + rates.domdt * t,
            nodem: mean.nodem + rates.dnodt * t,
            mm: mean.mm + rates.dmdt * t,
            nm: mean.nm,
        };
        if let Some(resonance) = &self.resonance {
            let theta = (self.gsto + t * RPTIM) % TWO_PI;
            let (nm, xl) = resonance.integrate(t);
            state.mm = match resonance.terms {
                ResonanceTerms::Synchronous { .. } => xl - state.nodem - state.argpm + theta,
                ResonanceTerms::HalfDay { .. } => xl - 2.0 * state.nodem + 2.0 * theta,
            };
            let dndt = nm - resonance.no_unkozai;
            state.nm = resonance.no_unkozai + dndt;
        }
        state
    }

    /// Adds the lunar/solar long-period periodics at `t` minutes.
    pub(crate) fn periodics(&self, t: f64, state: PeriodicState, opsmode: OpsMode) -> PeriodicState {
        let sun = self.solar.at(t);
        let moon = self.lunar.at(t);
        let pe = sun.pe + moon.pe;
        let pinc = sun.pinc + moon.pinc;
        let pl = sun.pl + moon.pl;
        let mut pgh = sun.pgh + moon.pgh;
        let mut ph = sun.ph + moon.ph;

        let inclp = state.inclp + pinc;
        let ep = state.ep + pe;
        let mut nodep = state.nodep;
        let mut argpp = state.argpp;
        let mut mp = state.mp;
        let sinip = inclp.sin();
        let cosip = inclp.cos();

        if inclp >= 0.2 {
            ph /= sinip;
            pgh -= cosip * ph;
            argpp += pgh;
            nodep += ph;
            mp += pl;
        } else {
            // Lyddane modification for low inclinations
            let sinop = nodep.sin();
            let cosop = nodep.cos();
            let mut alfdp = sinip * sinop;
            let mut betdp = sinip * cosop;
            let dalf = ph * cosop + pinc * cosip * sinop;
            let dbet = -ph * sinop + pinc * cosip * cosop;
            alfdp += dalf;
            betdp += dbet;
            nodep %= TWO_PI;
            if nodep < 0.0 && opsmode == OpsMode::Afspc {
                nodep += TWO_PI;
            }
            let mut xls = mp + argpp + cosip * nodep;
            let dls = pl + pgh - pinc * nodep * sinip;
            xls += dls;
            let xnoh = nodep;
            nodep = alfdp.atan2(betdp);
            if nodep < 0.0 && opsmode == OpsMode::Afspc {
                nodep += TWO_PI;
            }
            if (xnoh - nodep).abs() > PI {
                if nodep < xnoh {
                    nodep += TWO_PI;
                } else {
                    nodep -= TWO_PI;
                }
            }
            mp += pl;
            argpp = xls - mp - cosip * nodep;
        }

        PeriodicState { ep, inclp, nodep, argpp, mp }
    }
}

fn secular_rates(sun: &BodyCoefficients, moon: &BodyCoefficients, s: &SatelliteAngles, inclm: f64) -> SecularRates {
    let near_equatorial = inclm < 5.2359877e-2 || inclm > PI - 5.2359877e-2;

    let ses = sun.s1 * ZNS * sun.s5;
    let sis = sun.s2 * ZNS * (sun.z11 + sun.z13);
    let sls = -ZNS * sun.s3 * (sun.z1 + sun.z3 - 14.0 - 6.0 * s.emsq);
    let sghs = sun.s4 * ZNS * (sun.z31 + sun.z33 - 6.0);
    let mut shs = -ZNS * sun.s2 * (sun.z21 + sun.z23);
    if near_equatorial {
        shs = 0.0;
    }
    if s.sinim != 0.0 {
        shs /= s.sinim;
    }
    let sgs = sghs - s.cosim * shs;

    let dedt = ses + moon.s1 * ZNL * moon.s5;
    let didt = sis + moon.s2 * ZNL * (moon.z11 + moon.z13);
    let dmdt = sls - ZNL * moon.s3 * (moon.z1 + moon.z3 - 14.0 - 6.0 * s.emsq);
    let sghl = moon.s4 * ZNL * (moon.z31 + moon.z33 - 6.0);
    let mut shll = -ZNL * moon.s2 * (moon.z21 + moon.z23);
    if near_equatorial {
        shll = 0.0;
    }
    let mut domdt = sgs + sghl;
    let mut dnodt = shs;
    if s.sinim != 0.0 {
        domdt -= s.cosim / s.sinim * shll;
        dnodt += shll / s.sinim;
    }

    SecularRates { dedt, didt, dmdt, dnodt, domdt }
}

impl Resonance {
    fn new(epoch: &EpochState, s: &SatelliteAngles, rates: &SecularRates) -> Option<Self> {
        let nm = epoch.no_unkozai;
        let em = s.em;
        let synchronous = nm < 0.0052359877 && nm > 0.0034906585;
        let half_day = (8.26e-3..=9.24e-3).contains(&nm) && em >= 0.5;
        if !synchronous && !half_day {
            return None;
        }

        let theta = epoch.gsto % TWO_PI;
        let aonv = (nm / epoch.xke).powf(X2O3);
        let (sinim, cosim, emsq) = (s.sinim, s.cosim, s.emsq);

        let (terms, xlamo, xfact) = if half_day {
            let cosisq = cosim * cosim;
            let eoc = em * emsq;
            let g201 = -0.306 - (em - 0.64) * 0.440;
            let (g211, g310, g322, g410, g422, g520);
            if em <= 0.65 {
                g211 = 3.616 - 13.2470 * em + 16.2900 * emsq;
                g310 = -19.302 + 117.3900 * em - 228.4190 * emsq + 156.5910 * eoc;
                g322 = -18.9068 + 109.7927 * em - 214.6334 * emsq + 146.5816 * eoc;
                g410 = -41.122 + 242.6940 * em - 471.0940 * emsq + 313.9530 * eoc;
                g422 = -146.407 + 841.8800 * em - 1629.014 * emsq + 1083.4350 * eoc;
                g520 = -532.114 + 3017.977 * em - 5740.032 * emsq + 3708.2760 * eoc;
            } else {
                g211 = -72.099 + 331.819 * em - 508.738 * emsq + 266.724 * eoc;
                g310 = -346.844 + 1582.851 * em - 2415.925 * emsq + 1246.113 * eoc;
                g322 = -342.585 + 1554.908 * em - 2366.899 * emsq + 1215.972 * eoc;
                g410 = -1052.797 + 4758.686 * em - 7193.992 * emsq + 3651.957 * eoc;
                g422 = -3581.690 + 16178.110 * em - 24462.770 * emsq + 12422.520 * eoc;
                g520 = if em > 0.715 {
                    -5149.66 + 29936.92 * em - 54087.36 * emsq + 31324.56 * eoc
                } else {
                    1464.74 - 4664.75 * em + 3763.64 * emsq
                };
            }
            let (g533, g521, g532) = if em < 0.7 {
                (
                    -919.22770 + 4988.61 * em - 9064.77 * emsq + 5542.21 * eoc,
                    -822.71072 + 4568.6173 * em - 8491.4146 * emsq + 5337.524 * eoc,
                    -853.66600 + 4690.25 * em - 8624.77 * emsq + 5341.4 * eoc,
                )
            } else {
                (
                    -37995.780 + 161616.52 * em - 229838.20 * emsq + 109377.94 * eoc,
                    -51752.104 + 218913.95 * em - 309468.16 * emsq + 146349.42 * eoc,
                    -40023.880 + 170470.89 * em - 242699.48 * emsq + 115605.82 * eoc,
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

            let xno2 = nm * nm;
            let ainv2 = aonv * aonv;
            let mut temp1 = 3.0 * xno2 * ainv2;
            let mut temp = temp1 * 1.7891679e-6;
            let d2201 = temp * f220 * g201;
            let d2211 = temp * f221 * g211;
            temp1 *= aonv;
            temp = temp1 * 3.7393792e-7;
            let d3210 = temp * f321 * g310;
            let d3222 = temp * f322 * g322;
            temp1 *= aonv;
            temp = 2.0 * temp1 * 7.3636953e-9;
            let d4410 = temp * f441 * g410;
            let d4422 = temp * f442 * g422;
            temp1 *= aonv;
            temp = temp1 * 1.1428639e-7;
            let d5220 = temp * f522 * g520;
            let d5232 = temp * f523 * g532;
            temp = 2.0 * temp1 * 2.1765803e-9;
            let d5421 = temp * f542 * g521;
            let d5433 = temp * f543 * g533;

            let xlamo = (epoch.mo + epoch.nodeo + epoch.nodeo - theta - theta) % TWO_PI;
            let xfact = epoch.mdot + rates.dmdt + 2.0 * (epoch.nodedot + rates.dnodt - RPTIM) - nm;
            let terms = ResonanceTerms::HalfDay {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
            };
            (terms, xlamo, xfact)
        } else {
            let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
            let g310 = 1.0 + 2.0 * emsq;
            let g300 = 1.0 + emsq * (-6.0 + 6.60937 * emsq);
            let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
            let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
            let f330 = 1.0 + cosim;
            let f330 = 1.875 * f330 * f330 * f330;
            let del1 = 3.0 * nm * nm * aonv * aonv;
            let del2 = 2.0 * del1 * f220 * g200 * 1.7891679e-6;
            let del3 = 3.0 * del1 * f330 * g300 * 2.2123015e-7 * aonv;
            let del1 = del1 * f311 * g310 * 2.1460748e-6 * aonv;

            let xpidot = epoch.argpdot + epoch.nodedot;
            let xlamo = (epoch.mo + epoch.nodeo + epoch.argpo - theta) % TWO_PI;
            let xfact = epoch.mdot + xpidot - RPTIM + rates.dmdt + rates.domdt + rates.dnodt - nm;
            (ResonanceTerms::Synchronous { del1, del2, del3 }, xlamo, xfact)
        };

        Some(Self { terms, xfact, xlamo, no_unkozai: nm, argpo: epoch.argpo, argpdot: epoch.argpdot })
    }

    /// Mean motion and mean longitude rates at integrator time `atime`.
    fn rates(&self, xli: f64, xni: f64, atime: f64) -> (f64, f64, f64) {
        let xldot = xni + self.xfact;
        match self.terms {
            ResonanceTerms::Synchronous { del1, del2, del3 } => {
                let xndt = del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin();
                let xnddt = (del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos())
                    * xldot;
                (xndt, xldot, xnddt)
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
                let xnddt = (d2201 * (x2omi + xli - G22).cos()
                    + d2211 * (xli - G22).cos()
                    + d3210 * (xomi + xli - G32).cos()
                    + d3222 * (-xomi + xli - G32).cos()
                    + d5220 * (xomi + xli - G52).cos()
                    + d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d4410 * (x2omi + x2li - G44).cos()
                            + d4422 * (x2li - G44).cos()
                            + d5421 * (xomi + x2li - G54).cos()
                            + d5433 * (-xomi + x2li - G54).cos()))
                    * xldot;
                (xndt, xldot, xnddt)
            }
        }
    }

    /// Integrates from epoch to `t` in fixed 720-minute steps, then a final
    /// Taylor step. Always restarts at epoch, so results do not depend on
    /// earlier calls.
    fn integrate(&self, t: f64) -> (f64, f64) {
        let delt = if t > 0.0 { STEPP } else { STEPN };
        let mut atime = 0.0;
        let mut xni = self.no_unkozai;
        let mut xli = self.xlamo;
        loop {
            let (xndt, xldot, xnddt) = self.rates(xli, xni, atime);
            if (t - atime).abs() >= STEPP {
                xli += xldot * delt + xndt * STEP2;
                xni += xndt * delt + xnddt * STEP2;
                atime += delt;
            } else {
                let ft = t - atime;
                let nm = xni + xndt * ft + xnddt * ft * ft * 0.5;
                let xl = xli + xldot * ft + xndt * ft * ft * 0.5;
                return (nm, xl);
            }
        }
    }
}
