//! SGP4/SDP4 propagation.
//!
//! [`Sgp4::new`] runs the one-time initialisation (mean motion recovery,
//! secular rates, drag coefficients and the branch choice) and keeps the
//! results in an immutable struct. [`Sgp4::propagate`] is then a pure
//! function of the minutes since epoch.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::deep_space::{DeepSpace, EpochState, MeanState, PeriodicState, ResonanceKind};
use crate::core::gravity::{Geopotential, GravityModel, OpsMode};
use crate::core::time::{self, JulianDate, JD_1950};
use crate::core::tle::ElementSet;

const TWO_PI: f64 = 2.0 * PI;
const X2O3: f64 = 2.0 / 3.0;
/// Guards the xlcof division at inclinations of exactly 180 degrees.
const TEMP4: f64 = 1.5e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("mean eccentricity out of range")]
    MeanEccentricityOutOfRange,
    #[error("mean motion is not positive")]
    NegativeMeanMotion,
    #[error("perturbed eccentricity out of range")]
    PerturbedEccentricityOutOfRange,
    #[error("semi-latus rectum is negative")]
    NegativeSemiLatusRectum,
    #[error("satellite has decayed")]
    Decayed,
}

impl ErrorKind {
    /// Numeric code used by the legacy SGP4 distributions.
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::MeanEccentricityOutOfRange => 1,
            ErrorKind::NegativeMeanMotion => 2,
            ErrorKind::PerturbedEccentricityOutOfRange => 3,
            ErrorKind::NegativeSemiLatusRectum => 4,
            ErrorKind::Decayed => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
#[error("{kind} at {minutes_since_epoch} minutes from epoch")]
pub struct PropagationError {
    pub kind: ErrorKind,
    pub minutes_since_epoch: f64,
}

/// TEME position (km) and velocity (km/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropagatedState {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub minutes_since_epoch: f64,
}

impl PropagatedState {
    pub fn radius_km(&self) -> f64 {
        norm(&self.position)
    }

    pub fn speed_km_s(&self) -> f64 {
        norm(&self.velocity)
    }
}

fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropagationSettings {
    pub gravity: GravityModel,
    pub opsmode: OpsMode,
}

/// Which flavour of the model an element set was initialised into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    NearEarth,
    NearEarthSimplified,
    DeepSpace,
    DeepSpaceSynchronous,
    DeepSpaceHalfDay,
}

/// Higher-order drag terms, only used when perigee is above 220 km.
#[derive(Debug, Clone)]
struct FullDrag {
    cc5: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    delmo: f64,
    omgcof: f64,
    sinmao: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
    xmcof: f64,
}

#[derive(Debug, Clone)]
enum Branch {
    NearEarth { drag: Option<FullDrag> },
    DeepSpace(Box<DeepSpace>),
}

/// Initialised SGP4 state for one element set.
#[derive(Debug, Clone)]
pub struct Sgp4 {
    geo: Geopotential,
    settings: PropagationSettings,
    epoch: JulianDate,

    ecco: f64,
    inclo: f64,
    nodeo: f64,
    argpo: f64,
    mo: f64,
    bstar: f64,
    /// Brouwer mean motion, rad/min.
    no_unkozai: f64,

    con41: f64,
    x1mth2: f64,
    x7thm1: f64,
    cc1: f64,
    cc4: f64,
    eta: f64,
    mdot: f64,
    argpdot: f64,
    nodedot: f64,
    nodecf: f64,
    t2cof: f64,
    xlcof: f64,
    aycof: f64,
    gsto: f64,

    branch: Branch,
}

impl Sgp4 {
    pub fn new(elements: &ElementSet, settings: PropagationSettings) -> Self {
        let geo = settings.gravity.constants();
        let epoch = elements.epoch();
        let epoch_1950 = epoch.jd + epoch.fr - JD_1950;

        let ecco = elements.eccentricity();
        let inclo = elements.inclination();
        let nodeo = elements.raan();
        let argpo = elements.argument_of_perigee();
        let mo = elements.mean_anomaly();
        let bstar = elements.bstar();
        let no_kozai = elements.mean_motion();

        let ss = 78.0 / geo.radius_km + 1.0;
        let qzms2ttemp = (120.0 - 78.0) / geo.radius_km;
        let qzms2t = qzms2ttemp * qzms2ttemp * qzms2ttemp * qzms2ttemp;

        // recover the Brouwer mean motion from the Kozai value
        let eccsq = ecco * ecco;
        let omeosq = 1.0 - eccsq;
        let rteosq = omeosq.sqrt();
        let cosio = inclo.cos();
        let cosio2 = cosio * cosio;
        let ak = (geo.xke / no_kozai).powf(X2O3);
        let d1 = 0.75 * geo.j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
        let mut del = d1 / (ak * ak);
        let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
        del = d1 / (adel * adel);
        let no_unkozai = no_kozai / (1.0 + del);

        let ao = (geo.xke / no_unkozai).powf(X2O3);
        let sinio = inclo.sin();
        let po = ao * omeosq;
        let con42 = 1.0 - 5.0 * cosio2;
        let con41 = -con42 - cosio2 - cosio2;
        let posq = po * po;
        let rp = ao * (1.0 - ecco);
        let gsto = match settings.opsmode {
            OpsMode::Afspc => afspc_sidereal_time(epoch_1950),
            OpsMode::Improved => time::gstime(epoch_1950 + JD_1950),
        };

        // perigees below 156 km get a lower atmosphere parameter
        let perigee_km = (rp - 1.0) * geo.radius_km;
        let (sfour, qzms24) = if perigee_km < 156.0 {
            let s = if perigee_km < 98.0 { 20.0 } else { perigee_km - 78.0 };
            let q = (120.0 - s) / geo.radius_km;
            (s / geo.radius_km + 1.0, q * q * q * q)
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
                + 0.375 * geo.j2 * tsi / psisq * con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let cc1 = bstar * cc2;
        let cc3 = if ecco > 1.0e-4 { -2.0 * coef * tsi * geo.j3oj2 * no_unkozai * sinio / ecco } else { 0.0 };
        let x1mth2 = 1.0 - cosio2;
        let cc4 = 2.0
            * no_unkozai
            * coef1
            * ao
            * omeosq
            * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
                - geo.j2 * tsi / (ao * psisq)
                    * (-3.0 * con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * (2.0 * argpo).cos()));
        let cc5 = 2.0 * coef1 * ao * omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let cosio4 = cosio2 * cosio2;
        let temp1 = 1.5 * geo.j2 * pinvsq * no_unkozai;
        let temp2 = 0.5 * temp1 * geo.j2 * pinvsq;
        let temp3 = -0.46875 * geo.j4 * pinvsq * pinvsq * no_unkozai;
        let mdot = no_unkozai
            + 0.5 * temp1 * rteosq * con41
            + 0.0625 * temp2 * rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
        let argpdot = -0.5 * temp1 * con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
        let xhdot1 = -temp1 * cosio;
        let nodedot = xhdot1 + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;
        let omgcof = bstar * cc3 * argpo.cos();
        let xmcof = if ecco > 1.0e-4 { -X2O3 * coef * bstar / eeta } else { 0.0 };
        let nodecf = 3.5 * omeosq * xhdot1 * cc1;
        let t2cof = 1.5 * cc1;
        let xlcof = long_period_xlcof(geo.j3oj2, sinio, cosio);
        let aycof = -0.5 * geo.j3oj2 * sinio;
        let delmotemp = 1.0 + eta * mo.cos();
        let delmo = delmotemp * delmotemp * delmotemp;
        let sinmao = mo.sin();
        let x7thm1 = 7.0 * cosio2 - 1.0;

        let branch = if TWO_PI / no_unkozai >= 225.0 {
            let deep = DeepSpace::new(&EpochState {
                epoch: epoch_1950,
                ecco,
                inclo,
                nodeo,
                argpo,
                mo,
                no_unkozai,
                xke: geo.xke,
                gsto,
                mdot,
                argpdot,
                nodedot,
            });
            Branch::DeepSpace(Box::new(deep))
        } else if rp < 220.0 / geo.radius_km + 1.0 {
            Branch::NearEarth { drag: None }
        } else {
            let cc1sq = cc1 * cc1;
            let d2 = 4.0 * ao * tsi * cc1sq;
            let temp = d2 * tsi * cc1 / 3.0;
            let d3 = (17.0 * ao + sfour) * temp;
            let d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
            let t3cof = d2 + 2.0 * cc1sq;
            let t4cof = 0.25 * (3.0 * d3 + cc1 * (12.0 * d2 + 10.0 * cc1sq));
            let t5cof = 0.2 * (3.0 * d4 + 12.0 * cc1 * d3 + 6.0 * d2 * d2 + 15.0 * cc1sq * (2.0 * d2 + cc1sq));
            Branch::NearEarth {
                drag: Some(FullDrag { cc5, d2, d3, d4, delmo, omgcof, sinmao, t3cof, t4cof, t5cof, xmcof }),
            }
        };

        let model = Self {
            geo,
            settings,
            epoch,
            ecco,
            inclo,
            nodeo,
            argpo,
            mo,
            bstar,
            no_unkozai,
            con41,
            x1mth2,
            x7thm1,
            cc1,
            cc4,
            eta,
            mdot,
            argpdot,
            nodedot,
            nodecf,
            t2cof,
            xlcof,
            aycof,
            gsto,
            branch,
        };
        debug!(
            norad = elements.catalog_number(),
            branch = ?model.branch_kind(),
            perigee_km,
            "Initialised SGP4"
        );
        model
    }

    pub fn branch_kind(&self) -> BranchKind {
        match &self.branch {
            Branch::NearEarth { drag: Some(_) } => BranchKind::NearEarth,
            Branch::NearEarth { drag: None } => BranchKind::NearEarthSimplified,
            Branch::DeepSpace(deep) => match deep.resonance_kind() {
                ResonanceKind::None => BranchKind::DeepSpace,
                ResonanceKind::Synchronous => BranchKind::DeepSpaceSynchronous,
                ResonanceKind::HalfDay => BranchKind::DeepSpaceHalfDay,
            },
        }
    }

    pub fn epoch(&self) -> JulianDate {
        self.epoch
    }

    pub fn settings(&self) -> PropagationSettings {
        self.settings
    }

    /// Brouwer mean motion in rad/min.
    pub fn mean_motion(&self) -> f64 {
        self.no_unkozai
    }

    /// Greenwich sidereal angle at epoch, radians.
    pub fn gsto(&self) -> f64 {
        self.gsto
    }

    /// Position and velocity `tsince` minutes from epoch.
    ///
    /// Checks run in this order and the first failure is returned: mean
    /// motion > 0, mean eccentricity in [-0.001, 1), perturbed eccentricity
    /// in [0, 1] (deep space only), semi-latus rectum >= 0, radius >= 1 Earth
    /// radius.
    pub fn propagate(&self, tsince: f64) -> Result<PropagatedState, PropagationError> {
        let geo = &self.geo;
        let fail = |kind| PropagationError { kind, minutes_since_epoch: tsince };
        let t = tsince;

        // secular gravity and atmospheric drag
        let xmdf = self.mo + self.mdot * t;
        let argpdf = self.argpo + self.argpdot * t;
        let nodedf = self.nodeo + self.nodedot * t;
        let mut argpm = argpdf;
        let mut mm = xmdf;
        let t2 = t * t;
        let mut nodem = nodedf + self.nodecf * t2;
        let mut tempa = 1.0 - self.cc1 * t;
        let mut tempe = self.bstar * self.cc4 * t;
        let mut templ = self.t2cof * t2;

        if let Branch::NearEarth { drag: Some(drag) } = &self.branch {
            let delomg = drag.omgcof * t;
            let delmtemp = 1.0 + self.eta * xmdf.cos();
            let delm = drag.xmcof * (delmtemp * delmtemp * delmtemp - drag.delmo);
            let temp = delomg + delm;
            mm = xmdf + temp;
            argpm = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            tempa = tempa - drag.d2 * t2 - drag.d3 * t3 - drag.d4 * t4;
            tempe += self.bstar * drag.cc5 * (mm.sin() - drag.sinmao);
            templ = templ + drag.t3cof * t3 + t4 * (drag.t4cof + t * drag.t5cof);
        }

        let mut nm = self.no_unkozai;
        let mut em = self.ecco;
        let mut inclm = self.inclo;
        if let Branch::DeepSpace(deep) = &self.branch {
            let mean = deep.secular(t, MeanState { em, argpm, inclm, mm, nodem, nm });
            em = mean.em;
            argpm = mean.argpm;
            inclm = mean.inclm;
            mm = mean.mm;
            nodem = mean.nodem;
            nm = mean.nm;
        }

        if nm <= 0.0 {
            return Err(fail(ErrorKind::NegativeMeanMotion));
        }
        let am = (geo.xke / nm).powf(X2O3) * tempa * tempa;
        nm = geo.xke / am.powf(1.5);
        em -= tempe;
        if em >= 1.0 || em < -0.001 {
            return Err(fail(ErrorKind::MeanEccentricityOutOfRange));
        }
        if em < 1.0e-6 {
            em = 1.0e-6;
        }
        mm += self.no_unkozai * templ;
        let xlm = (mm + argpm + nodem) % TWO_PI;
        nodem %= TWO_PI;
        argpm %= TWO_PI;
        mm = (xlm - argpm - nodem) % TWO_PI;

        // lunar/solar periodics
        let mut ep = em;
        let mut xincp = inclm;
        let mut argpp = argpm;
        let mut nodep = nodem;
        let mut mp = mm;
        let mut sinip = inclm.sin();
        let mut cosip = inclm.cos();
        let mut aycof = self.aycof;
        let mut xlcof = self.xlcof;
        if let Branch::DeepSpace(deep) = &self.branch {
            let p = deep.periodics(t, PeriodicState { ep, inclp: xincp, nodep, argpp, mp }, self.settings.opsmode);
            ep = p.ep;
            xincp = p.inclp;
            nodep = p.nodep;
            argpp = p.argpp;
            mp = p.mp;
            if xincp < 0.0 {
                xincp = -xincp;
                nodep += PI;
                argpp -= PI;
            }
            if !(0.0..=1.0).contains(&ep) {
                return Err(fail(ErrorKind::PerturbedEccentricityOutOfRange));
            }
            sinip = xincp.sin();
            cosip = xincp.cos();
            aycof = -0.5 * geo.j3oj2 * sinip;
            xlcof = long_period_xlcof(geo.j3oj2, sinip, cosip);
        }

        // long period periodics
        let axnl = ep * argpp.cos();
        let temp = 1.0 / (am * (1.0 - ep * ep));
        let aynl = ep * argpp.sin() + temp * aycof;
        let xl = mp + argpp + nodep + temp * xlcof * axnl;

        // Kepler's equation
        let u = (xl - nodep) % TWO_PI;
        let mut eo1 = u;
        let mut tem5: f64 = 9999.9;
        let mut ktr = 1;
        let mut sineo1 = 0.0;
        let mut coseo1 = 0.0;
        while tem5.abs() >= 1.0e-12 && ktr <= 10 {
            sineo1 = eo1.sin();
            coseo1 = eo1.cos();
            tem5 = 1.0 - coseo1 * axnl - sineo1 * aynl;
            tem5 = (u - aynl * coseo1 + axnl * sineo1 - eo1) / tem5;
            if tem5.abs() >= 0.95 {
                tem5 = if tem5 > 0.0 { 0.95 } else { -0.95 };
            }
            eo1 += tem5;
            ktr += 1;
        }

        // short period periodics
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err(fail(ErrorKind::NegativeSemiLatusRectum));
        }
        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let mut su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * geo.j2 * temp;
        let temp2 = temp1 * temp;

        let (con41, x1mth2, x7thm1) = match self.branch {
            Branch::DeepSpace(_) => {
                let cosisq = cosip * cosip;
                (3.0 * cosisq - 1.0, 1.0 - cosisq, 7.0 * cosisq - 1.0)
            }
            Branch::NearEarth { .. } => (self.con41, self.x1mth2, self.x7thm1),
        };

        let mrt = rl * (1.0 - 1.5 * temp2 * betal * con41) + 0.5 * temp1 * x1mth2 * cos2u;
        su -= 0.25 * temp2 * x7thm1 * sin2u;
        let xnode = nodep + 1.5 * temp2 * cosip * sin2u;
        let xinc = xincp + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - nm * temp1 * x1mth2 * sin2u / geo.xke;
        let rvdot = rvdotl + nm * temp1 * (x1mth2 * cos2u + 1.5 * con41) / geo.xke;

        if mrt < 1.0 {
            return Err(fail(ErrorKind::Decayed));
        }

        // orientation vectors
        let sinsu = su.sin();
        let cossu = su.cos();
        let snod = xnode.sin();
        let cnod = xnode.cos();
        let sini = xinc.sin();
        let cosi = xinc.cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let ux = xmx * sinsu + cnod * cossu;
        let uy = xmy * sinsu + snod * cossu;
        let uz = sini * sinsu;
        let vx = xmx * cossu - cnod * sinsu;
        let vy = xmy * cossu - snod * sinsu;
        let vz = sini * cossu;

        let mr = mrt * geo.radius_km;
        let vkmpersec = geo.radius_km * geo.xke / 60.0;
        Ok(PropagatedState {
            position: [mr * ux, mr * uy, mr * uz],
            velocity: [
                (mvt * ux + rvdot * vx) * vkmpersec,
                (mvt * uy + rvdot * vy) * vkmpersec,
                (mvt * uz + rvdot * vz) * vkmpersec,
            ],
            minutes_since_epoch: tsince,
        })
    }

    pub fn propagate_julian(&self, at: JulianDate) -> Result<PropagatedState, PropagationError> {
        self.propagate(at.minutes_since(&self.epoch))
    }

    pub fn propagate_at(&self, at: DateTime<Utc>) -> Result<PropagatedState, PropagationError> {
        self.propagate_julian(JulianDate::from_utc(at))
    }
}

fn long_period_xlcof(j3oj2: f64, sini: f64, cosi: f64) -> f64 {
    let denominator = if (cosi + 1.0).abs() > TEMP4 { 1.0 + cosi } else { TEMP4 };
    -0.25 * j3oj2 * sini * (3.0 + 5.0 * cosi) / denominator
}

/// Sidereal time at epoch as the legacy operational code computes it.
fn afspc_sidereal_time(epoch_1950: f64) -> f64 {
    let ts70 = epoch_1950 - 7305.0;
    let ds70 = (ts70 + 1.0e-8).floor();
    let tfrac = ts70 - ds70;
    let c1 = 1.72027916940703639e-2;
    let thgr70 = 1.7321343856509374;
    let fk5r = 5.07551419432269442e-15;
    let c1p2p = c1 + TWO_PI;
    let mut gsto = (thgr70 + c1 * ds70 + c1p2p * tfrac + ts70 * ts70 * fk5r) % TWO_PI;
    if gsto < 0.0 {
        gsto += TWO_PI;
    }
    gsto
}

/// Initialises and propagates in one call.
pub fn propagate(elements: &ElementSet, minutes: f64) -> Result<PropagatedState, PropagationError> {
    Sgp4::new(elements, PropagationSettings::default()).propagate(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tle::{self, parse};
    use chrono::TimeZone;

    const VANGUARD_L1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const VANGUARD_L2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";
    const ISS_L1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_L2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
    const GPS_L1: &str = "1 24876U 97035A   08158.03376669  .00000036  00000-0  10000-3 0  9996";
    const GPS_L2: &str = "2 24876  55.6281 158.1744 0043734 107.5066 253.0176  2.00565175 79193";
    const MOLNIYA_L1: &str = "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813";
    const MOLNIYA_L2: &str = "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656";
    const GEO_L1: &str = "1 28626U 05008A   06176.46683397 -.00000205  00000-0  10000-3 0  2190";
    const GEO_L2: &str = "2 28626   0.0019 286.9433 0000335  13.7918  55.6504  1.00271328  1191";
    const DECAYING_L1: &str = "1 99999U 24001A   24001.00000000  .01000000  00000-0  10000-1 0  9992";
    const DECAYING_L2: &str = "2 99999  90.0000   0.0000 0001000   0.0000   0.0000 16.40000000  1009";
    const DRAGGED_L1: &str = "1 99998U 24001B   24001.00000000  .00000000  00000-0  50000+0 0  9992";
    const DRAGGED_L2: &str = "2 99998  45.0000   0.0000 4000000   0.0000   0.0000  7.00000000  1007";

    fn model(l1: &str, l2: &str) -> Sgp4 {
        Sgp4::new(&parse(l1, l2).unwrap(), PropagationSettings::default())
    }

    fn assert_close(actual: [f64; 3], expected: [f64; 3], relative: f64) {
        let scale = norm(&expected);
        let diff = [actual[0] - expected[0], actual[1] - expected[1], actual[2] - expected[2]];
        assert!(
            norm(&diff) / scale < relative,
            "expected {expected:?}, got {actual:?} (relative error {})",
            norm(&diff) / scale
        );
    }

    #[test]
    fn vanguard_matches_verification_vectors() {
        let sgp4 = model(VANGUARD_L1, VANGUARD_L2);
        assert_eq!(sgp4.branch_kind(), BranchKind::NearEarth);

        let cases = [
            (0.0, [7022.46529266, -1400.08296755, 0.03995155], [1.893841015, 6.405893759, 4.534807250]),
            (360.0, [-7154.03120202, -3783.17682504, -3536.19412294], [4.741887409, -4.151817765, -2.093935425]),
            (720.0, [-7134.59340119, 6531.68641334, 3260.27186483], [-4.113793027, -2.911922039, -2.557327851]),
        ];
        for (t, r, v) in cases {
            let state = sgp4.propagate(t).unwrap();
            assert_eq!(state.minutes_since_epoch, t);
            assert_close(state.position, r, 1e-8);
            assert_close(state.velocity, v, 1e-8);
        }
    }

    #[test]
    fn molniya_half_day_resonance_at_epoch() {
        let sgp4 = model(MOLNIYA_L1, MOLNIYA_L2);
        assert_eq!(sgp4.branch_kind(), BranchKind::DeepSpaceHalfDay);
        let state = sgp4.propagate(0.0).unwrap();
        assert_close(state.position, [2349.89483350, -14785.93811562, 0.02119378], 1e-8);
    }

    #[test]
    fn selects_branches() {
        assert_eq!(model(ISS_L1, ISS_L2).branch_kind(), BranchKind::NearEarth);
        assert_eq!(model(GPS_L1, GPS_L2).branch_kind(), BranchKind::DeepSpace);
        assert_eq!(model(GEO_L1, GEO_L2).branch_kind(), BranchKind::DeepSpaceSynchronous);
        assert_eq!(model(DECAYING_L1, DECAYING_L2).branch_kind(), BranchKind::NearEarthSimplified);
    }

    #[test]
    fn deep_space_orbits_keep_plausible_radii() {
        let gps = model(GPS_L1, GPS_L2);
        let geo = model(GEO_L1, GEO_L2);
        let molniya = model(MOLNIYA_L1, MOLNIYA_L2);
        for t in [-1440.0, 0.0, 720.0, 1440.0, 4320.0, 10_080.0] {
            let r = gps.propagate(t).unwrap().radius_km();
            assert!((26_400.0..26_800.0).contains(&r), "gps radius {r} at {t}");
            let r = geo.propagate(t).unwrap().radius_km();
            assert!((42_100.0..42_230.0).contains(&r), "geo radius {r} at {t}");
            let state = molniya.propagate(t).unwrap();
            assert!((6_800.0..47_000.0).contains(&state.radius_km()));
            assert!(state.velocity.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn epoch_instant_gives_zero_offset() {
        let elements = parse(ISS_L1, ISS_L2).unwrap();
        let sgp4 = Sgp4::new(&elements, PropagationSettings::default());
        let at_zero = sgp4.propagate(0.0).unwrap();
        let at_epoch = sgp4.propagate_julian(elements.epoch()).unwrap();
        assert_eq!(at_epoch.minutes_since_epoch, 0.0);
        assert_eq!(at_zero, at_epoch);
    }

    #[test]
    fn propagate_at_matches_minutes() {
        let elements = parse(ISS_L1, ISS_L2).unwrap();
        let sgp4 = Sgp4::new(&elements, PropagationSettings::default());
        let at = elements.epoch().add_minutes(95.0).to_utc().unwrap();
        let by_time = sgp4.propagate_at(at).unwrap();
        let by_minutes = sgp4.propagate(95.0).unwrap();
        assert!((by_time.minutes_since_epoch - 95.0).abs() < 1e-6);
        assert_close(by_time.position, by_minutes.position, 1e-8);
    }

    #[test]
    fn epoch_timestamp_gives_zero_offset() {
        for (l1, l2) in [(VANGUARD_L1, VANGUARD_L2), (ISS_L1, ISS_L2)] {
            let elements = parse(l1, l2).unwrap();
            let sgp4 = Sgp4::new(&elements, PropagationSettings::default());
            let state = sgp4.propagate_at(elements.epoch_utc().unwrap()).unwrap();
            assert!(state.minutes_since_epoch.abs() < 1e-9, "offset {}", state.minutes_since_epoch);
            assert_close(state.position, sgp4.propagate(0.0).unwrap().position, 1e-12);
        }
    }

    #[test]
    fn heavy_drag_ends_in_decay() {
        let sgp4 = model(DECAYING_L1, DECAYING_L2);
        let mut first_error = None;
        for step in 0..1000 {
            let t = f64::from(step) * 5.0;
            match sgp4.propagate(t) {
                Ok(state) => {
                    assert!(state.position.iter().chain(state.velocity.iter()).all(|x| x.is_finite()));
                }
                Err(e) => {
                    first_error = Some(e);
                    break;
                }
            }
        }
        let error = first_error.expect("orbit should decay within the scan");
        assert_eq!(error.kind, ErrorKind::Decayed);
        assert_eq!(error.kind.code(), 6);
        assert!(error.minutes_since_epoch > 0.0);
    }

    #[test]
    fn drag_backwards_pushes_eccentricity_out_of_range() {
        let sgp4 = model(DRAGGED_L1, DRAGGED_L2);
        assert!(sgp4.propagate(0.0).is_ok());
        let error = sgp4.propagate(-100.0).unwrap_err();
        assert_eq!(error.kind, ErrorKind::MeanEccentricityOutOfRange);
        assert_eq!(error.kind.code(), 1);
        assert_eq!(error.minutes_since_epoch, -100.0);
    }

    /// Deep-space element set with bstar 1e-4, RAAN 10 deg, perigee argument 80 deg.
    fn eccentric_model(eccentricity: f64, rev_per_day: f64, inclination_deg: f64) -> Sgp4 {
        let fields = tle::MeanElementFields {
            name: None,
            catalog_number: 90000,
            classification: 'U',
            international_designator: String::new(),
            epoch: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            mean_motion_dot: 0.0,
            mean_motion_ddot: 0.0,
            bstar: 1e-4,
            inclination_deg,
            raan_deg: 10.0,
            eccentricity,
            argument_of_perigee_deg: 80.0,
            mean_anomaly_deg: 0.0,
            mean_motion_rev_per_day: rev_per_day,
            ephemeris_type: 0,
            element_number: 0,
            revolution_number: 0,
        };
        Sgp4::new(&tle::ElementSet::from_fields(fields).unwrap(), PropagationSettings::default())
    }

    #[test]
    fn drag_drives_mean_motion_negative() {
        let error = eccentric_model(0.9999, 1.0, 0.1).propagate(1000.0).unwrap_err();
        assert_eq!(error.kind, ErrorKind::NegativeMeanMotion);
        assert_eq!(error.kind.code(), 2);
        assert_eq!(error.minutes_since_epoch, 1000.0);
    }

    #[test]
    fn lunisolar_terms_push_eccentricity_past_one() {
        let error = eccentric_model(0.999, 2.0, 30.0).propagate(0.0).unwrap_err();
        assert_eq!(error.kind, ErrorKind::PerturbedEccentricityOutOfRange);
        assert_eq!(error.kind.code(), 3);
        assert_eq!(error.minutes_since_epoch, 0.0);
    }

    #[test]
    fn near_parabolic_orbit_has_negative_semi_latus_rectum() {
        let error = eccentric_model(0.99, 2.0, 63.4).propagate(0.0).unwrap_err();
        assert_eq!(error.kind, ErrorKind::NegativeSemiLatusRectum);
        assert_eq!(error.kind.code(), 4);
        assert_eq!(error.minutes_since_epoch, 0.0);
    }

    #[test]
    fn gravity_model_changes_result_slightly() {
        let elements = parse(ISS_L1, ISS_L2).unwrap();
        let wgs72 = Sgp4::new(&elements, PropagationSettings::default()).propagate(720.0).unwrap();
        let settings = PropagationSettings { gravity: GravityModel::Wgs84, opsmode: OpsMode::Afspc };
        let sgp4 = Sgp4::new(&elements, settings);
        assert_eq!(sgp4.settings(), settings);
        let wgs84 = sgp4.propagate(720.0).unwrap();
        let diff = [
            wgs84.position[0] - wgs72.position[0],
            wgs84.position[1] - wgs72.position[1],
            wgs84.position[2] - wgs72.position[2],
        ];
        assert!(norm(&diff) > 1e-6 && norm(&diff) < 10.0);
    }

    #[test]
    fn afspc_sidereal_time_is_close_to_iau() {
        let elements = parse(ISS_L1, ISS_L2).unwrap();
        let afspc = Sgp4::new(&elements, PropagationSettings { opsmode: OpsMode::Afspc, ..Default::default() });
        let improved = Sgp4::new(&elements, PropagationSettings::default());
        let mut diff = (afspc.gsto() - improved.gsto()).abs();
        if diff > PI {
            diff = TWO_PI - diff;
        }
        assert!(diff < 1e-5);
    }

    #[test]
    fn shared_model_is_deterministic_across_threads() {
        let sgp4 = model(GEO_L1, GEO_L2);
        let expected: Vec<_> = (0..8).map(|i| sgp4.propagate(f64::from(i) * 1000.0).unwrap()).collect();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for (i, want) in expected.iter().enumerate().rev() {
                        let got = sgp4.propagate(i as f64 * 1000.0).unwrap();
                        assert_eq!(&got, want);
                    }
                });
            }
        });
    }

    #[test]
    fn agrees_with_sgp4_crate() {
        let settings = PropagationSettings { gravity: GravityModel::Wgs84, opsmode: OpsMode::Improved };
        for (l1, l2) in [(ISS_L1, ISS_L2), (GPS_L1, GPS_L2)] {
            let ours = Sgp4::new(&tle::parse(l1, l2).unwrap(), settings);
            let elements = sgp4::Elements::from_tle(None, l1.as_bytes(), l2.as_bytes()).unwrap();
            let theirs = sgp4::Constants::from_elements(&elements).unwrap();
            for t in [0.0, 90.0, 720.0, 1440.0] {
                let a = ours.propagate(t).unwrap();
                let b = theirs.propagate(t).unwrap();
                assert_close(a.position, b.position, 1e-4);
                assert_close(a.velocity, b.velocity, 1e-4);
            }
        }
    }

    #[test]
    fn error_codes() {
        assert_eq!(ErrorKind::NegativeMeanMotion.code(), 2);
        assert_eq!(ErrorKind::PerturbedEccentricityOutOfRange.code(), 3);
        assert_eq!(ErrorKind::NegativeSemiLatusRectum.code(), 4);
        let error = PropagationError { kind: ErrorKind::Decayed, minutes_since_epoch: 12.0 };
        let json = serde_json::to_value(error).unwrap();
        assert_eq!(json["kind"], "decayed");
    }
}
