use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Earth gravity model the propagator is evaluated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GravityModel {
    Wgs72Old,
    #[default]
    Wgs72,
    Wgs84,
}

/// Geopotential constants in the units SGP4 works in (km, Earth radii, minutes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geopotential {
    pub mu: f64,
    pub radius_km: f64,
    /// sqrt(mu) in Earth radii^1.5 per minute.
    pub xke: f64,
    /// Minutes per time unit.
    pub tumin: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    pub j3oj2: f64,
}

impl GravityModel {
    pub fn constants(self) -> Geopotential {
        let (mu, radius_km, xke, j2, j3, j4) = match self {
            GravityModel::Wgs72Old => {
                (398_600.79964, 6378.135, 0.0743669161, 0.001082616, -0.00000253881, -0.00000165597)
            }
            GravityModel::Wgs72 => {
                let mu = 398_600.8;
                let re: f64 = 6378.135;
                (mu, re, 60.0 / (re * re * re / mu).sqrt(), 0.001082616, -0.00000253881, -0.00000165597)
            }
            GravityModel::Wgs84 => {
                let mu = 398_600.5;
                let re: f64 = 6378.137;
                (mu, re, 60.0 / (re * re * re / mu).sqrt(), 0.00108262998905, -0.00000253215306, -0.00000161098761)
            }
        };
        Geopotential { mu, radius_km, xke, tumin: 1.0 / xke, j2, j3, j4, j3oj2: j3 / j2 }
    }
}

impl fmt::Display for GravityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GravityModel::Wgs72Old => "wgs72old",
            GravityModel::Wgs72 => "wgs72",
            GravityModel::Wgs84 => "wgs84",
        })
    }
}

impl FromStr for GravityModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgs72old" => Ok(GravityModel::Wgs72Old),
            "wgs72" => Ok(GravityModel::Wgs72),
            "wgs84" => Ok(GravityModel::Wgs84),
            other => Err(format!("unknown gravity model '{other}' (expected wgs72old, wgs72 or wgs84)")),
        }
    }
}

/// `Afspc` reproduces the legacy operational code (its sidereal time and
/// node wrapping); `Improved` uses IAU-82 sidereal time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpsMode {
    Afspc,
    #[default]
    Improved,
}

impl fmt::Display for OpsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpsMode::Afspc => "afspc",
            OpsMode::Improved => "improved",
        })
    }
}

impl FromStr for OpsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "afspc" | "a" => Ok(OpsMode::Afspc),
            "improved" | "i" => Ok(OpsMode::Improved),
            other => Err(format!("unknown operation mode '{other}' (expected improved or afspc)")),
        }
    }
}
