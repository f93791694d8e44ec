use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::frames::Geodetic;
use crate::core::orbit::{BranchKind, ErrorKind, PropagatedState};
use crate::core::satellite::Satellite;

#[derive(Debug, Serialize)]
pub struct SatelliteDto {
    pub norad_id: u32,
    pub name: Option<String>,
    pub epoch: Option<DateTime<Utc>>,
    pub branch: BranchKind,
    pub period_minutes: f64,
    pub inclination_deg: f64,
    pub eccentricity: f64,
}

impl From<&Satellite> for SatelliteDto {
    fn from(sat: &Satellite) -> Self {
        let elements = sat.elements();
        Self {
            norad_id: sat.norad_id(),
            name: sat.name().map(str::to_string),
            epoch: elements.epoch_utc(),
            branch: sat.model().branch_kind(),
            period_minutes: elements.period_minutes(),
            inclination_deg: elements.inclination().to_degrees(),
            eccentricity: elements.eccentricity(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PositionDto {
    pub norad_id: u32,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub alt_km: f64,
    pub speed_km_s: f64,
    pub minutes_since_epoch: f64,
}

#[derive(Debug, Serialize)]
pub struct StateDto {
    pub norad_id: u32,
    pub name: Option<String>,
    #[serde(flatten)]
    pub state: PropagatedState,
    pub geodetic: Geodetic,
}

#[derive(Debug, Serialize)]
pub struct PropagationErrorDto {
    pub error: String,
    pub kind: ErrorKind,
    pub code: u8,
    pub minutes_since_epoch: f64,
}

/// `at` and `minutes` are mutually exclusive; neither means "now".
#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub minutes: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PropagateRequest {
    pub records: Vec<serde_json::Value>,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub minutes: Option<f64>,
}
