//! Catalog payloads: plain TLE text or JSON records as catalog services
//! publish them (either `TLE_LINE0..2` or OMM-style mean element keys).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::tle::{self, ElementSet, MeanElementFields, TleParseError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog JSON must be an array of records or a single record object")]
    UnexpectedShape,
}

/// Why a single catalog record could not be turned into an element set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Tle(#[from] TleParseError),
    #[error("record {index}: missing field {field}")]
    MissingField { index: usize, field: &'static str },
    #[error("record {index}: invalid {field} value {value}")]
    InvalidValue { index: usize, field: &'static str, value: String },
}

pub type RecordResult = Result<ElementSet, RecordError>;

/// Anything that can hand back the raw text of a catalog.
pub trait CatalogSource {
    fn load(&self) -> Result<String, CatalogError>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for FileSource {
    fn load(&self) -> Result<String, CatalogError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads the whole catalog from standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

impl CatalogSource for StdinSource {
    fn load(&self) -> Result<String, CatalogError> {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    }

    fn describe(&self) -> String {
        "<stdin>".to_string()
    }
}

pub fn load_catalog(source: &dyn CatalogSource) -> Result<Vec<RecordResult>, CatalogError> {
    let text = source.load()?;
    let records = parse_catalog(&text)?;
    let failed = records.iter().filter(|r| r.is_err()).count();
    info!(source = %source.describe(), records = records.len(), failed, "Loaded catalog");
    Ok(records)
}

/// Parses TLE text or a JSON catalog, picked by the first non-blank character.
pub fn parse_catalog(text: &str) -> Result<Vec<RecordResult>, CatalogError> {
    match text.trim_start().chars().next() {
        Some('[') | Some('{') => parse_json_catalog(text),
        _ => Ok(tle::parse_tle_text(text).into_iter().map(|r| r.map_err(RecordError::from)).collect()),
    }
}

pub fn parse_json_catalog(text: &str) -> Result<Vec<RecordResult>, CatalogError> {
    let value: Value = serde_json::from_str(text)?;
    match &value {
        Value::Array(records) => Ok(parse_records(records)),
        Value::Object(_) => Ok(vec![record_to_elements(0, &value)]),
        _ => Err(CatalogError::UnexpectedShape),
    }
}

pub fn parse_records(records: &[Value]) -> Vec<RecordResult> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let result = record_to_elements(index, record);
            if let Err(e) = &result {
                warn!(index, error = %e, "Skipping catalog record");
            }
            result
        })
        .collect()
}

/// Converts one JSON record, preferring its TLE lines over the OMM fields.
pub fn record_to_elements(index: usize, record: &Value) -> RecordResult {
    let obj = record.as_object().ok_or_else(|| RecordError::InvalidValue {
        index,
        field: "record",
        value: record.to_string(),
    })?;

    let name = string_field(obj, "TLE_LINE0")
        .map(|line| line.strip_prefix("0 ").unwrap_or(line).trim().to_string())
        .or_else(|| string_field(obj, "OBJECT_NAME").map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());

    if let (Some(line1), Some(line2)) = (string_field(obj, "TLE_LINE1"), string_field(obj, "TLE_LINE2")) {
        debug!(index, "Catalog record carries TLE lines");
        return Ok(tle::parse_with_name(name, line1, line2)?);
    }

    let fields = MeanElementFields {
        name,
        catalog_number: required_u32(obj, index, "NORAD_CAT_ID")?,
        classification: string_field(obj, "CLASSIFICATION_TYPE").and_then(|s| s.chars().next()).unwrap_or('U'),
        international_designator: string_field(obj, "OBJECT_ID").map(designator_from_object_id).unwrap_or_default(),
        epoch: epoch_field(obj, index)?,
        mean_motion_dot: optional_number(obj, index, "MEAN_MOTION_DOT")?.unwrap_or(0.0),
        mean_motion_ddot: optional_number(obj, index, "MEAN_MOTION_DDOT")?.unwrap_or(0.0),
        bstar: optional_number(obj, index, "BSTAR")?.unwrap_or(0.0),
        inclination_deg: required_number(obj, index, "INCLINATION")?,
        raan_deg: required_number(obj, index, "RA_OF_ASC_NODE")?,
        eccentricity: required_number(obj, index, "ECCENTRICITY")?,
        argument_of_perigee_deg: required_number(obj, index, "ARG_OF_PERICENTER")?,
        mean_anomaly_deg: required_number(obj, index, "MEAN_ANOMALY")?,
        mean_motion_rev_per_day: required_number(obj, index, "MEAN_MOTION")?,
        ephemeris_type: optional_u32(obj, index, "EPHEMERIS_TYPE")?.unwrap_or(0).min(9) as u8,
        element_number: optional_u32(obj, index, "ELEMENT_SET_NO")?.unwrap_or(0),
        revolution_number: optional_u32(obj, index, "REV_AT_EPOCH")?.unwrap_or(0),
    };
    Ok(ElementSet::from_fields(fields)?)
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// A number given either as a JSON number or as a numeric string.
fn optional_number(obj: &Map<String, Value>, index: usize, field: &'static str) -> Result<Option<f64>, RecordError> {
    let invalid = |v: &Value| RecordError::InvalidValue { index, field, value: v.to_string() };
    let Some(v) = obj.get(field) else {
        return Ok(None);
    };
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| invalid(v)),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| invalid(v)),
        _ => Err(invalid(v)),
    }
}

fn required_number(obj: &Map<String, Value>, index: usize, field: &'static str) -> Result<f64, RecordError> {
    optional_number(obj, index, field)?.ok_or(RecordError::MissingField { index, field })
}

fn optional_u32(obj: &Map<String, Value>, index: usize, field: &'static str) -> Result<Option<u32>, RecordError> {
    match optional_number(obj, index, field)? {
        None => Ok(None),
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(Some(n as u32)),
        Some(n) => Err(RecordError::InvalidValue { index, field, value: n.to_string() }),
    }
}

fn required_u32(obj: &Map<String, Value>, index: usize, field: &'static str) -> Result<u32, RecordError> {
    optional_u32(obj, index, field)?.ok_or(RecordError::MissingField { index, field })
}

/// OMM epochs are ISO 8601, usually without a zone suffix; those are UTC.
fn epoch_field(obj: &Map<String, Value>, index: usize) -> Result<DateTime<Utc>, RecordError> {
    let raw = string_field(obj, "EPOCH").ok_or(RecordError::MissingField { index, field: "EPOCH" })?;
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| RecordError::InvalidValue { index, field: "EPOCH", value: raw.to_string() })
}

/// `1998-067A` becomes the TLE form `98067A`.
fn designator_from_object_id(object_id: &str) -> String {
    let id = object_id.trim();
    match (id.get(2..4), id.get(4..5), id.get(5..)) {
        (Some(yy), Some("-"), Some(rest)) => format!("{yy}{rest}"),
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ISS_L1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_L2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
    const VANGUARD_L1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const VANGUARD_L2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    #[test]
    fn detects_tle_text() {
        let text = format!("ISS (ZARYA)\n{ISS_L1}\n{ISS_L2}\n{VANGUARD_L1}\n{VANGUARD_L2}\n");
        let records = parse_catalog(&text).unwrap();
        assert_eq!(records.len(), 2);
        let iss = records[0].as_ref().unwrap();
        assert_eq!(iss.name(), Some("ISS (ZARYA)"));
        assert_eq!(records[1].as_ref().unwrap().catalog_number(), 5);
    }

    #[test]
    fn json_records_with_tle_lines() {
        let text = serde_json::json!([
            { "TLE_LINE0": "0 ISS (ZARYA)", "TLE_LINE1": ISS_L1, "TLE_LINE2": ISS_L2 },
            { "OBJECT_NAME": "VANGUARD 1", "TLE_LINE1": VANGUARD_L1, "TLE_LINE2": VANGUARD_L2 },
        ])
        .to_string();
        let records = parse_catalog(&text).unwrap();
        assert_eq!(records[0].as_ref().unwrap().name(), Some("ISS (ZARYA)"));
        assert_eq!(records[1].as_ref().unwrap().name(), Some("VANGUARD 1"));
    }

    #[test]
    fn omm_fields_match_the_tle() {
        let from_tle = tle::parse(ISS_L1, ISS_L2).unwrap();
        let record = serde_json::json!({
            "OBJECT_NAME": "ISS (ZARYA)",
            "OBJECT_ID": "1998-067A",
            "EPOCH": "2008-09-20T12:25:40.104192",
            "MEAN_MOTION": "15.72125391",
            "ECCENTRICITY": 0.0006703,
            "INCLINATION": "51.6416",
            "RA_OF_ASC_NODE": 247.4627,
            "ARG_OF_PERICENTER": "130.5360",
            "MEAN_ANOMALY": 325.0288,
            "CLASSIFICATION_TYPE": "U",
            "NORAD_CAT_ID": "25544",
            "ELEMENT_SET_NO": 292,
            "REV_AT_EPOCH": 56353,
            "BSTAR": "-0.000011606",
            "MEAN_MOTION_DOT": -0.00002182,
            "MEAN_MOTION_DDOT": 0
        });
        let elements = record_to_elements(0, &record).unwrap();
        assert_eq!(elements.catalog_number(), 25544);
        assert_eq!(elements.international_designator(), "98067A");
        assert_eq!(elements.element_number(), 292);
        assert!((elements.mean_motion() - from_tle.mean_motion()).abs() < 1e-12);
        assert!((elements.inclination() - from_tle.inclination()).abs() < 1e-12);
        assert!((elements.bstar() - from_tle.bstar()).abs() < 1e-15);
        assert!((elements.mean_motion_dot() - from_tle.mean_motion_dot()).abs() < 1e-15);
        assert!(elements.epoch().minutes_since(&from_tle.epoch()).abs() < 1e-3);
    }

    #[test]
    fn bad_records_do_not_fail_the_file() {
        let mut broken = ISS_L2.to_string();
        broken.replace_range(68..69, "0");
        let text = serde_json::json!([
            { "TLE_LINE1": ISS_L1, "TLE_LINE2": broken },
            { "OBJECT_NAME": "NO MOTION", "NORAD_CAT_ID": 1, "EPOCH": "2024-01-01T00:00:00",
              "ECCENTRICITY": 0.001, "INCLINATION": 10, "RA_OF_ASC_NODE": 0,
              "ARG_OF_PERICENTER": 0, "MEAN_ANOMALY": 0 },
            { "NORAD_CAT_ID": 2, "EPOCH": "yesterday", "MEAN_MOTION": 15.0, "ECCENTRICITY": 0.001,
              "INCLINATION": 10, "RA_OF_ASC_NODE": 0, "ARG_OF_PERICENTER": 0, "MEAN_ANOMALY": 0 },
            { "NORAD_CAT_ID": 3, "EPOCH": "2024-01-01T00:00:00Z", "MEAN_MOTION": "fast", "ECCENTRICITY": 0.001,
              "INCLINATION": 10, "RA_OF_ASC_NODE": 0, "ARG_OF_PERICENTER": 0, "MEAN_ANOMALY": 0 },
            "not an object",
            { "TLE_LINE1": VANGUARD_L1, "TLE_LINE2": VANGUARD_L2 },
        ])
        .to_string();
        let records = parse_catalog(&text).unwrap();
        assert_eq!(records.len(), 6);
        assert!(matches!(records[0], Err(RecordError::Tle(TleParseError::Checksum { line: 2, .. }))));
        assert_eq!(records[1], Err(RecordError::MissingField { index: 1, field: "MEAN_MOTION" }));
        assert!(matches!(records[2], Err(RecordError::InvalidValue { field: "EPOCH", .. })));
        assert!(matches!(records[3], Err(RecordError::InvalidValue { field: "MEAN_MOTION", .. })));
        assert!(matches!(records[4], Err(RecordError::InvalidValue { field: "record", .. })));
        assert!(records[5].is_ok());
    }

    #[test]
    fn file_level_failures() {
        assert!(matches!(parse_catalog("[{\"TLE_LINE1\": "), Err(CatalogError::Json(_))));
        assert!(matches!(parse_json_catalog("42"), Err(CatalogError::UnexpectedShape)));
        let missing = FileSource::new("/nonexistent/catalog.json");
        assert!(matches!(load_catalog(&missing), Err(CatalogError::Io(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 VANGUARD 1\n{VANGUARD_L1}\n{VANGUARD_L2}").unwrap();
        let source = FileSource::new(file.path());
        assert_eq!(source.describe(), file.path().display().to_string());
        let records = load_catalog(&source).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap().name(), Some("VANGUARD 1"));
    }

    #[test]
    fn object_id_to_designator() {
        assert_eq!(designator_from_object_id("1998-067A"), "98067A");
        assert_eq!(designator_from_object_id("58002B"), "58002B");
        assert_eq!(designator_from_object_id(""), "");
    }
}
