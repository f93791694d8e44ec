use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::gravity::GravityModel;
use crate::core::time::{self, JulianDate, MINUTES_PER_DAY};

/// Revolutions per day to radians per minute.
const XPDOTP: f64 = MINUTES_PER_DAY / (2.0 * PI);
const TLE_LINE_LEN: usize = 69;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TleParseError {
    #[error("line {line}: expected 69 columns, found {len}")]
    InvalidLength { line: u8, len: usize },
    #[error("line {line}: contains non-ASCII characters")]
    NotAscii { line: u8 },
    #[error("line {line}: expected line number {line} in column 1, found '{found}'")]
    InvalidLineNumber { line: u8, found: char },
    #[error("line {line}: checksum mismatch (computed {computed}, column 69 holds '{found}')")]
    Checksum { line: u8, computed: u8, found: char },
    #[error("line {line}: invalid {field} in columns {start}-{end}: {value:?}")]
    InvalidField { line: u8, field: &'static str, start: usize, end: usize, value: String },
    #[error("catalog number differs between lines ({line1} vs {line2})")]
    CatalogMismatch { line1: u32, line2: u32 },
    #[error("invalid elements: {0}")]
    InvalidElements(String),
    #[error("invalid TLE pair at line {line}")]
    InvalidPair { line: usize },
    #[error("{field} {value} does not fit the TLE format")]
    Unencodable { field: &'static str, value: f64 },
}

/// A fixed column range, 1-based and inclusive.
#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    start: usize,
    end: usize,
}

impl Field {
    const fn new(name: &'static str, start: usize, end: usize) -> Self {
        Self { name, start, end }
    }

    fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start - 1..self.end]
    }

    fn invalid(&self, line: u8, value: &str) -> TleParseError {
        TleParseError::InvalidField {
            line,
            field: self.name,
            start: self.start,
            end: self.end,
            value: value.to_string(),
        }
    }
}

const CATALOG_NUMBER: Field = Field::new("catalog number", 3, 7);

mod line1 {
    use super::Field;

    pub const CLASSIFICATION: Field = Field::new("classification", 8, 8);
    pub const DESIGNATOR: Field = Field::new("international designator", 10, 17);
    pub const EPOCH_YEAR: Field = Field::new("epoch year", 19, 20);
    pub const EPOCH_DAY: Field = Field::new("epoch day", 21, 32);
    pub const MEAN_MOTION_DOT: Field = Field::new("mean motion first derivative", 34, 43);
    pub const MEAN_MOTION_DDOT: Field = Field::new("mean motion second derivative", 45, 52);
    pub const BSTAR: Field = Field::new("drag term", 54, 61);
    pub const EPHEMERIS_TYPE: Field = Field::new("ephemeris type", 63, 63);
    pub const ELEMENT_NUMBER: Field = Field::new("element set number", 65, 68);
}

mod line2 {
    use super::Field;

    pub const INCLINATION: Field = Field::new("inclination", 9, 16);
    pub const RAAN: Field = Field::new("right ascension of ascending node", 18, 25);
    pub const ECCENTRICITY: Field = Field::new("eccentricity", 27, 33);
    pub const ARGUMENT_OF_PERIGEE: Field = Field::new("argument of perigee", 35, 42);
    pub const MEAN_ANOMALY: Field = Field::new("mean anomaly", 44, 51);
    pub const MEAN_MOTION: Field = Field::new("mean motion", 53, 63);
    pub const REVOLUTION_NUMBER: Field = Field::new("revolution number", 64, 68);
}

/// One checked TLE line: ASCII, 69 columns, right line number, valid checksum.
struct Line<'a> {
    number: u8,
    text: &'a str,
}

impl<'a> Line<'a> {
    fn checked(number: u8, raw: &'a str) -> Result<Self, TleParseError> {
        let text = raw.trim_end();
        if !text.is_ascii() {
            return Err(TleParseError::NotAscii { line: number });
        }
        if text.len() != TLE_LINE_LEN {
            return Err(TleParseError::InvalidLength { line: number, len: text.len() });
        }
        let bytes = text.as_bytes();
        if bytes[0] != b'0' + number {
            return Err(TleParseError::InvalidLineNumber { line: number, found: char::from(bytes[0]) });
        }
        let found = char::from(bytes[TLE_LINE_LEN - 1]);
        let computed = checksum(text);
        if found.to_digit(10) != Some(u32::from(computed)) {
            return Err(TleParseError::Checksum { line: number, computed, found });
        }
        Ok(Self { number, text })
    }

    fn float(&self, field: &Field) -> Result<f64, TleParseError> {
        let raw = field.text(self.text);
        let trimmed = raw.trim();
        let numeric = trimmed.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-'));
        if trimmed.is_empty() || !numeric {
            return Err(field.invalid(self.number, raw));
        }
        with_leading_zero(trimmed)
            .parse::<f64>()
            .map_err(|_| field.invalid(self.number, raw))
    }

    fn integer(&self, field: &Field) -> Result<u32, TleParseError> {
        let raw = field.text(self.text);
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(field.invalid(self.number, raw));
        }
        trimmed.parse::<u32>().map_err(|_| field.invalid(self.number, raw))
    }

    /// Bookkeeping counters some producers leave blank.
    fn counter(&self, field: &Field) -> Result<u32, TleParseError> {
        if field.text(self.text).trim().is_empty() {
            return Ok(0);
        }
        self.integer(field)
    }

    /// Digits with an implied leading "0." (eccentricity).
    fn implied_decimal(&self, field: &Field) -> Result<f64, TleParseError> {
        let raw = field.text(self.text);
        let digits = raw.replace(' ', "0");
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(field.invalid(self.number, raw));
        }
        format!("0.{digits}").parse::<f64>().map_err(|_| field.invalid(self.number, raw))
    }

    /// `±NNNNN±E`: mantissa 0.NNNNN scaled by 10^±E.
    fn exponent(&self, field: &Field) -> Result<f64, TleParseError> {
        let raw = field.text(self.text);
        let bytes = raw.as_bytes();
        let sign = match bytes[0] {
            b' ' | b'+' => "",
            b'-' => "-",
            _ => return Err(field.invalid(self.number, raw)),
        };
        let digits = raw[1..6].replace(' ', "0");
        if !digits.bytes().all(|b| b.is_ascii_digit()) || !bytes[7].is_ascii_digit() {
            return Err(field.invalid(self.number, raw));
        }
        let magnitude = i32::from(bytes[7] - b'0');
        let exponent = match bytes[6] {
            b'-' => -magnitude,
            b'+' | b' ' => magnitude,
            _ => return Err(field.invalid(self.number, raw)),
        };
        let mantissa = format!("{sign}0.{digits}")
            .parse::<f64>()
            .map_err(|_| field.invalid(self.number, raw))?;
        Ok(mantissa * 10f64.powi(exponent))
    }

    /// Five-column catalog number, including the Alpha-5 letter prefix.
    fn catalog_number(&self) -> Result<u32, TleParseError> {
        let raw = CATALOG_NUMBER.text(self.text);
        let first = raw.as_bytes()[0];
        if first.is_ascii_alphabetic() {
            let prefix = alpha5_value(first.to_ascii_uppercase())
                .ok_or_else(|| CATALOG_NUMBER.invalid(self.number, raw))?;
            let rest = &raw[1..];
            if !rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CATALOG_NUMBER.invalid(self.number, raw));
            }
            let low = rest.parse::<u32>().map_err(|_| CATALOG_NUMBER.invalid(self.number, raw))?;
            return Ok(prefix * 10_000 + low);
        }
        self.integer(&CATALOG_NUMBER)
    }

    fn classification(&self) -> Result<char, TleParseError> {
        let raw = line1::CLASSIFICATION.text(self.text);
        match raw.as_bytes()[0] {
            b' ' => Ok('U'),
            b if b.is_ascii_alphabetic() => Ok(char::from(b.to_ascii_uppercase())),
            _ => Err(line1::CLASSIFICATION.invalid(self.number, raw)),
        }
    }

    fn ephemeris_type(&self) -> Result<u8, TleParseError> {
        let raw = line1::EPHEMERIS_TYPE.text(self.text);
        match raw.as_bytes()[0] {
            b' ' => Ok(0),
            b if b.is_ascii_digit() => Ok(b - b'0'),
            _ => Err(line1::EPHEMERIS_TYPE.invalid(self.number, raw)),
        }
    }
}

fn with_leading_zero(text: &str) -> String {
    match text.as_bytes() {
        [b'.', ..] => format!("0{text}"),
        [sign @ (b'-' | b'+'), b'.', ..] => format!("{}0{}", char::from(*sign), &text[1..]),
        _ => text.to_string(),
    }
}

/// Alpha-5 prefix letters A..Z without I and O map to 10..33.
fn alpha5_value(letter: u8) -> Option<u32> {
    let offset = u32::from(letter.checked_sub(b'A')?);
    match letter {
        b'A'..=b'H' => Some(offset + 10),
        b'J'..=b'N' => Some(offset + 9),
        b'P'..=b'Z' => Some(offset + 8),
        _ => None,
    }
}

fn alpha5_letter(value: u32) -> Option<char> {
    let letter = match value {
        10..=17 => b'A' + (value - 10) as u8,
        18..=22 => b'J' + (value - 18) as u8,
        23..=33 => b'P' + (value - 23) as u8,
        _ => return None,
    };
    Some(char::from(letter))
}

/// TLE checksum of the first 68 columns: digits count their value, '-' counts 1.
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(TLE_LINE_LEN - 1)
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

/// Immutable mean orbital elements of one satellite.
///
/// Angles are stored in radians, mean motion in radians per minute and
/// its derivatives in radians per minute squared / cubed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSet {
    name: Option<String>,
    catalog_number: u32,
    classification: char,
    international_designator: String,
    epoch_year: i32,
    epoch_day: f64,
    epoch: JulianDate,
    mean_motion_dot: f64,
    mean_motion_ddot: f64,
    bstar: f64,
    inclination: f64,
    raan: f64,
    eccentricity: f64,
    argument_of_perigee: f64,
    mean_anomaly: f64,
    mean_motion: f64,
    ephemeris_type: u8,
    element_number: u32,
    revolution_number: u32,
}

/// Element fields as catalog JSON records carry them: degrees, rev/day, UTC epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanElementFields {
    pub name: Option<String>,
    pub catalog_number: u32,
    pub classification: char,
    pub international_designator: String,
    pub epoch: DateTime<Utc>,
    /// rev/day^2, the n-dot/2 value printed in TLEs.
    pub mean_motion_dot: f64,
    /// rev/day^3, the n-ddot/6 value printed in TLEs.
    pub mean_motion_ddot: f64,
    pub bstar: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub argument_of_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    pub mean_motion_rev_per_day: f64,
    pub ephemeris_type: u8,
    pub element_number: u32,
    pub revolution_number: u32,
}

/// Parses a bare two-line element set.
pub fn parse(line1: &str, line2: &str) -> Result<ElementSet, TleParseError> {
    parse_with_name(None, line1, line2)
}

pub fn parse_with_name(name: Option<String>, line1: &str, line2: &str) -> Result<ElementSet, TleParseError> {
    let l1 = Line::checked(1, line1)?;
    let l2 = Line::checked(2, line2)?;

    let catalog_number = l1.catalog_number()?;
    let line2_catalog = l2.catalog_number()?;
    if catalog_number != line2_catalog {
        return Err(TleParseError::CatalogMismatch { line1: catalog_number, line2: line2_catalog });
    }

    let epoch_year = time::expand_two_digit_year(l1.integer(&line1::EPOCH_YEAR)?);
    let epoch_day = l1.float(&line1::EPOCH_DAY)?;
    if !(1.0..367.0).contains(&epoch_day) {
        return Err(line1::EPOCH_DAY.invalid(1, line1::EPOCH_DAY.text(l1.text)));
    }

    let elements = ElementSet {
        name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        catalog_number,
        classification: l1.classification()?,
        international_designator: line1::DESIGNATOR.text(l1.text).trim().to_string(),
        epoch_year,
        epoch_day,
        epoch: JulianDate::from_year_and_day(epoch_year, epoch_day),
        mean_motion_dot: l1.float(&line1::MEAN_MOTION_DOT)? / (XPDOTP * MINUTES_PER_DAY),
        mean_motion_ddot: l1.exponent(&line1::MEAN_MOTION_DDOT)? / (XPDOTP * MINUTES_PER_DAY * MINUTES_PER_DAY),
        bstar: l1.exponent(&line1::BSTAR)?,
        inclination: l2.float(&line2::INCLINATION)?.to_radians(),
        raan: l2.float(&line2::RAAN)?.to_radians(),
        eccentricity: l2.implied_decimal(&line2::ECCENTRICITY)?,
        argument_of_perigee: l2.float(&line2::ARGUMENT_OF_PERIGEE)?.to_radians(),
        mean_anomaly: l2.float(&line2::MEAN_ANOMALY)?.to_radians(),
        mean_motion: l2.float(&line2::MEAN_MOTION)? / XPDOTP,
        ephemeris_type: l1.ephemeris_type()?,
        element_number: l1.counter(&line1::ELEMENT_NUMBER)?,
        revolution_number: l2.counter(&line2::REVOLUTION_NUMBER)?,
    };
    elements.validated()
}

/// Parses TLE text holding any mix of 2-line and 3-line (named) entries.
/// Every entry yields its own result; a broken entry never stops the rest.
pub fn parse_tle_text(text: &str) -> Vec<Result<ElementSet, TleParseError>> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).filter(|l| !l.is_empty()).collect();

    let mut results = Vec::new();
    let mut pending_name: Option<String> = None;
    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i];
        if line.starts_with("1 ") {
            let name = pending_name.take();
            match lines.get(i + 1) {
                Some(next) if next.starts_with("2 ") => {
                    debug!("Parsing TLE at lines {}, {}", i + 1, i + 2);
                    let parsed = parse_with_name(name, line, next);
                    if let Err(e) = &parsed {
                        warn!(line = i + 1, error = %e, "Rejected TLE entry");
                    }
                    results.push(parsed);
                    i += 2;
                }
                _ => {
                    warn!(line = i + 1, "Invalid TLE pair: missing line 2");
                    results.push(Err(TleParseError::InvalidPair { line: i + 1 }));
                    i += 1;
                }
            }
        } else if line.starts_with("2 ") {
            warn!(line = i + 1, "Invalid TLE pair: line 2 without line 1");
            results.push(Err(TleParseError::InvalidPair { line: i + 1 }));
            pending_name = None;
            i += 1;
        } else {
            let name = line.strip_prefix("0 ").unwrap_or(line);
            pending_name = Some(name.trim().to_string());
            i += 1;
        }
    }

    info!(entries = results.len(), parsed = results.iter().filter(|r| r.is_ok()).count(), "Parsed TLE text");
    results
}

impl ElementSet {
    /// Builds a validated element set from catalog fields.
    pub fn from_fields(fields: MeanElementFields) -> Result<Self, TleParseError> {
        let elements = ElementSet {
            name: fields.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            catalog_number: fields.catalog_number,
            classification: fields.classification,
            international_designator: fields.international_designator.trim().to_string(),
            epoch_year: fields.epoch.year(),
            epoch_day: time::day_of_year(fields.epoch),
            epoch: JulianDate::from_utc(fields.epoch),
            mean_motion_dot: fields.mean_motion_dot / (XPDOTP * MINUTES_PER_DAY),
            mean_motion_ddot: fields.mean_motion_ddot / (XPDOTP * MINUTES_PER_DAY * MINUTES_PER_DAY),
            bstar: fields.bstar,
            inclination: fields.inclination_deg.to_radians(),
            raan: fields.raan_deg.to_radians(),
            eccentricity: fields.eccentricity,
            argument_of_perigee: fields.argument_of_perigee_deg.to_radians(),
            mean_anomaly: fields.mean_anomaly_deg.to_radians(),
            mean_motion: fields.mean_motion_rev_per_day / XPDOTP,
            ephemeris_type: fields.ephemeris_type,
            element_number: fields.element_number,
            revolution_number: fields.revolution_number,
        };
        elements.validated()
    }

    fn validated(self) -> Result<Self, TleParseError> {
        let values = [
            ("epoch", self.epoch.total()),
            ("mean motion first derivative", self.mean_motion_dot),
            ("mean motion second derivative", self.mean_motion_ddot),
            ("drag term", self.bstar),
            ("inclination", self.inclination),
            ("right ascension of ascending node", self.raan),
            ("eccentricity", self.eccentricity),
            ("argument of perigee", self.argument_of_perigee),
            ("mean anomaly", self.mean_anomaly),
            ("mean motion", self.mean_motion),
        ];
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TleParseError::InvalidElements(format!("{name} is not finite")));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(TleParseError::InvalidElements(format!("eccentricity {} outside [0, 1)", self.eccentricity)));
        }
        if self.mean_motion <= 0.0 {
            return Err(TleParseError::InvalidElements(format!("mean motion {} must be positive", self.mean_motion)));
        }
        if self.inclination < 0.0 || self.inclination.to_degrees() > 180.0 {
            return Err(TleParseError::InvalidElements(format!(
                "inclination {:.4} deg outside [0, 180]",
                self.inclination.to_degrees()
            )));
        }
        let xke = GravityModel::Wgs72.constants().xke;
        let semi_major_axis = (xke / self.mean_motion).powf(2.0 / 3.0);
        if semi_major_axis <= 1.0 {
            return Err(TleParseError::InvalidElements(format!(
                "semi-major axis of {semi_major_axis:.4} Earth radii is inside the Earth"
            )));
        }
        Ok(self)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn catalog_number(&self) -> u32 {
        self.catalog_number
    }

    pub fn classification(&self) -> char {
        self.classification
    }

    pub fn international_designator(&self) -> &str {
        &self.international_designator
    }

    pub fn epoch_year(&self) -> i32 {
        self.epoch_year
    }

    pub fn epoch_day(&self) -> f64 {
        self.epoch_day
    }

    /// Epoch as a split Julian date.
    pub fn epoch(&self) -> JulianDate {
        self.epoch
    }

    pub fn epoch_utc(&self) -> Option<DateTime<Utc>> {
        self.epoch.to_utc()
    }

    /// rad/min^2
    pub fn mean_motion_dot(&self) -> f64 {
        self.mean_motion_dot
    }

    /// rad/min^3
    pub fn mean_motion_ddot(&self) -> f64 {
        self.mean_motion_ddot
    }

    pub fn bstar(&self) -> f64 {
        self.bstar
    }

    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    pub fn raan(&self) -> f64 {
        self.raan
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn argument_of_perigee(&self) -> f64 {
        self.argument_of_perigee
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.mean_anomaly
    }

    /// Kozai mean motion in rad/min.
    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    pub fn mean_motion_rev_per_day(&self) -> f64 {
        self.mean_motion * XPDOTP
    }

    /// Orbital period in minutes from the Kozai mean motion.
    pub fn period_minutes(&self) -> f64 {
        2.0 * PI / self.mean_motion
    }

    pub fn ephemeris_type(&self) -> u8 {
        self.ephemeris_type
    }

    pub fn element_number(&self) -> u32 {
        self.element_number
    }

    pub fn revolution_number(&self) -> u32 {
        self.revolution_number
    }

    /// Re-encodes the set in the fixed-column format with fresh checksums.
    pub fn to_tle_lines(&self) -> Result<(String, String), TleParseError> {
        let catalog = encode_catalog_number(self.catalog_number)?;
        if !(1957..=2056).contains(&self.epoch_year) {
            return Err(TleParseError::Unencodable { field: "epoch year", value: f64::from(self.epoch_year) });
        }
        let eccentricity = (self.eccentricity * 1e7).round();
        if eccentricity > 9_999_999.0 {
            return Err(TleParseError::Unencodable { field: "eccentricity", value: self.eccentricity });
        }

        let line1 = format!(
            "1 {catalog}{class} {designator:<8.8} {yy:02}{day:012.8} {ndot} {nddot} {bstar} {ephemeris} {element:>4}",
            class = self.classification,
            designator = self.international_designator,
            yy = self.epoch_year % 100,
            day = self.epoch_day,
            ndot = encode_decimal_fraction(
                "mean motion first derivative",
                self.mean_motion_dot * XPDOTP * MINUTES_PER_DAY,
            )?,
            nddot = encode_exponent(
                "mean motion second derivative",
                self.mean_motion_ddot * XPDOTP * MINUTES_PER_DAY * MINUTES_PER_DAY
            )?,
            bstar = encode_exponent("drag term", self.bstar)?,
            ephemeris = self.ephemeris_type % 10,
            element = self.element_number % 10_000,
        );
        let line2 = format!(
            "2 {catalog} {inclination:8.4} {raan:8.4} {eccentricity:07} \
             {argp:8.4} {anomaly:8.4} {motion:11.8}{revolution:>5}",
            inclination = self.inclination.to_degrees(),
            raan = self.raan.to_degrees().rem_euclid(360.0),
            eccentricity = eccentricity as u32,
            argp = self.argument_of_perigee.to_degrees().rem_euclid(360.0),
            anomaly = self.mean_anomaly.to_degrees().rem_euclid(360.0),
            motion = self.mean_motion_rev_per_day(),
            revolution = self.revolution_number % 100_000,
        );
        Ok((with_checksum(line1, "line 1")?, with_checksum(line2, "line 2")?))
    }
}

fn with_checksum(mut line: String, field: &'static str) -> Result<String, TleParseError> {
    if line.len() != TLE_LINE_LEN - 1 {
        return Err(TleParseError::Unencodable { field, value: line.len() as f64 });
    }
    let sum = checksum(&line);
    line.push(char::from(b'0' + sum));
    Ok(line)
}

fn encode_catalog_number(number: u32) -> Result<String, TleParseError> {
    if number < 100_000 {
        return Ok(format!("{number:05}"));
    }
    alpha5_letter(number / 10_000)
        .map(|letter| format!("{letter}{:04}", number % 10_000))
        .ok_or(TleParseError::Unencodable { field: "catalog number", value: f64::from(number) })
}

/// ` .NNNNNNNN` / `-.NNNNNNNN`
fn encode_decimal_fraction(field: &'static str, value: f64) -> Result<String, TleParseError> {
    let digits = format!("{:.8}", value.abs());
    match digits.strip_prefix('0') {
        Some(fraction) => Ok(format!("{}{fraction}", if value < 0.0 { '-' } else { ' ' })),
        None => Err(TleParseError::Unencodable { field, value }),
    }
}

/// `±NNNNN±E`
fn encode_exponent(field: &'static str, value: f64) -> Result<String, TleParseError> {
    if value == 0.0 {
        return Ok(" 00000-0".to_string());
    }
    let magnitude = value.abs();
    let mut exponent = magnitude.log10().floor() as i32 + 1;
    let mut mantissa = (magnitude / 10f64.powi(exponent) * 1e5).round() as u32;
    if mantissa >= 100_000 {
        mantissa /= 10;
        exponent += 1;
    }
    if !(-9..=9).contains(&exponent) {
        return Err(TleParseError::Unencodable { field, value });
    }
    Ok(format!(
        "{}{mantissa:05}{}{}",
        if value < 0.0 { '-' } else { ' ' },
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    ))
}
