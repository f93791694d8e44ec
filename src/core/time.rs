//! Julian dates, TLE epoch decoding and the clock seam used by the CLI and API.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::Serialize;

pub const MINUTES_PER_DAY: f64 = 1440.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
/// Julian date of 1949-12-31 00:00 UT; SGP4 counts its internal epoch in days from here.
pub const JD_1950: f64 = 2_433_281.5;
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const JD_J2000: f64 = 2_451_545.0;

/// A Julian date kept as a whole part and a day fraction so that
/// minute-level differences keep full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JulianDate {
    pub jd: f64,
    pub fr: f64,
}

impl JulianDate {
    pub fn new(jd: f64, fr: f64) -> Self {
        Self { jd, fr }
    }

    /// Julian date of a UTC calendar instant, valid for 1900..2100.
    pub fn from_calendar(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> Self {
        let y = f64::from(year);
        let m = f64::from(month);
        let mut jd = 367.0 * y - ((7.0 * (y + ((m + 9.0) / 12.0).floor())) * 0.25).floor()
            + (275.0 * m / 9.0).floor()
            + f64::from(day)
            + 1_721_013.5;
        let mut fr = (second + f64::from(minute) * 60.0 + f64::from(hour) * 3600.0) / SECONDS_PER_DAY;
        if fr.abs() > 1.0 {
            let whole = fr.floor();
            jd += whole;
            fr -= whole;
        }
        Self { jd, fr }
    }

    /// Decodes a TLE epoch: full year plus fractional day of year (1.0 is Jan 1 00:00).
    pub fn from_year_and_day(year: i32, day_of_year: f64) -> Self {
        let (month, day, hour, minute, second) = days_to_calendar(year, day_of_year);
        Self::from_calendar(year, month, day, hour, minute, second)
    }

    pub fn from_utc(t: DateTime<Utc>) -> Self {
        let second = f64::from(t.second()) + f64::from(t.nanosecond()) / 1e9;
        Self::from_calendar(t.year(), t.month(), t.day(), t.hour(), t.minute(), second)
    }

    pub fn total(&self) -> f64 {
        self.jd + self.fr
    }

    /// Minutes elapsed from `origin` to `self`, differencing the parts separately.
    pub fn minutes_since(&self, origin: &JulianDate) -> f64 {
        (self.jd - origin.jd) * MINUTES_PER_DAY + (self.fr - origin.fr) * MINUTES_PER_DAY
    }

    /// Shifts the date by a number of minutes, keeping the whole part fixed.
    pub fn add_minutes(&self, minutes: f64) -> Self {
        Self { jd: self.jd, fr: self.fr + minutes / MINUTES_PER_DAY }
    }

    /// Nearest nanosecond. Whole days and the day fraction are converted
    /// separately so the fraction keeps its precision.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        if !self.jd.is_finite() || !self.fr.is_finite() {
            return None;
        }
        let day_offset = self.jd - JD_UNIX_EPOCH;
        let whole_days = day_offset.floor();
        let day_seconds = (day_offset - whole_days + self.fr) * SECONDS_PER_DAY;
        let whole_seconds = day_seconds.floor();
        let mut nanos = ((day_seconds - whole_seconds) * 1e9).round() as i64;
        let mut secs = (whole_days as i64).checked_mul(86_400)?.checked_add(whole_seconds as i64)?;
        if nanos >= 1_000_000_000 {
            secs += 1;
            nanos -= 1_000_000_000;
        }
        Utc.timestamp_opt(secs, nanos as u32).single()
    }
}

/// Month, day, hour, minute and second for a fractional day of year.
pub fn days_to_calendar(year: i32, day_of_year: f64) -> (u32, u32, u32, u32, f64) {
    let mut month_lengths = [31u32, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if year % 4 == 0 {
        month_lengths[1] = 29;
    }
    let whole_day = day_of_year.floor() as u32;
    let mut month = 1usize;
    let mut elapsed = 0u32;
    while whole_day > elapsed + month_lengths[month - 1] && month < 12 {
        elapsed += month_lengths[month - 1];
        month += 1;
    }
    let day = whole_day - elapsed;

    let hours = (day_of_year - f64::from(whole_day)) * 24.0;
    let hour = hours.floor();
    let minutes = (hours - hour) * 60.0;
    let minute = minutes.floor();
    let second = (minutes - minute) * 60.0;
    (month as u32, day, hour as u32, minute as u32, second)
}

/// Expands the two-digit TLE epoch year: 57..=99 are 1900s, 00..=56 are 2000s.
pub fn expand_two_digit_year(yy: u32) -> i32 {
    if yy < 57 {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

/// Fractional day of year of a UTC instant (Jan 1 00:00 is 1.0).
pub fn day_of_year(t: DateTime<Utc>) -> f64 {
    let seconds = f64::from(t.num_seconds_from_midnight()) + f64::from(t.nanosecond()) / 1e9;
    f64::from(t.ordinal()) + seconds / SECONDS_PER_DAY
}

/// Greenwich mean sidereal time (IAU-82) in radians for a UT1 Julian date.
pub fn gstime(jd_ut1: f64) -> f64 {
    let tut1 = (jd_ut1 - JD_J2000) / 36_525.0;
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812866) * tut1
        + 67_310.54841;
    let mut theta = (seconds * (PI / 180.0) / 240.0) % (2.0 * PI);
    if theta < 0.0 {
        theta += 2.0 * PI;
    }
    theta
}

/// Source of "now" for callers that propagate to the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// When to evaluate an element set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Minutes(f64),
    Julian(JulianDate),
    Utc(DateTime<Utc>),
}

impl Target {
    pub fn minutes_since(&self, epoch: &JulianDate) -> f64 {
        match self {
            Target::Minutes(minutes) => *minutes,
            Target::Julian(jd) => jd.minutes_since(epoch),
            Target::Utc(t) => JulianDate::from_utc(*t).minutes_since(epoch),
        }
    }
}
