//! Date and time-of-day literals used by the catalog service
//!
//! The service encodes dates as `/Date(<epoch milliseconds>)/` and times of day
//! as ISO-8601 durations with exactly two digits per field (`PT10H30M00S`).

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/Date\((\d+)\)/$").expect("valid date regex"));

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PT(\d\d)H(\d\d)M(\d\d)S$").expect("valid duration regex"));

/// Parse a `/Date(ms)/` literal into a UTC timestamp
pub fn parse_service_date(raw: &str) -> Result<DateTime<Utc>> {
    let caps = DATE_RE
        .captures(raw)
        .ok_or_else(|| Error::Parse(format!("Invalid date: {}", raw)))?;

    let millis: i64 = caps[1]
        .parse()
        .map_err(|_| Error::Parse(format!("Invalid date: {}", raw)))?;

    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::Parse(format!("Date out of range: {}", raw)))
}

/// Weekday of a service date, numbered from Sunday = 0
pub fn weekday_from_sunday(date: &DateTime<Utc>) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Time of day decoded from a `PTxxHxxMxxS` literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ClockTime {
    /// `HH:MM` rendering (seconds dropped)
    pub fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hours, self.minutes)
    }

    pub fn is_midnight(&self) -> bool {
        self.hours == 0 && self.minutes == 0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hhmm())
    }
}

/// Parse a `PTxxHxxMxxS` literal
pub fn parse_service_time(raw: &str) -> Result<ClockTime> {
    let caps = DURATION_RE
        .captures(raw)
        .ok_or_else(|| Error::Parse(format!("Invalid time: {}", raw)))?;

    // Two ASCII digits per field always fit in u32
    let field = |i: usize| caps[i].parse::<u32>().unwrap_or_default();

    Ok(ClockTime {
        hours: field(1),
        minutes: field(2),
        seconds: field(3),
    })
}

/// Parse a `PTxxHxxM00S` literal, rejecting non-zero seconds
pub fn parse_whole_minute_time(raw: &str) -> Result<ClockTime> {
    let time = parse_service_time(raw)?;
    if time.seconds != 0 {
        return Err(Error::Parse(format!("Unexpected seconds in time: {}", raw)));
    }
    Ok(time)
}
