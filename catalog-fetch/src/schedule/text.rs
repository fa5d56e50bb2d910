//! Schedule text grammar
//!
//! A schedule item describes its meetings in free Hebrew text, e.g.
//! `מ 01.11., יום שני 10:30-12:30, יום רביעי 14:30 - 16:30, הכל 13 ימים`.
//! Date-range qualifiers and trailers are stripped, and what remains must be a
//! comma-separated list of weekly fragments.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CatalogError, Result};
use crate::types::Weekday;

/// Marker the service uses for meetings without a weekly pattern
pub const IRREGULAR_MARKER: &str = "לֹא סָדִיר";

static SINGLE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d\d\.\d\d\.: \d\d:\d\d-\d\d:\d\d$").expect("valid single date regex")
});

static DATE_LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d\d\.\d\d\., )+בהתאמה \d\d:\d\d-\d\d:\d\d$").expect("valid date list regex")
});

/// Qualifiers removed before splitting, applied in order
static CLEANUP_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^מ \d\d\.\d\d\., ",
        r"^עד \d\d\.\d\d\., ",
        r"^\d\d\.\d\d\. עד \d\d\.\d\d\., ",
        r", יוצא מן הכלל: .*$",
        r", הכל \d+ ימים$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid cleanup regex"))
    .collect()
});

static FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:יום|יוֹם) (רִאשׁוֹ|שני|שלישי|רביעי|חמישי|שישי) (\d\d:\d\d)\s*-\s*(\d\d:\d\d)$")
        .expect("valid fragment regex")
});

/// One weekly meeting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyMeeting {
    pub weekday: Weekday,
    pub start: String,
    pub end: String,
}

impl WeeklyMeeting {
    /// `HH:MM - HH:MM`
    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start, self.end)
    }
}

/// Classified schedule text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleText {
    /// No schedule given
    Empty,
    /// Explicitly irregular
    Irregular,
    /// Specific calendar dates, not part of the weekly timetable
    SpecificDates,
    Weekly(Vec<WeeklyMeeting>),
}

/// Classify and parse a schedule text
pub fn parse_schedule_text(text: &str) -> Result<ScheduleText> {
    if text.is_empty() {
        return Ok(ScheduleText::Empty);
    }

    if text == IRREGULAR_MARKER {
        return Ok(ScheduleText::Irregular);
    }

    if SINGLE_DATE_RE.is_match(text) || DATE_LIST_RE.is_match(text) {
        return Ok(ScheduleText::SpecificDates);
    }

    let mut cleaned = text.to_string();
    for rule in CLEANUP_RULES.iter() {
        cleaned = rule.replace(&cleaned, "").into_owned();
    }

    let meetings = cleaned
        .split(',')
        .map(|fragment| parse_fragment(fragment.trim()))
        .collect::<Result<Vec<_>>>()?;

    Ok(ScheduleText::Weekly(meetings))
}

fn parse_fragment(fragment: &str) -> Result<WeeklyMeeting> {
    let invalid = || CatalogError::data_shape(format!("Invalid date and time: {}", fragment));

    let caps = FRAGMENT_RE.captures(fragment).ok_or_else(invalid)?;
    let weekday = Weekday::from_label(&caps[1]).ok_or_else(invalid)?;

    Ok(WeeklyMeeting {
        weekday,
        start: caps[2].to_string(),
        end: caps[3].to_string(),
    })
}
