//! Course number normalization
//!
//! Older notes refer to courses by their 6-digit numbers. Current numbers have
//! 8 digits: a zero is inserted before each 3-digit half, except for the
//! `9730xx` series, which moved to `970300xx`.

use once_cell::sync::Lazy;
use regex::Regex;

static LEGACY_9730_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^9730(\d\d)$").expect("valid course number regex"));

static SIX_DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d\d\d)(\d\d\d)$").expect("valid course number regex"));

/// Convert a 6-digit course number to its 8-digit form; anything else is returned unchanged
pub fn to_new_course_number(course: &str) -> String {
    if let Some(caps) = LEGACY_9730_RE.captures(course) {
        return format!("970300{}", &caps[1]);
    }

    if let Some(caps) = SIX_DIGIT_RE.captures(course) {
        return format!("0{}0{}", &caps[1], &caps[2]);
    }

    course.to_string()
}

/// Left-pad a digit string with zeros to `width`
pub(crate) fn zero_pad(digits: &str, width: usize) -> String {
    format!("{:0>width$}", digits, width = width)
}
