//! Core types for the catalog pipeline
//!
//! Two families live here:
//! - raw records, deserialized as-is from the catalog service's OData JSON
//! - canonical timetable types produced by the schedule normalization engine

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::error::{CatalogError, Result};

// ============================================================================
// Common Types
// ============================================================================

/// Academic term: a year plus a semester code (200 winter, 201 spring, 202 summer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    pub year: u16,
    pub semester: u16,
}

impl Term {
    pub fn new(year: u16, semester: u16) -> Self {
        Self { year, semester }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.semester)
    }
}

/// Teaching days; the timetable has no Saturday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    /// Canonical Hebrew label
    pub fn label(self) -> &'static str {
        match self {
            Weekday::Sunday => "ראשון",
            Weekday::Monday => "שני",
            Weekday::Tuesday => "שלישי",
            Weekday::Wednesday => "רביעי",
            Weekday::Thursday => "חמישי",
            Weekday::Friday => "שישי",
        }
    }

    /// Parse a day name as it appears in schedule text
    ///
    /// The service sometimes sends Sunday with vowel points and a truncated
    /// final letter; that spelling is folded into the canonical label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "רִאשׁוֹ" | "ראשון" => Some(Weekday::Sunday),
            "שני" => Some(Weekday::Monday),
            "שלישי" => Some(Weekday::Tuesday),
            "רביעי" => Some(Weekday::Wednesday),
            "חמישי" => Some(Weekday::Thursday),
            "שישי" => Some(Weekday::Friday),
            _ => None,
        }
    }

    /// Day number with Sunday = 0
    pub fn index(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Weekly slot used to join schedule text with per-occurrence room data
///
/// Times are `HH:MM`. The weekday is a raw Sunday-based number because
/// occurrences can fall on Saturday, which the timetable never uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    pub weekday: u32,
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn new(weekday: u32, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            weekday,
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Building name and room number; room 0 means "somewhere in the building"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub building: String,
    pub room: u32,
}

impl Location {
    pub fn new(building: impl Into<String>, room: u32) -> Self {
        Self {
            building: building.into(),
            room,
        }
    }
}

/// Rooms of one raw event, per weekly slot
pub type RoomLookupTable = HashMap<TimeSlot, Location>;

// ============================================================================
// Canonical Timetable Types
// ============================================================================

/// Everything about a timetable event except its group and display number
///
/// Groups that share a section must agree on these values exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventDetails {
    #[serde(rename = "סוג")]
    pub category: String,
    #[serde(rename = "יום")]
    pub weekday: Weekday,
    /// `HH:MM - HH:MM`
    #[serde(rename = "שעה")]
    pub time: String,
    #[serde(rename = "בניין")]
    pub building: String,
    #[serde(rename = "חדר")]
    pub room: u32,
    #[serde(rename = "מרצה/מתרגל")]
    pub staff: String,
}

/// Parsed event still carrying the service's raw event id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub group: u32,
    pub details: EventDetails,
    pub raw_event_id: String,
}

impl PendingEvent {
    /// Uniqueness key: group plus details
    pub fn same_slot(&self, other: &PendingEvent) -> bool {
        self.group == other.group && self.details == other.details
    }
}

/// One normalized timetable occurrence with its display number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalEvent {
    #[serde(rename = "קבוצה")]
    pub group: u32,
    #[serde(flatten)]
    pub details: EventDetails,
    #[serde(rename = "מס.")]
    pub event_number: u32,
}

// ============================================================================
// Raw Service Records
// ============================================================================

/// OData collection wrapper: `{"results": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct ODataList<T> {
    pub results: Vec<T>,
}

impl<T> Default for ODataList<T> {
    fn default() -> Self {
        Self { results: Vec::new() }
    }
}

/// `null` and missing both read as the empty string
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Person attached to a schedule item or listed as course responsible
#[derive(Debug, Clone, Deserialize)]
pub struct RawPerson {
    #[serde(rename = "Title", default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(rename = "FirstName", default, deserialize_with = "nullable_string")]
    pub first_name: String,
    #[serde(rename = "LastName", default, deserialize_with = "nullable_string")]
    pub last_name: String,
}

/// Schedule group (a course "group" number with its events)
#[derive(Debug, Clone, Deserialize)]
pub struct RawScheduleGroup {
    #[serde(rename = "ZzSeSeqnr")]
    pub group_id: String,
    #[serde(rename = "Name", default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(rename = "EObjectSet", default)]
    pub items: ODataList<RawScheduleItem>,
}

impl RawScheduleGroup {
    /// Numeric group id
    pub fn group_number(&self) -> Result<u32> {
        self.group_id
            .trim()
            .parse()
            .map_err(|_| CatalogError::data_shape(format!("Invalid group id: {}", self.group_id)))
    }
}

/// One event inside a schedule group
#[derive(Debug, Clone, Deserialize)]
pub struct RawScheduleItem {
    #[serde(rename = "Otjid")]
    pub event_id: String,
    #[serde(rename = "Name", default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(rename = "CategoryText", default, deserialize_with = "nullable_string")]
    pub category_text: String,
    #[serde(rename = "RoomText", default, deserialize_with = "nullable_string")]
    pub room_text: String,
    #[serde(rename = "RoomId", default, deserialize_with = "nullable_string")]
    pub room_id: String,
    #[serde(rename = "ScheduleSummary", default, deserialize_with = "nullable_string")]
    pub schedule_summary: String,
    #[serde(rename = "ScheduleText", default, deserialize_with = "nullable_string")]
    pub schedule_text: String,
    #[serde(rename = "Persons", default)]
    pub persons: ODataList<RawPerson>,
}

/// Dated occurrence of an event, with the rooms booked for it
#[derive(Debug, Clone, Deserialize)]
pub struct RawOccurrence {
    #[serde(rename = "Evdat", default, deserialize_with = "nullable_string")]
    pub date: String,
    #[serde(rename = "Beguz", default, deserialize_with = "nullable_string")]
    pub begin: String,
    #[serde(rename = "Enduz", default, deserialize_with = "nullable_string")]
    pub end: String,
    #[serde(rename = "Rooms", default)]
    pub rooms: ODataList<RawRoom>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRoom {
    #[serde(rename = "Otjid")]
    pub room_id: String,
    #[serde(rename = "Name", default, deserialize_with = "nullable_string")]
    pub name: String,
}

/// Exam or quiz offering
#[derive(Debug, Clone, Deserialize)]
pub struct RawExam {
    #[serde(rename = "CategoryCode", default, deserialize_with = "nullable_string")]
    pub category_code: String,
    #[serde(rename = "ZzExamOfferGuid", default, deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(rename = "ZzExamOfferParentGuid", default, deserialize_with = "nullable_string")]
    pub parent_id: String,
    #[serde(rename = "ExamDate", default, deserialize_with = "nullable_string")]
    pub date: String,
    #[serde(rename = "ExamBegTime", default, deserialize_with = "nullable_string")]
    pub begin: String,
    #[serde(rename = "ExamEndTime", default, deserialize_with = "nullable_string")]
    pub end: String,
}

/// Relation to another course
#[derive(Debug, Clone, Deserialize)]
pub struct RawRelation {
    #[serde(rename = "Otjid")]
    pub course_id: String,
    #[serde(rename = "ZzRelationshipKey", default, deserialize_with = "nullable_string")]
    pub kind: String,
}

/// One token of the prerequisite expression
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrereq {
    #[serde(rename = "Bracket", default, deserialize_with = "nullable_string")]
    pub bracket: String,
    #[serde(rename = "ModuleId", default, deserialize_with = "nullable_string")]
    pub module_id: String,
    #[serde(rename = "Operator", default, deserialize_with = "nullable_string")]
    pub operator: String,
}

/// Course detail record
#[derive(Debug, Clone, Deserialize)]
pub struct RawCourse {
    #[serde(rename = "Otjid")]
    pub course_id: String,
    #[serde(rename = "Points", default, deserialize_with = "nullable_string")]
    pub points: String,
    #[serde(rename = "Name", default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(rename = "StudyContentDescription", default, deserialize_with = "nullable_string")]
    pub syllabus: String,
    #[serde(rename = "OrgText", default, deserialize_with = "nullable_string")]
    pub faculty: String,
    #[serde(rename = "ZzAcademicLevelText", default, deserialize_with = "nullable_string")]
    pub academic_level: String,
    #[serde(rename = "ZzSemesterNote", default, deserialize_with = "nullable_string")]
    pub semester_note: String,
    #[serde(rename = "Responsible", default)]
    pub responsible: ODataList<RawPerson>,
    #[serde(rename = "Exams", default)]
    pub exams: ODataList<RawExam>,
    #[serde(rename = "SmRelations", default)]
    pub relations: ODataList<RawRelation>,
    #[serde(rename = "SmPrereq", default)]
    pub prerequisites: ODataList<RawPrereq>,
}

/// Course list entry
#[derive(Debug, Clone, Deserialize)]
pub struct RawCourseRef {
    #[serde(rename = "Otjid")]
    pub course_id: String,
}

/// Semester list entry
#[derive(Debug, Clone, Deserialize)]
pub struct RawSemester {
    #[serde(rename = "PiqYear")]
    pub year: String,
    #[serde(rename = "PiqSession")]
    pub session: String,
    #[serde(rename = "Begda", default, deserialize_with = "nullable_string")]
    pub begin: String,
    #[serde(rename = "Endda", default, deserialize_with = "nullable_string")]
    pub end: String,
}

/// Room object carrying its building
#[derive(Debug, Clone, Deserialize)]
pub struct RawBuilding {
    #[serde(rename = "Building", default, deserialize_with = "nullable_string")]
    pub building: String,
}
