//! General course metadata
//!
//! Builds the ordered "general" section of a course record from the raw
//! course detail: identity, relations, prerequisites, adjoining courses,
//! points, staff, notes and exam dates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::exams::{reconcile_exam_dates, ExamKind};
use super::number::{to_new_course_number, zero_pad};
use crate::error::{CatalogError, Result};
use crate::types::{RawCourse, RawPerson, RawPrereq, RawRelation};

const COURSE_ID_PREFIX: &str = "SM";

static POINTS_TRAILING_ZEROS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\.[1-9]+)0+$").expect("valid points regex"));
static POINTS_ZERO_FRACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.0+$").expect("valid points regex"));

static PREREQ_SINGLE_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)\)").expect("valid prerequisite regex"));
static PREREQ_OUTER_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(([^()]+)\)$").expect("valid prerequisite regex"));

static ADJOINING_NOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:מקצוע צמוד|מקצועות צמודים):(.*)").expect("valid adjoining regex")
});
static ADJOINING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5,8}$").expect("valid adjoining regex"));

/// The "general" section of a course record
///
/// Field order is the output key order. Optional sections are omitted when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneralInfo {
    #[serde(rename = "מספר מקצוע")]
    pub course_number: String,
    #[serde(rename = "שם מקצוע")]
    pub name: String,
    #[serde(rename = "סילבוס")]
    pub syllabus: String,
    #[serde(rename = "פקולטה")]
    pub faculty: String,
    #[serde(rename = "מסגרת לימודים")]
    pub academic_level: String,
    #[serde(rename = "מקצועות קדם", skip_serializing_if = "String::is_empty")]
    pub prerequisites: String,
    #[serde(rename = "מקצועות צמודים", skip_serializing_if = "String::is_empty")]
    pub adjoining: String,
    #[serde(rename = "מקצועות ללא זיכוי נוסף", skip_serializing_if = "String::is_empty")]
    pub no_extra_credit: String,
    #[serde(
        rename = "מקצועות ללא זיכוי נוסף (מכילים)",
        skip_serializing_if = "String::is_empty"
    )]
    pub no_extra_credit_including: String,
    #[serde(
        rename = "מקצועות ללא זיכוי נוסף (מוכלים)",
        skip_serializing_if = "String::is_empty"
    )]
    pub no_extra_credit_included: String,
    #[serde(rename = "נקודות")]
    pub points: String,
    #[serde(rename = "אחראים")]
    pub responsible: String,
    #[serde(rename = "הערות")]
    pub notes: String,
    #[serde(rename = "מועד א", skip_serializing_if = "String::is_empty")]
    pub final_a: String,
    #[serde(rename = "מועד ב", skip_serializing_if = "String::is_empty")]
    pub final_b: String,
    #[serde(rename = "בוחן מועד א", skip_serializing_if = "String::is_empty")]
    pub midterm_a: String,
    #[serde(rename = "בוחן מועד ב", skip_serializing_if = "String::is_empty")]
    pub midterm_b: String,
}

/// Course number without the service's `SM` object prefix
pub fn course_number_from_id(course_id: &str) -> Result<String> {
    course_id
        .strip_prefix(COURSE_ID_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::data_shape(format!("Invalid course number: {}", course_id)))
}

/// Drop insignificant trailing zeros: `3.50` -> `3.5`, `2.0` -> `2`
pub fn format_points(points: &str) -> String {
    let trimmed = POINTS_TRAILING_ZEROS_RE.replace(points, "${1}");
    POINTS_ZERO_FRACTION_RE.replace(&trimmed, "").into_owned()
}

/// One line per responsible person
pub fn format_responsible(persons: &[RawPerson]) -> String {
    persons
        .iter()
        .map(|p| format!("{} {} {}", p.title, p.first_name, p.last_name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Courses that give no extra credit together with this one
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Relations {
    pub no_extra_credit: Vec<String>,
    /// Courses that contain this one
    pub including: Vec<String>,
    /// Courses contained in this one
    pub included: Vec<String>,
}

/// Sort relations by kind
///
/// `AZID` is listed with `AZEC`; the service does not document a difference.
pub fn classify_relations(relations: &[RawRelation]) -> Result<Relations> {
    let mut result = Relations::default();

    for relation in relations {
        let course = relation
            .course_id
            .strip_prefix(COURSE_ID_PREFIX)
            .unwrap_or(&relation.course_id)
            .to_string();

        match relation.kind.as_str() {
            "AZEC" | "AZID" => result.no_extra_credit.push(course),
            "AZCC" => result.including.push(course),
            "BZCC" => result.included.push(course),
            other => {
                return Err(CatalogError::data_shape(format!(
                    "Invalid relationship: {}",
                    other
                )))
            }
        }
    }

    Ok(result)
}

/// Render the prerequisite expression, e.g. `(02340114 ו-02340124) או 01040031`
pub fn format_prerequisites(tokens: &[RawPrereq]) -> Result<String> {
    let mut expr = String::new();

    for token in tokens {
        expr.push_str(&token.bracket);
        if !token.module_id.trim_start_matches('0').is_empty() {
            expr.push_str(&token.module_id);
        }
        match token.operator.as_str() {
            "AND" => expr.push_str(" ו-"),
            "OR" => expr.push_str(" או "),
            "" => {}
            other => {
                return Err(CatalogError::data_shape(format!(
                    "Invalid operator: {}",
                    other
                )))
            }
        }
    }

    let expr = PREREQ_SINGLE_PAREN_RE.replace_all(&expr, "${1}");
    Ok(PREREQ_OUTER_PAREN_RE.replace(&expr, "${1}").into_owned())
}

/// Adjoining courses named in the semester note, as 8-digit numbers
pub fn adjoining_courses(note: &str) -> Result<Vec<String>> {
    let Some(caps) = ADJOINING_NOTE_RE.captures(note) else {
        return Ok(Vec::new());
    };

    caps[1]
        .split(',')
        .map(|course| {
            let course = course.trim();
            if !ADJOINING_NUMBER_RE.is_match(course) {
                return Err(CatalogError::data_shape(format!(
                    "Invalid adjoining course: {}",
                    course
                )));
            }

            if course.chars().count() <= 6 {
                Ok(to_new_course_number(&zero_pad(course, 6)))
            } else {
                Ok(zero_pad(course, 8))
            }
        })
        .collect()
}

/// Build the general section from a raw course record
pub fn build_general(course: &RawCourse) -> Result<GeneralInfo> {
    let course_number = course_number_from_id(&course.course_id)?;
    let relations = classify_relations(&course.relations.results)?;
    let prerequisites = format_prerequisites(&course.prerequisites.results)?;
    let adjoining = adjoining_courses(&course.semester_note)?;

    let exams = &course.exams.results;
    let exam_text = |kind: ExamKind| reconcile_exam_dates(exams, kind);

    Ok(GeneralInfo {
        course_number,
        name: course.name.clone(),
        syllabus: course.syllabus.clone(),
        faculty: course.faculty.clone(),
        academic_level: course.academic_level.clone(),
        prerequisites,
        adjoining: adjoining.join(" "),
        no_extra_credit: relations.no_extra_credit.join(" "),
        no_extra_credit_including: relations.including.join(" "),
        no_extra_credit_included: relations.included.join(" "),
        points: format_points(&course.points),
        responsible: format_responsible(&course.responsible.results),
        notes: course.semester_note.clone(),
        final_a: exam_text(ExamKind::FinalA)?,
        final_b: exam_text(ExamKind::FinalB)?,
        midterm_a: exam_text(ExamKind::MidtermA)?,
        midterm_b: exam_text(ExamKind::MidtermB)?,
    })
}
