//! Exam date reconciliation
//!
//! A course lists its exams as flat records. Roots carry the date; children
//! (one level only) may add the actual time slot. For each exam kind the
//! records are merged into a newline-separated list of `DD-MM-YYYY` or
//! `DD-MM-YYYY HH:MM - HH:MM` entries.

use std::collections::HashSet;

use catalog_common::time::{parse_service_date, parse_service_time};

use crate::error::{literal_error, CatalogError, Result};
use crate::types::RawExam;

/// Exam and quiz sittings reported in the course record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExamKind {
    /// First sitting, `FI`
    FinalA,
    /// Second sitting, `FB`
    FinalB,
    /// First midterm, `MI`
    MidtermA,
    /// Second midterm, `M2`
    MidtermB,
}

impl ExamKind {
    pub const ALL: [ExamKind; 4] = [
        ExamKind::FinalA,
        ExamKind::FinalB,
        ExamKind::MidtermA,
        ExamKind::MidtermB,
    ];

    /// Category code used by the service
    pub fn code(self) -> &'static str {
        match self {
            ExamKind::FinalA => "FI",
            ExamKind::FinalB => "FB",
            ExamKind::MidtermA => "MI",
            ExamKind::MidtermB => "M2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Key in the course general record
    pub fn label(self) -> &'static str {
        match self {
            ExamKind::FinalA => "מועד א",
            ExamKind::FinalB => "מועד ב",
            ExamKind::MidtermA => "בוחן מועד א",
            ExamKind::MidtermB => "בוחן מועד ב",
        }
    }
}

/// Check ids and nesting, then order records root-cluster by root-cluster
fn ordered_exams(exams: &[RawExam]) -> Result<Vec<&RawExam>> {
    let mut seen = HashSet::new();
    for exam in exams.iter().filter(|e| !e.id.is_empty()) {
        if !seen.insert(exam.id.as_str()) {
            return Err(CatalogError::data_shape(format!(
                "Duplicate exam ids: {}",
                exam.id
            )));
        }
    }

    let root_ids: Vec<&str> = exams
        .iter()
        .filter(|e| e.parent_id.is_empty())
        .map(|e| e.id.as_str())
        .collect();

    if let Some(orphan) = exams
        .iter()
        .find(|e| !e.parent_id.is_empty() && !root_ids.contains(&e.parent_id.as_str()))
    {
        return Err(CatalogError::data_shape(format!(
            "Invalid parent exam: {} -> {}",
            orphan.id, orphan.parent_id
        )));
    }

    let cluster_of = |exam: &RawExam| {
        let anchor = if exam.parent_id.is_empty() {
            exam.id.as_str()
        } else {
            exam.parent_id.as_str()
        };
        root_ids
            .iter()
            .position(|id| *id == anchor)
            .unwrap_or(usize::MAX)
    };

    let mut ordered: Vec<&RawExam> = exams.iter().collect();
    // Stable: records keep their relative order inside a cluster
    ordered.sort_by_key(|exam| (cluster_of(*exam), !exam.parent_id.is_empty()));
    Ok(ordered)
}

/// Merge the records of one exam kind into display text
///
/// Returns the empty string when the kind has no dated records.
pub fn reconcile_exam_dates(exams: &[RawExam], kind: ExamKind) -> Result<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut dates_with_time: HashSet<String> = HashSet::new();

    for exam in ordered_exams(exams)? {
        if exam.category_code != kind.code() {
            if ExamKind::from_code(&exam.category_code).is_none() {
                return Err(CatalogError::data_shape(format!(
                    "Invalid category: {}",
                    exam.category_code
                )));
            }
            continue;
        }

        if exam.date.is_empty() {
            continue;
        }

        let date = parse_service_date(&exam.date)
            .map_err(literal_error)?
            .format("%d-%m-%Y")
            .to_string();
        let begin = parse_service_time(&exam.begin).map_err(literal_error)?;
        let end = parse_service_time(&exam.end).map_err(literal_error)?;

        if exam.parent_id.is_empty() || (begin.is_midnight() && end.is_midnight()) {
            entries.push(date);
        } else {
            entries.push(format!("{} {} - {}", date, begin.hhmm(), end.hhmm()));
            dates_with_time.insert(date);
        }
    }

    let mut seen = HashSet::new();
    let lines: Vec<String> = entries
        .into_iter()
        .filter(|entry| !dates_with_time.contains(entry))
        .filter(|entry| seen.insert(entry.clone()))
        .collect();

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 2024-07-01 and 2024-07-15
    const JULY_1: &str = "/Date(1719792000000)/";
    const JULY_15: &str = "/Date(1721001600000)/";

    fn exam(code: &str, id: &str, parent: &str, date: &str, begin: &str, end: &str) -> RawExam {
        serde_json::from_value(json!({
            "CategoryCode": code,
            "ZzExamOfferGuid": id,
            "ZzExamOfferParentGuid": parent,
            "ExamDate": date,
            "ExamBegTime": begin,
            "ExamEndTime": end,
        }))
        .unwrap()
    }

    const MIDNIGHT: &str = "PT00H00M00S";

    #[test]
    fn test_root_with_timed_child_yields_one_line() {
        let exams = vec![
            exam("FI", "r1", "", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("FI", "c1", "r1", JULY_1, "PT09H00M00S", "PT12H00M00S"),
        ];
        assert_eq!(
            reconcile_exam_dates(&exams, ExamKind::FinalA).unwrap(),
            "01-07-2024 09:00 - 12:00"
        );
    }

    #[test]
    fn test_root_time_is_ignored() {
        let exams = vec![exam("FB", "r1", "", JULY_15, "PT09H00M00S", "PT12H00M00S")];
        assert_eq!(
            reconcile_exam_dates(&exams, ExamKind::FinalB).unwrap(),
            "15-07-2024"
        );
    }

    #[test]
    fn test_child_ordering_follows_root_order() {
        // Children listed before their roots; output follows root order
        let exams = vec![
            exam("MI", "c2", "r2", JULY_15, "PT10H00M00S", "PT11H00M00S"),
            exam("MI", "c1", "r1", JULY_1, "PT10H00M00S", "PT11H00M00S"),
            exam("MI", "r1", "", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("MI", "r2", "", JULY_15, MIDNIGHT, MIDNIGHT),
        ];
        assert_eq!(
            reconcile_exam_dates(&exams, ExamKind::MidtermA).unwrap(),
            "01-07-2024 10:00 - 11:00\n15-07-2024 10:00 - 11:00"
        );
    }

    #[test]
    fn test_duplicates_and_other_kinds() {
        let exams = vec![
            exam("FI", "r1", "", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("FI", "r2", "", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("M2", "r3", "", JULY_15, MIDNIGHT, MIDNIGHT),
            exam("FI", "r4", "", "", MIDNIGHT, MIDNIGHT),
        ];
        assert_eq!(
            reconcile_exam_dates(&exams, ExamKind::FinalA).unwrap(),
            "01-07-2024"
        );
        assert_eq!(
            reconcile_exam_dates(&exams, ExamKind::MidtermB).unwrap(),
            "15-07-2024"
        );
        assert_eq!(reconcile_exam_dates(&exams, ExamKind::FinalB).unwrap(), "");
    }

    #[test]
    fn test_duplicate_ids_are_fatal() {
        let exams = vec![
            exam("FI", "r1", "", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("FB", "r1", "", JULY_15, MIDNIGHT, MIDNIGHT),
        ];
        assert!(reconcile_exam_dates(&exams, ExamKind::FinalA).is_err());
    }

    #[test]
    fn test_empty_ids_are_allowed() {
        let exams = vec![
            exam("FI", "", "", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("FB", "", "", JULY_15, MIDNIGHT, MIDNIGHT),
        ];
        assert_eq!(
            reconcile_exam_dates(&exams, ExamKind::FinalB).unwrap(),
            "15-07-2024"
        );
    }

    #[test]
    fn test_nested_children_are_fatal() {
        let exams = vec![
            exam("FI", "r1", "", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("FI", "c1", "r1", JULY_1, MIDNIGHT, MIDNIGHT),
            exam("FI", "g1", "c1", JULY_1, MIDNIGHT, MIDNIGHT),
        ];
        let err = reconcile_exam_dates(&exams, ExamKind::FinalA).unwrap_err();
        assert!(matches!(err, CatalogError::DataShape(ref msg) if msg.contains("parent")));
    }

    #[test]
    fn test_unknown_category_is_fatal() {
        let exams = vec![exam("XX", "r1", "", JULY_1, MIDNIGHT, MIDNIGHT)];
        assert!(reconcile_exam_dates(&exams, ExamKind::FinalA).is_err());
    }

    #[test]
    fn test_bad_time_is_fatal() {
        let exams = vec![exam("FI", "r1", "", JULY_1, "09:00", MIDNIGHT)];
        assert!(reconcile_exam_dates(&exams, ExamKind::FinalA).is_err());
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(ExamKind::from_code("M2"), Some(ExamKind::MidtermB));
        assert_eq!(ExamKind::from_code("MX"), None);
        assert_eq!(ExamKind::FinalA.label(), "מועד א");
    }
}
