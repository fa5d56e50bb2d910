//! Semester listing

use serde::Serialize;

use catalog_common::time::parse_service_date;

use crate::error::{literal_error, CatalogError, Result};
use crate::gateway::{fetch_results, CatalogGateway, Queries};
use crate::types::{RawSemester, Term};

/// Winter, spring and summer; other sessions are not teaching terms
pub const TEACHING_SESSIONS: [u16; 3] = [200, 201, 202];

/// Semester entry of the last-semesters output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemesterInfo {
    pub year: u16,
    pub semester: u16,
    /// `YYYY-MM-DD`
    pub start: String,
    /// `YYYY-MM-DD`
    pub end: String,
}

impl SemesterInfo {
    pub fn term(&self) -> Term {
        Term::new(self.year, self.semester)
    }
}

fn parse_number(field: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| CatalogError::data_shape(format!("Invalid {}: {}", field, value)))
}

fn service_day(raw: &str) -> Result<String> {
    Ok(parse_service_date(raw)
        .map_err(literal_error)?
        .format("%Y-%m-%d")
        .to_string())
}

/// Most recent `count` teaching semesters, newest first
pub fn select_last_semesters(raw: &[RawSemester], count: usize) -> Result<Vec<SemesterInfo>> {
    if raw.is_empty() {
        return Err(CatalogError::data_shape("No semesters found"));
    }

    let mut semesters = Vec::new();
    for entry in raw {
        let year = parse_number("year", &entry.year)?;
        let semester = parse_number("semester", &entry.session)?;
        if !TEACHING_SESSIONS.contains(&semester) {
            continue;
        }

        semesters.push(SemesterInfo {
            year,
            semester,
            start: service_day(&entry.begin)?,
            end: service_day(&entry.end)?,
        });
    }

    semesters.sort_by(|a, b| b.term().cmp(&a.term()));
    semesters.truncate(count);
    Ok(semesters)
}

/// Fetch the semester list and keep the most recent `count`
pub async fn last_semesters(
    gateway: &dyn CatalogGateway,
    queries: &Queries,
    count: usize,
) -> Result<Vec<SemesterInfo>> {
    let raw: Vec<RawSemester> = fetch_results(gateway, &queries.semesters()).await?;
    let semesters = select_last_semesters(&raw, count)?;

    tracing::info!(
        available = raw.len(),
        selected = semesters.len(),
        "Resolved last semesters"
    );

    Ok(semesters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(year: &str, session: &str) -> RawSemester {
        RawSemester {
            year: year.to_string(),
            session: session.to_string(),
            // 2024-07-01
            begin: "/Date(1719792000000)/".to_string(),
            end: "/Date(1721001600000)/".to_string(),
        }
    }

    #[test]
    fn test_selects_newest_teaching_semesters() {
        let entries = vec![
            raw("2023", "201"),
            raw("2024", "200"),
            raw("2024", "205"),
            raw("2023", "202"),
            raw("2024", "201"),
        ];

        let selected = select_last_semesters(&entries, 3).unwrap();
        let terms: Vec<(u16, u16)> = selected.iter().map(|s| (s.year, s.semester)).collect();
        assert_eq!(terms, vec![(2024, 201), (2024, 200), (2023, 202)]);
        assert_eq!(selected[0].start, "2024-07-01");
        assert_eq!(selected[0].end, "2024-07-15");
    }

    #[test]
    fn test_count_larger_than_available() {
        let selected = select_last_semesters(&[raw("2024", "200")], 10).unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_empty_listing_is_an_error() {
        assert!(select_last_semesters(&[], 2).is_err());
    }

    #[test]
    fn test_serialized_fields() {
        let selected = select_last_semesters(&[raw("2024", "200")], 1).unwrap();
        let json = serde_json::to_string(&selected[0]).unwrap();
        assert_eq!(
            json,
            r#"{"year":2024,"semester":200,"start":"2024-07-01","end":"2024-07-15"}"#
        );
    }
}
