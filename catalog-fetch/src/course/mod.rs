//! Course records
//!
//! A course record is the general metadata section plus the normalized
//! weekly schedule.

pub mod exams;
pub mod general;
pub mod number;

pub use exams::{reconcile_exam_dates, ExamKind};
pub use general::{build_general, GeneralInfo};
pub use number::to_new_course_number;

use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::gateway::{fetch_results, CatalogGateway, Queries};
use crate::types::{CanonicalEvent, RawCourse, Term};

/// Output record for one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRecord {
    pub general: GeneralInfo,
    pub schedule: Vec<CanonicalEvent>,
}

/// Fetch the detail record of one course; the service must return exactly one
pub async fn fetch_course_detail(
    gateway: &dyn CatalogGateway,
    queries: &Queries,
    term: Term,
    course_id: &str,
) -> Result<RawCourse> {
    let query = queries.course_detail(term, course_id);
    let mut results: Vec<RawCourse> = fetch_results(gateway, &query).await?;

    if results.len() != 1 {
        return Err(CatalogError::data_shape(format!(
            "Invalid results for {}: {} records",
            course_id,
            results.len()
        )));
    }

    Ok(results.remove(0))
}
