//! Per-term run orchestration
//!
//! **Flow per term:**
//! 1. List course ids offered in the term (sorted)
//! 2. Process courses with a bounded worker pool: detail -> general section,
//!    schedule groups -> normalized schedule
//! 3. Collect outcomes in course order
//!
//! Services are run-scoped: the building directory memo is shared by all
//! workers and all terms of one run.

use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::course::{build_general, fetch_course_detail, CourseRecord};
use crate::error::Result;
use crate::gateway::{fetch_results, CatalogGateway, Queries};
use crate::schedule::normalize_schedule;
use crate::services::{BuildingDirectory, TermRooms};
use crate::types::{RawCourseRef, RawScheduleGroup, Term};

/// Progress is logged every this many finished courses
const PROGRESS_INTERVAL: usize = 10;

/// What to do when one course fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run at the first failed course
    #[default]
    FailFast,
    /// Process every course and report each outcome
    Collect,
}

/// Result of processing one course
#[derive(Debug)]
pub struct CourseOutcome {
    pub course_id: String,
    pub result: Result<CourseRecord>,
}

/// Records of all outcomes, or the first failure
pub fn into_records(outcomes: Vec<CourseOutcome>) -> Result<Vec<CourseRecord>> {
    outcomes.into_iter().map(|outcome| outcome.result).collect()
}

/// Run-scoped catalog services
pub struct CatalogServices {
    gateway: Arc<dyn CatalogGateway>,
    queries: Queries,
    buildings: Arc<BuildingDirectory>,
}

impl CatalogServices {
    pub fn new(gateway: Arc<dyn CatalogGateway>, queries: Queries) -> Self {
        let buildings = Arc::new(BuildingDirectory::new(gateway.clone(), queries.clone()));
        Self {
            gateway,
            queries,
            buildings,
        }
    }

    pub fn gateway(&self) -> &dyn CatalogGateway {
        self.gateway.as_ref()
    }

    pub fn queries(&self) -> &Queries {
        &self.queries
    }

    pub fn buildings(&self) -> &BuildingDirectory {
        &self.buildings
    }

    /// Room source for schedule items of one term
    pub fn rooms_for(&self, term: Term) -> TermRooms {
        TermRooms::new(
            term,
            self.gateway.clone(),
            self.queries.clone(),
            self.buildings.clone(),
        )
    }

    /// Course object ids offered in a term, sorted
    pub async fn course_ids(&self, term: Term) -> Result<Vec<String>> {
        let query = self.queries.course_list(term);
        let refs: Vec<RawCourseRef> = fetch_results(self.gateway(), &query).await?;

        let mut ids: Vec<String> = refs.into_iter().map(|r| r.course_id).collect();
        ids.sort();
        Ok(ids)
    }

    /// Build the full record of one course
    pub async fn process_course(&self, term: Term, course_id: &str) -> Result<CourseRecord> {
        let detail = fetch_course_detail(self.gateway(), &self.queries, term, course_id).await?;
        let general = build_general(&detail)?;

        let query = self.queries.schedule_groups(term, &general.course_number);
        let groups: Vec<RawScheduleGroup> = fetch_results(self.gateway(), &query).await?;

        let rooms = self.rooms_for(term);
        let schedule = normalize_schedule(term, &general.course_number, &groups, &rooms).await?;

        Ok(CourseRecord { general, schedule })
    }
}

/// Process every course of a term with `workers` concurrent tasks
///
/// Outcomes come back in course id order. Under [`FailurePolicy::FailFast`]
/// the first failure is logged with its course and returned; in-flight
/// courses are dropped.
pub async fn run_term(
    services: &CatalogServices,
    term: Term,
    workers: usize,
    policy: FailurePolicy,
) -> Result<Vec<CourseOutcome>> {
    let course_ids = services.course_ids(term).await?;
    let total = course_ids.len();

    tracing::info!(term = %term, courses = total, workers, "Fetching course data");

    let completed = AtomicUsize::new(0);
    let completed = &completed;

    let mut outcomes_stream = stream::iter(course_ids)
        .map(|course_id| async move {
            tracing::debug!(term = %term, course = %course_id, "Processing course");
            let result = services.process_course(term, &course_id).await;

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if done % PROGRESS_INTERVAL == 0 || done == total {
                tracing::info!(term = %term, "Progress: {}/{} courses", done, total);
            }

            CourseOutcome { course_id, result }
        })
        .buffered(workers.max(1));

    let mut outcomes = Vec::with_capacity(total);
    while let Some(CourseOutcome { course_id, result }) = outcomes_stream.next().await {
        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                "Failed to get course data for {}/{}",
                term,
                course_id
            );
        }

        match result {
            Err(e) if policy == FailurePolicy::FailFast => return Err(e),
            result => outcomes.push(CourseOutcome { course_id, result }),
        }
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    tracing::info!(
        term = %term,
        courses = outcomes.len(),
        failed,
        "Finished fetching course data"
    );

    Ok(outcomes)
}
