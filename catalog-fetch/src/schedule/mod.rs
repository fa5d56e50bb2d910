//! Schedule normalization engine
//!
//! **Pipeline:**
//! 1. [`parser`]: raw schedule groups -> pending events (one per weekly meeting)
//! 2. [`event_ids`]: raw event ids -> group-derived display numbers
//! 3. [`consistency`]: groups sharing a number must agree on their meetings

pub mod consistency;
pub mod event_ids;
pub mod parser;
pub mod text;

pub use consistency::validate_consistency;
pub use event_ids::assign_event_numbers;
pub use parser::parse_schedule;
pub use text::{parse_schedule_text, ScheduleText, WeeklyMeeting};

use crate::error::Result;
use crate::services::RoomSource;
use crate::types::{CanonicalEvent, RawScheduleGroup, Term};

/// Normalize the schedule groups of one course into timetable events
pub async fn normalize_schedule(
    term: Term,
    course_number: &str,
    groups: &[RawScheduleGroup],
    rooms: &dyn RoomSource,
) -> Result<Vec<CanonicalEvent>> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let pending = parse_schedule(term, course_number, groups, rooms).await?;
    let context = format!("{}/{}", term, course_number);
    let events = assign_event_numbers(&context, pending);
    validate_consistency(&events)?;

    tracing::debug!(
        course = %course_number,
        events = events.len(),
        "Normalized schedule"
    );

    Ok(events)
}
