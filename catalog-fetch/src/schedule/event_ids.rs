//! Display numbers for timetable events
//!
//! Raw event ids are opaque service handles. Each one is replaced by a small
//! number derived from the groups it appears in, so that a lecture shared by
//! groups 11 and 12 shows up as event 10 in both.
//!
//! **Assignment rules** (per raw id, in event order):
//! - a raw id seen before keeps its number
//! - a raw id used by a single group takes that group's number
//! - otherwise the group rounded down to a multiple of 10, falling back to
//!   the first group the raw id appeared in
//! - a taken number may be shared only when its first holder has the same
//!   group and none of its holders has the same category; otherwise the next
//!   candidate is tried, then 100 is added until a free or shareable number
//!   turns up

use std::collections::HashMap;

use crate::types::{CanonicalEvent, PendingEvent};

/// Number assignment state for one course
#[derive(Debug, Default)]
struct EventNumbering {
    /// Raw id -> groups, in first-seen order
    groups_by_raw_id: HashMap<String, Vec<u32>>,
    assigned: HashMap<String, u32>,
    /// Number -> (group, category) of the events that claimed it
    holders: HashMap<u32, Vec<(u32, String)>>,
}

impl EventNumbering {
    fn new(events: &[PendingEvent]) -> Self {
        let mut groups_by_raw_id: HashMap<String, Vec<u32>> = HashMap::new();
        for event in events {
            let groups = groups_by_raw_id.entry(event.raw_event_id.clone()).or_default();
            if !groups.contains(&event.group) {
                groups.push(event.group);
            }
        }

        Self {
            groups_by_raw_id,
            ..Default::default()
        }
    }

    fn is_shareable(&self, number: u32, event: &PendingEvent) -> bool {
        match self.holders.get(&number) {
            None => true,
            Some(holders) => {
                holders[0].0 == event.group
                    && holders
                        .iter()
                        .all(|(_, category)| *category != event.details.category)
            }
        }
    }

    fn number_for(&mut self, context: &str, event: &PendingEvent) -> u32 {
        if let Some(&number) = self.assigned.get(&event.raw_event_id) {
            return number;
        }

        let groups = self
            .groups_by_raw_id
            .get(&event.raw_event_id)
            .cloned()
            .unwrap_or_else(|| vec![event.group]);

        let (mut candidate, mut fallback) = if groups.len() == 1 {
            (groups[0], None)
        } else {
            ((event.group / 10) * 10, Some(groups[0]))
        };

        while !self.is_shareable(candidate, event) {
            match fallback.take() {
                Some(next) => candidate = next,
                None => {
                    tracing::warn!(
                        "[{}] Duplicate id {} for group {} ({})",
                        context,
                        candidate,
                        event.group,
                        event.details.category
                    );
                    candidate += 100;
                }
            }
        }

        self.assigned.insert(event.raw_event_id.clone(), candidate);
        self.holders
            .entry(candidate)
            .or_default()
            .push((event.group, event.details.category.clone()));

        candidate
    }
}

/// Replace raw event ids with display numbers, keeping event order
///
/// `context` prefixes warnings, e.g. `2024/200/02340114`.
pub fn assign_event_numbers(context: &str, events: Vec<PendingEvent>) -> Vec<CanonicalEvent> {
    let mut numbering = EventNumbering::new(&events);

    events
        .into_iter()
        .map(|event| {
            let event_number = numbering.number_for(context, &event);
            CanonicalEvent {
                group: event.group,
                details: event.details,
                event_number,
            }
        })
        .collect()
}
