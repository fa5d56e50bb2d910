//! Cross-group consistency of numbered events
//!
//! Groups that share a (category, event number) pair must list exactly the
//! same set of meetings once the group is erased. A mismatch means the number
//! assignment merged unrelated events and the course output would lie.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CatalogError, Result};
use crate::types::{CanonicalEvent, EventDetails};

/// Check every (category, number) bucket; the first disagreement is an error
pub fn validate_consistency(events: &[CanonicalEvent]) -> Result<()> {
    // (category, number) -> group -> meetings
    let mut buckets: BTreeMap<(&str, u32), BTreeMap<u32, BTreeSet<&EventDetails>>> =
        BTreeMap::new();

    for event in events {
        buckets
            .entry((event.details.category.as_str(), event.event_number))
            .or_default()
            .entry(event.group)
            .or_default()
            .insert(&event.details);
    }

    for ((category, event_number), by_group) in buckets {
        let shapes: BTreeSet<&BTreeSet<&EventDetails>> = by_group.values().collect();
        if shapes.len() != 1 {
            let groups: Vec<String> = by_group.keys().map(|g| g.to_string()).collect();
            return Err(CatalogError::Inconsistent {
                category: category.to_string(),
                event_number,
                detail: format!(
                    "{} distinct meeting sets across groups {}",
                    shapes.len(),
                    groups.join(", ")
                ),
            });
        }
    }

    Ok(())
}
