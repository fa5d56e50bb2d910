//! Room resolution from dated occurrences
//!
//! Some schedule items only say "see details" instead of a room. For those,
//! the event's dated occurrences are fetched and folded into a weekly table:
//! slot -> (building, room). A slot whose occurrences span several buildings
//! is left out; several rooms in one building collapse to room 0.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use catalog_common::time::{parse_service_date, parse_whole_minute_time, weekday_from_sunday};

use super::BuildingLookup;
use crate::error::{literal_error, CatalogError, Result};
use crate::types::{Location, RawOccurrence, RoomLookupTable, TimeSlot};

static ROOM_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d\d\d)-(\d\d\d\d)$").expect("valid room code regex"));

/// Room number from a `BBB-RRRR` room code
///
/// Returns `None` when the text is not a room code.
pub fn parse_room_code(text: &str) -> Option<u32> {
    let caps = ROOM_CODE_RE.captures(text)?;
    caps[2].parse().ok()
}

/// Fold the occurrences of one event into a weekly room table
pub async fn resolve_rooms(
    event_id: &str,
    occurrences: &[RawOccurrence],
    buildings: &dyn BuildingLookup,
) -> Result<RoomLookupTable> {
    let mut table = RoomLookupTable::new();

    for occurrence in occurrences {
        if occurrence.date.is_empty() || occurrence.begin.is_empty() || occurrence.end.is_empty() {
            return Err(CatalogError::data_shape(format!(
                "Missing date or time in schedule of {}",
                event_id
            )));
        }

        let date = parse_service_date(&occurrence.date).map_err(literal_error)?;
        let begin = parse_whole_minute_time(&occurrence.begin).map_err(literal_error)?;
        let end = parse_whole_minute_time(&occurrence.end).map_err(literal_error)?;
        let slot = TimeSlot::new(weekday_from_sunday(&date), begin.hhmm(), end.hhmm());

        let mut slot_buildings = BTreeSet::new();
        let mut slot_rooms = BTreeSet::new();
        for room in &occurrence.rooms.results {
            let number = parse_room_code(&room.name).ok_or_else(|| {
                CatalogError::data_shape(format!(
                    "Invalid room name for {}: {}",
                    event_id, room.name
                ))
            })?;
            slot_buildings.insert(buildings.building_name(&room.room_id).await?);
            slot_rooms.insert(number);
        }

        if slot_buildings.len() != 1 {
            tracing::debug!(
                event_id = %event_id,
                weekday = slot.weekday,
                start = %slot.start,
                buildings = slot_buildings.len(),
                "Skipping slot without a single building"
            );
            continue;
        }

        let building = slot_buildings.into_iter().next().unwrap_or_default();
        let room = if slot_rooms.len() == 1 {
            slot_rooms.into_iter().next().unwrap_or_default()
        } else {
            0
        };

        // Later occurrences of the same slot win
        table.insert(slot, Location::new(building, room));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Building is derived from the room id prefix: "A..." and "B..."
    struct PrefixBuildings;

    #[async_trait]
    impl BuildingLookup for PrefixBuildings {
        async fn building_name(&self, room_id: &str) -> Result<String> {
            Ok(if room_id.starts_with('A') { "טאוב" } else { "אולמן" }.to_string())
        }
    }

    // 2024-05-26 (Sunday) and 2024-05-27 (Monday)
    const SUNDAY: &str = "/Date(1716681600000)/";
    const MONDAY: &str = "/Date(1716768000000)/";

    fn occurrence(date: &str, begin: &str, end: &str, rooms: &[(&str, &str)]) -> RawOccurrence {
        let rooms: Vec<_> = rooms
            .iter()
            .map(|(id, name)| json!({"Otjid": id, "Name": name}))
            .collect();
        serde_json::from_value(json!({
            "Evdat": date,
            "Beguz": begin,
            "Enduz": end,
            "Rooms": {"results": rooms}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_room_code() {
        assert_eq!(parse_room_code("003-0002"), Some(2));
        assert_eq!(parse_room_code("003-1234"), Some(1234));
        assert_eq!(parse_room_code("ראה פרטים"), None);
        assert_eq!(parse_room_code("03-0002"), None);
    }

    #[tokio::test]
    async fn test_single_room_slot() {
        let occurrences = vec![occurrence(
            MONDAY,
            "PT10H30M00S",
            "PT12H30M00S",
            &[("A1", "003-0005")],
        )];

        let table = resolve_rooms("E1", &occurrences, &PrefixBuildings).await.unwrap();
        assert_eq!(
            table.get(&TimeSlot::new(1, "10:30", "12:30")),
            Some(&Location::new("טאוב", 5))
        );
    }

    #[tokio::test]
    async fn test_several_rooms_in_one_building_collapse_to_zero() {
        let occurrences = vec![occurrence(
            SUNDAY,
            "PT08H30M00S",
            "PT10H30M00S",
            &[("A1", "003-0005"), ("A2", "003-0006")],
        )];

        let table = resolve_rooms("E1", &occurrences, &PrefixBuildings).await.unwrap();
        assert_eq!(
            table.get(&TimeSlot::new(0, "08:30", "10:30")),
            Some(&Location::new("טאוב", 0))
        );
    }

    #[tokio::test]
    async fn test_several_buildings_are_skipped() {
        let occurrences = vec![
            occurrence(
                SUNDAY,
                "PT08H30M00S",
                "PT10H30M00S",
                &[("A1", "003-0005"), ("B1", "004-0001")],
            ),
            occurrence(SUNDAY, "PT14H30M00S", "PT15H30M00S", &[]),
        ];

        let table = resolve_rooms("E1", &occurrences, &PrefixBuildings).await.unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_later_occurrence_overwrites() {
        let occurrences = vec![
            occurrence(MONDAY, "PT10H30M00S", "PT12H30M00S", &[("A1", "003-0005")]),
            occurrence(MONDAY, "PT10H30M00S", "PT12H30M00S", &[("B1", "004-0007")]),
        ];

        let table = resolve_rooms("E1", &occurrences, &PrefixBuildings).await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&TimeSlot::new(1, "10:30", "12:30")),
            Some(&Location::new("אולמן", 7))
        );
    }

    #[tokio::test]
    async fn test_missing_fields_are_fatal() {
        let occurrences = vec![occurrence("", "PT10H30M00S", "PT12H30M00S", &[])];
        let err = resolve_rooms("E1", &occurrences, &PrefixBuildings).await.unwrap_err();
        assert!(matches!(err, CatalogError::DataShape(_)));
    }

    #[tokio::test]
    async fn test_bad_room_name_is_fatal() {
        let occurrences = vec![occurrence(
            MONDAY,
            "PT10H30M00S",
            "PT12H30M00S",
            &[("A1", "Lab 3")],
        )];
        let err = resolve_rooms("E1", &occurrences, &PrefixBuildings).await.unwrap_err();
        assert!(matches!(err, CatalogError::DataShape(_)));
    }

    #[tokio::test]
    async fn test_seconds_in_time_are_fatal() {
        let occurrences = vec![occurrence(MONDAY, "PT10H30M15S", "PT12H30M00S", &[])];
        assert!(resolve_rooms("E1", &occurrences, &PrefixBuildings).await.is_err());
    }
}
