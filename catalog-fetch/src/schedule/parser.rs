//! Schedule group parsing
//!
//! Turns the raw schedule groups of one course into pending events: one per
//! (group, weekly meeting), still tagged with the service's raw event id.

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::{parse_schedule_text, ScheduleText};
use crate::error::{CatalogError, Result};
use crate::services::{parse_room_code, BuildingLookup, RoomSource};
use crate::types::{
    EventDetails, Location, PendingEvent, RawPerson, RawScheduleGroup, RawScheduleItem,
    RoomLookupTable, Term, TimeSlot,
};

/// Room text meaning "rooms vary, see the dated occurrences"
pub const SEE_DETAILS_ROOM: &str = "ראה פרטים";

/// Categories accepted for regular courses
pub const REGULAR_CATEGORIES: &[&str] = &["הרצאה", "תרגול", "מעבדה", "פרויקט", "סמינר"];

const SPORT_CATEGORIES: &[&str] = &["ספורט", "נבחרת ספורט"];
const GENERIC_SPORT_PREFIX: &str = "ספורט חינוך גופני - ";
const GENERIC_SPORT_NAME: &str = "ספורט נבחרות ספורט";

/// Course whose exercise items arrive without a category
const UNCATEGORIZED_EXERCISE_COURSE: &str = "00950219";
const EXERCISE_NAME_PREFIX: &str = "תרגיל";
const EXERCISE_CATEGORY: &str = "תרגול";

/// Irregular schedules are only worth a warning for recent terms
const IRREGULAR_WARNING_FROM_YEAR: u16 = 2024;

static SPORT_COURSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^03940[89]\d\d$").expect("valid sport course regex"));

pub fn is_sport_course(course_number: &str) -> bool {
    SPORT_COURSE_RE.is_match(course_number)
}

/// Display category of a schedule item
///
/// Sport courses use the item (or group) name instead of the generic category.
pub fn resolve_category(
    course_number: &str,
    group_name: &str,
    item: &RawScheduleItem,
) -> Result<String> {
    let category = item.category_text.as_str();

    if is_sport_course(course_number) {
        if !SPORT_CATEGORIES.contains(&category) {
            return Err(CatalogError::data_shape(format!(
                "Invalid category: {}",
                category
            )));
        }

        let generic =
            item.name.starts_with(GENERIC_SPORT_PREFIX) || item.name == GENERIC_SPORT_NAME;
        if generic && !group_name.is_empty() {
            return Ok(group_name.to_string());
        }
        return Ok(item.name.clone());
    }

    if course_number == UNCATEGORIZED_EXERCISE_COURSE
        && category.is_empty()
        && item.name.starts_with(EXERCISE_NAME_PREFIX)
    {
        return Ok(EXERCISE_CATEGORY.to_string());
    }

    if !REGULAR_CATEGORIES.contains(&category) {
        return Err(CatalogError::data_shape(format!(
            "Invalid category: {}",
            category
        )));
    }

    Ok(category.to_string())
}

/// One line per person: optional title, first and last name
pub fn format_staff(persons: &[RawPerson]) -> String {
    let mut staff = String::new();
    for person in persons {
        let title = person.title.trim();
        if !title.is_empty() && title != "-" {
            staff.push_str(title);
            staff.push(' ');
        }
        staff.push_str(&person.first_name);
        staff.push(' ');
        staff.push_str(&person.last_name);
        staff.push('\n');
    }
    staff.trim_end_matches('\n').to_string()
}

/// Where an item's meetings take place
enum ItemRooms {
    Fixed(Location),
    BySlot(RoomLookupTable),
}

impl ItemRooms {
    fn location(&self, slot: &TimeSlot) -> Location {
        match self {
            ItemRooms::Fixed(location) => location.clone(),
            ItemRooms::BySlot(table) => table.get(slot).cloned().unwrap_or_default(),
        }
    }
}

async fn item_rooms(item: &RawScheduleItem, rooms: &dyn RoomSource) -> Result<ItemRooms> {
    if item.room_text.is_empty() {
        return Ok(ItemRooms::Fixed(Location::default()));
    }

    if let Some(room) = parse_room_code(&item.room_text) {
        let building = rooms.building_name(&item.room_id).await?;
        return Ok(ItemRooms::Fixed(Location::new(building, room)));
    }

    if item.room_text == SEE_DETAILS_ROOM {
        return Ok(ItemRooms::BySlot(rooms.rooms_by_slot(&item.event_id).await?));
    }

    Err(CatalogError::data_shape(format!(
        "Invalid building and room: {}",
        item.room_text
    )))
}

/// Parse all schedule groups of a course into pending events
///
/// Groups are visited in ascending order with group 0 last. Events that
/// repeat an earlier one (same group and details) are dropped with a warning.
pub async fn parse_schedule(
    term: Term,
    course_number: &str,
    groups: &[RawScheduleGroup],
    rooms: &dyn RoomSource,
) -> Result<Vec<PendingEvent>> {
    let context = format!("{}/{}", term, course_number);

    let mut numbered = groups
        .iter()
        .map(|group| Ok((group.group_number()?, group)))
        .collect::<Result<Vec<_>>>()?;
    numbered.sort_by_key(|(number, _)| (*number == 0, *number));

    let mut events: Vec<PendingEvent> = Vec::new();

    for (group_number, group) in numbered {
        for item in &group.items.results {
            let category = resolve_category(course_number, &group.name, item)?;
            let item_rooms = item_rooms(item, rooms).await?;
            let staff = format_staff(&item.persons.results);

            if item.schedule_summary != item.schedule_text {
                return Err(CatalogError::data_shape(format!(
                    "Date and time mismatch: {} != {}",
                    item.schedule_summary, item.schedule_text
                )));
            }

            let meetings = match parse_schedule_text(&item.schedule_text)? {
                ScheduleText::Weekly(meetings) => meetings,
                ScheduleText::Irregular => {
                    if term.year >= IRREGULAR_WARNING_FROM_YEAR {
                        tracing::warn!(
                            "[{}] Unsupported date and time: {}",
                            context,
                            item.schedule_text
                        );
                    }
                    continue;
                }
                ScheduleText::Empty | ScheduleText::SpecificDates => continue,
            };

            for meeting in meetings {
                let slot = TimeSlot::new(meeting.weekday.index(), &meeting.start, &meeting.end);
                let location = item_rooms.location(&slot);

                let event = PendingEvent {
                    group: group_number,
                    details: EventDetails {
                        category: category.clone(),
                        weekday: meeting.weekday,
                        time: meeting.time_range(),
                        building: location.building,
                        room: location.room,
                        staff: staff.clone(),
                    },
                    raw_event_id: item.event_id.clone(),
                };

                if events.iter().any(|existing| existing.same_slot(&event)) {
                    tracing::warn!("[{}] Duplicate event: {:?}", context, event);
                } else {
                    events.push(event);
                }
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::text::IRREGULAR_MARKER;
    use crate::types::Weekday;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Collects the messages of WARN events
    #[derive(Clone, Default)]
    struct WarningCapture {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarningCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct MessageVisitor(String);

            impl tracing::field::Visit for MessageVisitor {
                fn record_debug(
                    &mut self,
                    field: &tracing::field::Field,
                    value: &dyn std::fmt::Debug,
                ) {
                    if field.name() == "message" {
                        self.0 = format!("{:?}", value);
                    }
                }
            }

            if *event.metadata().level() == tracing::Level::WARN {
                let mut visitor = MessageVisitor(String::new());
                event.record(&mut visitor);
                self.messages.lock().unwrap().push(visitor.0);
            }
        }
    }

    #[derive(Default)]
    struct StubRooms {
        slot_lookups: AtomicUsize,
    }

    #[async_trait]
    impl BuildingLookup for StubRooms {
        async fn building_name(&self, _room_id: &str) -> Result<String> {
            Ok("טאוב".to_string())
        }
    }

    #[async_trait]
    impl RoomSource for StubRooms {
        async fn rooms_by_slot(&self, _event_id: &str) -> Result<RoomLookupTable> {
            self.slot_lookups.fetch_add(1, Ordering::SeqCst);
            let mut table = RoomLookupTable::new();
            table.insert(TimeSlot::new(1, "10:30", "12:30"), Location::new("אולמן", 501));
            Ok(table)
        }
    }

    fn item(category: &str, name: &str, room_text: &str, schedule: &str) -> serde_json::Value {
        json!({
            "Otjid": format!("E-{}", name),
            "Name": name,
            "CategoryText": category,
            "RoomText": room_text,
            "RoomId": "R1",
            "ScheduleSummary": schedule,
            "ScheduleText": schedule,
            "Persons": {"results": [
                {"Title": "ד\"ר", "FirstName": "דנה", "LastName": "לוי"},
                {"Title": "-", "FirstName": "יוסי", "LastName": "כהן"}
            ]}
        })
    }

    fn group(id: &str, name: &str, items: Vec<serde_json::Value>) -> RawScheduleGroup {
        serde_json::from_value(json!({
            "ZzSeSeqnr": id,
            "Name": name,
            "EObjectSet": {"results": items}
        }))
        .unwrap()
    }

    fn raw_item(category: &str, name: &str) -> RawScheduleItem {
        serde_json::from_value(item(category, name, "", "")).unwrap()
    }

    #[test]
    fn test_format_staff() {
        let item = raw_item("הרצאה", "x");
        assert_eq!(format_staff(&item.persons.results), "ד\"ר דנה לוי\nיוסי כהן");
        assert_eq!(format_staff(&[]), "");
    }

    #[test]
    fn test_resolve_category_regular() {
        assert_eq!(
            resolve_category("02340114", "", &raw_item("תרגול", "x")).unwrap(),
            "תרגול"
        );
        assert!(resolve_category("02340114", "", &raw_item("סדנה", "x")).is_err());
    }

    #[test]
    fn test_resolve_category_sport() {
        assert!(is_sport_course("03940812"));
        assert!(!is_sport_course("03940712"));

        let swimming = raw_item("ספורט", "שחייה");
        assert_eq!(resolve_category("03940812", "קבוצה א", &swimming).unwrap(), "שחייה");

        let generic = raw_item("ספורט", "ספורט חינוך גופני - כללי");
        assert_eq!(resolve_category("03940812", "כדורסל", &generic).unwrap(), "כדורסל");
        assert_eq!(
            resolve_category("03940812", "", &generic).unwrap(),
            "ספורט חינוך גופני - כללי"
        );

        let team = raw_item("נבחרת ספורט", "ספורט נבחרות ספורט");
        assert_eq!(resolve_category("03940900", "כדורעף", &team).unwrap(), "כדורעף");

        assert!(resolve_category("03940812", "", &raw_item("הרצאה", "x")).is_err());
    }

    #[test]
    fn test_resolve_category_uncategorized_exercise() {
        assert_eq!(
            resolve_category("00950219", "", &raw_item("", "תרגיל 1")).unwrap(),
            "תרגול"
        );
        assert!(resolve_category("00950219", "", &raw_item("", "הרצאה")).is_err());
        assert!(resolve_category("00950220", "", &raw_item("", "תרגיל 1")).is_err());
    }

    #[tokio::test]
    async fn test_parse_fixed_room_and_group_order() {
        let groups = vec![
            group("0", "", vec![item("מעבדה", "lab", "", "יום חמישי 14:30-16:30")]),
            group("12", "", vec![item("תרגול", "t12", "", "יום שלישי 12:30-13:30")]),
            group("11", "", vec![item("הרצאה", "l", "003-0002", "יום שני 10:30-12:30")]),
        ];

        let rooms = StubRooms::default();
        let events = parse_schedule(Term::new(2024, 200), "02340114", &groups, &rooms)
            .await
            .unwrap();

        let order: Vec<u32> = events.iter().map(|e| e.group).collect();
        assert_eq!(order, vec![11, 12, 0]);

        let lecture = &events[0];
        assert_eq!(lecture.details.weekday, Weekday::Monday);
        assert_eq!(lecture.details.time, "10:30 - 12:30");
        assert_eq!(lecture.details.building, "טאוב");
        assert_eq!(lecture.details.room, 2);
        assert_eq!(lecture.raw_event_id, "E-l");

        assert_eq!(events[1].details.building, "");
        assert_eq!(events[1].details.room, 0);
    }

    #[tokio::test]
    async fn test_parse_see_details_uses_slot_table() {
        let groups = vec![group(
            "11",
            "",
            vec![item(
                "הרצאה",
                "l",
                SEE_DETAILS_ROOM,
                "יום שני 10:30-12:30, יום רביעי 10:30-12:30",
            )],
        )];

        let rooms = StubRooms::default();
        let events = parse_schedule(Term::new(2024, 200), "02340114", &groups, &rooms)
            .await
            .unwrap();

        assert_eq!(rooms.slot_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].details.building, "אולמן");
        assert_eq!(events[0].details.room, 501);
        // No occurrence on Wednesday
        assert_eq!(events[1].details.building, "");
        assert_eq!(events[1].details.room, 0);
    }

    #[tokio::test]
    async fn test_parse_skips_sentinels_and_drops_duplicates() {
        let groups = vec![group(
            "11",
            "",
            vec![
                item("הרצאה", "a", "", "יום שני 10:30-12:30"),
                item("הרצאה", "b", "", "יום שני 10:30-12:30"),
                item("הרצאה", "c", "", "לֹא סָדִיר"),
                item("הרצאה", "d", "", "27.05.: 10:00-12:00"),
                item("הרצאה", "e", "", ""),
            ],
        )];

        let rooms = StubRooms::default();
        let events = parse_schedule(Term::new(2024, 200), "02340114", &groups, &rooms)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].raw_event_id, "E-a");
    }

    #[tokio::test]
    async fn test_parse_rejects_summary_mismatch() {
        let mut raw = item("הרצאה", "a", "", "יום שני 10:30-12:30");
        raw["ScheduleText"] = json!("יום שלישי 10:30-12:30");
        let groups = vec![group("11", "", vec![raw])];

        let err = parse_schedule(Term::new(2024, 200), "02340114", &groups, &StubRooms::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DataShape(ref msg) if msg.contains("mismatch")));
    }

    #[tokio::test]
    async fn test_parse_rejects_unknown_room_text() {
        let groups = vec![group(
            "11",
            "",
            vec![item("הרצאה", "a", "אולם 1", "יום שני 10:30-12:30")],
        )];

        let result =
            parse_schedule(Term::new(2024, 200), "02340114", &groups, &StubRooms::default()).await;
        assert!(matches!(result, Err(CatalogError::DataShape(_))));
    }

    /// Parse one irregular and one weekly item in `year`, returning events and warnings
    async fn parse_with_irregular_item(year: u16) -> (Vec<PendingEvent>, Vec<String>) {
        let capture = WarningCapture::default();
        let _guard = tracing_subscriber::registry()
            .with(capture.clone())
            .set_default();

        let groups = vec![group(
            "11",
            "",
            vec![
                item("הרצאה", "a", "", IRREGULAR_MARKER),
                item("תרגול", "b", "", "יום שני 10:30-12:30"),
            ],
        )];
        let events = parse_schedule(Term::new(year, 200), "02340114", &groups, &StubRooms::default())
            .await
            .unwrap();

        let warnings = capture.messages.lock().unwrap().clone();
        (events, warnings)
    }

    #[tokio::test]
    async fn test_irregular_schedule_is_skipped_quietly_before_2024() {
        let (events, warnings) = parse_with_irregular_item(2023).await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details.category, "תרגול");
        assert!(warnings.iter().all(|w| !w.contains("Unsupported date and time")));
    }

    #[tokio::test]
    async fn test_irregular_schedule_warns_from_2024() {
        let (events, warnings) = parse_with_irregular_item(2024).await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details.category, "תרגול");
        let unsupported: Vec<&String> = warnings
            .iter()
            .filter(|w| w.contains("Unsupported date and time"))
            .collect();
        assert_eq!(unsupported.len(), 1);
        assert!(unsupported[0].contains(IRREGULAR_MARKER));
        assert!(unsupported[0].starts_with("[2024/200/02340114]"));
    }
}
