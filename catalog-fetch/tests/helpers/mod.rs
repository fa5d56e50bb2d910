//! Test Helper Utilities
//!
//! Canned catalog responses keyed by exact query string, plus builders for
//! the raw JSON records the service returns.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use catalog_fetch::gateway::{CatalogGateway, Queries};
use catalog_fetch::types::Term;
use catalog_fetch::{CatalogError, Result};

/// 2024-05-27, a Monday
pub const MONDAY_MS: i64 = 1_716_768_000_000;
pub const DAY_MS: i64 = 86_400_000;
pub const MIDNIGHT: &str = "PT00H00M00S";

pub fn term() -> Term {
    Term::new(2024, 200)
}

pub fn queries() -> Queries {
    Queries::new("700")
}

/// `/Date(ms)/` literal for `days` after Monday 2024-05-27
pub fn service_date(days: i64) -> String {
    format!("/Date({})/", MONDAY_MS + days * DAY_MS)
}

/// Gateway answering from canned payloads and counting calls per query
#[derive(Default)]
pub struct FixtureGateway {
    responses: HashMap<String, Value>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FixtureGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `{"d": {"results": results}}`
    pub fn with_list(mut self, query: String, results: Vec<Value>) -> Self {
        self.responses
            .insert(query, json!({"d": {"results": results}}));
        self
    }

    /// Answer `query` with `{"d": value}`
    pub fn with_single(mut self, query: String, value: Value) -> Self {
        self.responses.insert(query, json!({ "d": value }));
        self
    }

    pub fn calls(&self, query: &str) -> usize {
        self.calls.lock().unwrap().get(query).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl CatalogGateway for FixtureGateway {
    async fn fetch(&self, query: &str) -> Result<Value> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default() += 1;

        self.responses
            .get(query)
            .cloned()
            .ok_or_else(|| CatalogError::data_shape(format!("No fixture for query: {}", query)))
    }
}

// ============================================================================
// Raw record builders
// ============================================================================

pub fn person(title: &str, first: &str, last: &str) -> Value {
    json!({"Title": title, "FirstName": first, "LastName": last})
}

pub fn schedule_item(
    event_id: &str,
    category: &str,
    room_text: &str,
    room_id: &str,
    schedule: &str,
    persons: Vec<Value>,
) -> Value {
    json!({
        "Otjid": event_id,
        "Name": category,
        "CategoryText": category,
        "RoomText": room_text,
        "RoomId": room_id,
        "ScheduleSummary": schedule,
        "ScheduleText": schedule,
        "Persons": {"results": persons}
    })
}

pub fn schedule_group(group_id: &str, items: Vec<Value>) -> Value {
    json!({
        "ZzSeSeqnr": group_id,
        "Name": "",
        "EObjectSet": {"results": items}
    })
}

pub fn exam(code: &str, id: &str, parent: &str, date: &str, begin: &str, end: &str) -> Value {
    json!({
        "CategoryCode": code,
        "ZzExamOfferGuid": id,
        "ZzExamOfferParentGuid": parent,
        "ExamDate": date,
        "ExamBegTime": begin,
        "ExamEndTime": end
    })
}

pub fn course_detail(course_id: &str, name: &str, exams: Vec<Value>) -> Value {
    json!({
        "Otjid": course_id,
        "Points": "3.50",
        "Name": name,
        "StudyContentDescription": "",
        "OrgText": "הפקולטה למדעי המחשב",
        "ZzAcademicLevel": "1",
        "ZzAcademicLevelText": "תואר ראשון",
        "ZzSemesterNote": "",
        "Responsible": {"results": [person("פרופ'", "דנה", "לוי")]},
        "Exams": {"results": exams},
        "SmRelations": {"results": []},
        "SmPrereq": {"results": []}
    })
}

pub fn occurrence(date: &str, begin: &str, end: &str, rooms: Vec<(&str, &str)>) -> Value {
    let rooms: Vec<Value> = rooms
        .into_iter()
        .map(|(id, name)| json!({"Otjid": id, "Name": name}))
        .collect();
    json!({
        "Evdat": date,
        "Beguz": begin,
        "Enduz": end,
        "Rooms": {"results": rooms}
    })
}
