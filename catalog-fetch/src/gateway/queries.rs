//! OData query strings for the catalog service
//!
//! Query text doubles as the response cache key, so parameter order is fixed.

use url::form_urlencoded;

use crate::types::Term;

/// Query builder bound to one `sap-client` number
#[derive(Debug, Clone)]
pub struct Queries {
    client: String,
}

impl Queries {
    pub fn new(client: impl Into<String>) -> Self {
        Self {
            client: client.into(),
        }
    }

    /// All semesters known to the service
    pub fn semesters(&self) -> String {
        self.build(
            "SemesterSet",
            &[("$select", "PiqYear,PiqSession,Begda,Endda".to_string())],
        )
    }

    /// Course ids offered in a term
    pub fn course_list(&self, term: Term) -> String {
        self.build(
            "SmObjectSet",
            &[
                ("$skip", "0".to_string()),
                ("$top", "10000".to_string()),
                (
                    "$filter",
                    format!("Peryr eq '{}' and Perid eq '{}'", term.year, term.semester),
                ),
                ("$select", "Otjid".to_string()),
            ],
        )
    }

    /// Full course record with responsible staff, exams, relations and prerequisites
    pub fn course_detail(&self, term: Term, course_id: &str) -> String {
        self.build(
            "SmObjectSet",
            &[
                (
                    "$filter",
                    format!(
                        "Peryr eq '{}' and Perid eq '{}' and Otjid eq '{}'",
                        term.year, term.semester, course_id
                    ),
                ),
                (
                    "$select",
                    [
                        "Otjid",
                        "Points",
                        "Name",
                        "StudyContentDescription",
                        "OrgText",
                        // Without this, ZzAcademicLevelText is wrong
                        "ZzAcademicLevel",
                        "ZzAcademicLevelText",
                        "ZzSemesterNote",
                        "Responsible",
                        "Exams",
                        "SmRelations",
                        "SmPrereq",
                    ]
                    .join(","),
                ),
                ("$expand", "Responsible,Exams,SmRelations,SmPrereq".to_string()),
            ],
        )
    }

    /// Room object, used for its building name
    pub fn building(&self, term: Term, room_id: &str) -> String {
        let room_id: String = form_urlencoded::byte_serialize(room_id.as_bytes()).collect();
        self.build(
            &format!(
                "GObjectSet(Otjid='{}',Peryr='{}',Perid='{}')",
                room_id, term.year, term.semester
            ),
            &[("$select", "Building".to_string())],
        )
    }

    /// Dated occurrences of one event, with their rooms
    pub fn event_schedule(&self, term: Term, event_id: &str) -> String {
        self.build(
            "EventScheduleSet",
            &[
                (
                    "$filter",
                    format!(
                        "Otjid eq '{}' and Peryr eq '{}' and Perid eq '{}'",
                        event_id, term.year, term.semester
                    ),
                ),
                ("$expand", "Rooms".to_string()),
            ],
        )
    }

    /// Schedule groups of a course, with their events and staff
    pub fn schedule_groups(&self, term: Term, course_number: &str) -> String {
        self.build(
            &format!(
                "SmObjectSet(Otjid='SM{}',Peryr='{}',Perid='{}',ZzCgOtjid='',ZzPoVersion='',ZzScOtjid='')/SeObjectSet",
                course_number, term.year, term.semester
            ),
            &[("$expand", "EObjectSet,EObjectSet/Persons".to_string())],
        )
    }

    fn build(&self, entity: &str, params: &[(&str, String)]) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("sap-client", &self.client);
        for (key, value) in params {
            serializer.append_pair(key, value);
        }
        format!("{}?{}", entity, serializer.finish())
    }
}
