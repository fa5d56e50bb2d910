//! Building name lookup
//!
//! Room objects carry a free-text building name. Names are normalized to a
//! short display form and memoized per (term, room id) for the whole run;
//! the lookup is a pure function of its key, so sharing it between course
//! tasks is safe.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CatalogError, Result};
use crate::gateway::{fetch_single, CatalogGateway, Queries};
use crate::types::{RawBuilding, Term};

/// Long official prefixes and the short names shown in the timetable
const BUILDING_PREFIXES: &[(&str, &str)] = &[
    ("בנין אולמן", "אולמן"),
    ("בנין בורוביץ הנדסה אזרחית", "בורוביץ הנדסה אזרחית"),
    ("בנין דן קהאן", "דן קהאן"),
    ("בנין הנ' אוירונאוטית", "הנ' אוירונאוטית"),
    ("בנין זיסאפל", "זיסאפל"),
    ("בנין להנדסת חמרים", "הנדסת חמרים"),
    ("בנין ליידי דייוס", "ליידי דייוס"),
    ("בנין למדעי המחשב", "מדעי המחשב"),
    ("בנין ע'ש אמדו", "אמדו"),
    ("בנין ע'ש טאוב", "טאוב"),
    ("בנין ע'ש סגו", "סגו"),
    ("בנין פישבך", "פישבך"),
    ("בנין פקולטה לרפואה", "פקולטה לרפואה"),
    ("בניין ננו-אלקטרוניקה", "ננו-אלקטרוניקה"),
    ("בניין ספורט", "ספורט"),
];

/// Collapse whitespace and shorten well-known building prefixes
pub fn display_building_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    for (prefix_from, prefix_to) in BUILDING_PREFIXES {
        if let Some(rest) = collapsed.strip_prefix(prefix_from) {
            return format!("{}{}", prefix_to, rest);
        }
    }

    collapsed
}

/// Run-scoped memoized building lookup
pub struct BuildingDirectory {
    gateway: Arc<dyn CatalogGateway>,
    queries: Queries,
    names: RwLock<HashMap<(Term, String), String>>,
}

impl BuildingDirectory {
    pub fn new(gateway: Arc<dyn CatalogGateway>, queries: Queries) -> Self {
        Self {
            gateway,
            queries,
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Display name of the building a room belongs to
    pub async fn building_name(&self, term: Term, room_id: &str) -> Result<String> {
        let key = (term, room_id.to_string());

        if let Some(name) = self.names.read().await.get(&key) {
            return Ok(name.clone());
        }

        let query = self.queries.building(term, room_id);
        let record: RawBuilding = fetch_single(self.gateway.as_ref(), &query).await?;
        if record.building.is_empty() {
            return Err(CatalogError::data_shape(format!(
                "Invalid building for room: {}",
                room_id
            )));
        }

        let name = display_building_name(&record.building);
        self.names.write().await.insert(key, name.clone());

        Ok(name)
    }

    /// Number of memoized lookups
    pub async fn len(&self) -> usize {
        self.names.read().await.len()
    }
}
