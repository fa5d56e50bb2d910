//! Lookups that need extra service round-trips
//!
//! Schedule parsing talks to these through [`RoomSource`], scoped to one
//! term, so it can be exercised without a network.

pub mod building_directory;
pub mod room_resolver;

pub use building_directory::{display_building_name, BuildingDirectory};
pub use room_resolver::{parse_room_code, resolve_rooms};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::gateway::{fetch_results, CatalogGateway, Queries};
use crate::types::{RawOccurrence, RoomLookupTable, Term};

/// Building display name for a room object
#[async_trait]
pub trait BuildingLookup: Send + Sync {
    async fn building_name(&self, room_id: &str) -> Result<String>;
}

/// Room data for schedule items
#[async_trait]
pub trait RoomSource: BuildingLookup {
    /// Weekly room table for a raw event, built from its dated occurrences
    async fn rooms_by_slot(&self, event_id: &str) -> Result<RoomLookupTable>;
}

/// [`RoomSource`] backed by the catalog service for one term
pub struct TermRooms {
    term: Term,
    gateway: Arc<dyn CatalogGateway>,
    queries: Queries,
    directory: Arc<BuildingDirectory>,
}

impl TermRooms {
    pub fn new(
        term: Term,
        gateway: Arc<dyn CatalogGateway>,
        queries: Queries,
        directory: Arc<BuildingDirectory>,
    ) -> Self {
        Self {
            term,
            gateway,
            queries,
            directory,
        }
    }
}

#[async_trait]
impl BuildingLookup for TermRooms {
    async fn building_name(&self, room_id: &str) -> Result<String> {
        self.directory.building_name(self.term, room_id).await
    }
}

#[async_trait]
impl RoomSource for TermRooms {
    async fn rooms_by_slot(&self, event_id: &str) -> Result<RoomLookupTable> {
        let query = self.queries.event_schedule(self.term, event_id);
        let occurrences: Vec<RawOccurrence> = fetch_results(self.gateway.as_ref(), &query).await?;

        tracing::debug!(
            event_id = %event_id,
            occurrences = occurrences.len(),
            "Resolving rooms from occurrences"
        );

        resolve_rooms(event_id, &occurrences, self).await
    }
}
