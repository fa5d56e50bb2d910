//! Error types for catalog-fetch
//!
//! Two classes matter to callers:
//! - transient gateway failures, retried with backoff inside the gateway
//! - data errors (schema, shape, consistency), always fatal for the course

use thiserror::Error;

/// Catalog fetch error type
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure talking to the catalog service
    #[error("Network error: {0}")]
    Network(String),

    /// Batch endpoint answered with something other than 202
    #[error("Bad status code: {0}, expected 202")]
    UnexpectedStatus(u16),

    /// Batch response did not split into the expected parts
    #[error("Invalid batch response: {0}")]
    MalformedEnvelope(String),

    /// Batch payload was not valid JSON
    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(String),

    /// JSON does not match the expected record layout
    #[error("Schema mismatch for {query}: {message}")]
    Schema { query: String, message: String },

    /// Value outside a closed set of categories, operators, patterns or nesting depth
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// Groups sharing a category and event number disagree on their events
    #[error("Invalid events for category {category} and id {event_number}: {detail}")]
    Inconsistent {
        category: String,
        event_number: u32,
        detail: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// catalog-common error
    #[error("Common error: {0}")]
    Common(#[from] catalog_common::Error),
}

impl CatalogError {
    /// True for failures worth retrying against the service
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::Network(_)
                | CatalogError::UnexpectedStatus(_)
                | CatalogError::MalformedEnvelope(_)
                | CatalogError::InvalidPayload(_)
        )
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        CatalogError::DataShape(message.into())
    }
}

/// Malformed service literals are data errors, not configuration problems
pub(crate) fn literal_error(err: catalog_common::Error) -> CatalogError {
    match err {
        catalog_common::Error::Parse(msg) => CatalogError::DataShape(msg),
        other => CatalogError::Common(other),
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
