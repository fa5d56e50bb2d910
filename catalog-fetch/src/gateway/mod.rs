//! Catalog service gateway
//!
//! Everything network-facing sits behind [`CatalogGateway`]: a query string in,
//! parsed JSON out. Normalization code only ever sees this trait, so tests can
//! swap in canned responses.

pub mod cache;
pub mod client;
pub mod queries;
pub mod retry;

pub use cache::ResponseCache;
pub use client::SapGateway;
pub use queries::Queries;
pub use retry::{retry_transient, RetryPolicy};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::types::ODataList;

/// Source of catalog JSON documents
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Run one OData query and return the decoded JSON payload
    async fn fetch(&self, query: &str) -> Result<Value>;
}

/// Unwrap a `{"d": {"results": [...]}}` payload into typed records
pub fn decode_results<T: DeserializeOwned>(query: &str, payload: Value) -> Result<Vec<T>> {
    let body = take_body(query, payload)?;
    let list: ODataList<T> = serde_json::from_value(body).map_err(|e| schema_error(query, e))?;
    Ok(list.results)
}

/// Unwrap a `{"d": {...}}` payload into a single typed record
pub fn decode_single<T: DeserializeOwned>(query: &str, payload: Value) -> Result<T> {
    let body = take_body(query, payload)?;
    serde_json::from_value(body).map_err(|e| schema_error(query, e))
}

/// Fetch and decode a result list
pub async fn fetch_results<T: DeserializeOwned>(
    gateway: &dyn CatalogGateway,
    query: &str,
) -> Result<Vec<T>> {
    let payload = gateway.fetch(query).await?;
    decode_results(query, payload)
}

/// Fetch and decode a single record
pub async fn fetch_single<T: DeserializeOwned>(
    gateway: &dyn CatalogGateway,
    query: &str,
) -> Result<T> {
    let payload = gateway.fetch(query).await?;
    decode_single(query, payload)
}

fn take_body(query: &str, payload: Value) -> Result<Value> {
    match payload {
        Value::Object(mut map) => map.remove("d").ok_or_else(|| CatalogError::Schema {
            query: query.to_string(),
            message: "missing \"d\" envelope".to_string(),
        }),
        other => Err(CatalogError::Schema {
            query: query.to_string(),
            message: format!("expected object, got {}", other),
        }),
    }
}

fn schema_error(query: &str, err: serde_json::Error) -> CatalogError {
    CatalogError::Schema {
        query: query.to_string(),
        message: err.to_string(),
    }
}
