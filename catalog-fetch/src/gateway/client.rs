//! Catalog service client
//!
//! Every query is wrapped in a single-part OData `$batch` request. The batch
//! answer is a multipart document; the JSON payload is the first line of its
//! third blank-line-separated chunk.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use catalog_common::config::GatewayConfig;

use super::cache::ResponseCache;
use super::retry::{retry_transient, RetryPolicy};
use super::CatalogGateway;
use crate::error::{CatalogError, Result};

const BATCH_BOUNDARY: &str = "batch_1d12-afbf-e3c7";
const USER_AGENT: &str = concat!("course-catalog/", env!("CARGO_PKG_VERSION"));

/// HTTP gateway to the catalog service, with optional response cache
pub struct SapGateway {
    http_client: reqwest::Client,
    endpoint: String,
    retry_policy: RetryPolicy,
    cache: Option<ResponseCache>,
}

impl SapGateway {
    pub fn new(config: &GatewayConfig, cache: Option<ResponseCache>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            retry_policy: RetryPolicy::from_config(config),
            cache,
        })
    }

    async fn send_once(&self, query: &str) -> Result<Value> {
        tracing::debug!(query = %query, "Sending request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(
                "Content-Type",
                format!("multipart/mixed;boundary={}", BATCH_BOUNDARY),
            )
            .header("Accept", "multipart/mixed")
            .header("Accept-Language", "he")
            .header("DataServiceVersion", "2.0")
            .header("MaxDataServiceVersion", "2.0")
            .header("X-Requested-With", "X")
            .header("sap-contextid-accept", "header")
            .header("sap-cancel-on-close", "true")
            .body(batch_body(query))
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() != 202 {
            return Err(CatalogError::UnexpectedStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let payload = parse_batch_response(&text)?;
        Ok(payload)
    }
}

#[async_trait]
impl CatalogGateway for SapGateway {
    async fn fetch(&self, query: &str) -> Result<Value> {
        if let Some(cache) = &self.cache {
            if let Some(payload) = cache.load(query).await? {
                tracing::trace!(query = %query, "Cache hit");
                return Ok(payload);
            }
        }

        let payload = retry_transient(query, &self.retry_policy, || self.send_once(query)).await?;

        if let Some(cache) = &self.cache {
            cache.store(query, &payload).await?;
        }

        Ok(payload)
    }
}

/// Multipart batch body with a single GET part, CRLF line endings
pub fn batch_body(query: &str) -> String {
    let body = format!(
        "
--{boundary}
Content-Type: application/http
Content-Transfer-Encoding: binary

GET {query} HTTP/1.1
sap-cancel-on-close: true
X-Requested-With: X
sap-contextid-accept: header
Accept: application/json
Accept-Language: he
DataServiceVersion: 2.0
MaxDataServiceVersion: 2.0


--{boundary}--
",
        boundary = BATCH_BOUNDARY,
        query = query
    );
    body.replace('\n', "\r\n")
}

/// Extract the JSON payload from a batch response
pub fn parse_batch_response(text: &str) -> Result<Value> {
    let normalized = text.replace("\r\n", "\n");
    let chunks: Vec<&str> = normalized.trim().split("\n\n").collect();
    if chunks.len() != 3 {
        return Err(CatalogError::MalformedEnvelope(format!(
            "expected 3 parts, got {}",
            chunks.len()
        )));
    }

    let json_str = chunks[2].split('\n').next().unwrap_or_default();
    tracing::debug!("Got {} bytes", json_str.len());

    serde_json::from_str(json_str).map_err(|e| CatalogError::InvalidPayload(e.to_string()))
}
