//! On-disk response cache
//!
//! One JSON file per query. Responses are a pure function of the query, so
//! concurrent writers may race freely: the last write wins with identical
//! content.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::error::Result;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid filename regex"));

const PREFIX_CHARS: usize = 64;

/// Directory of cached service responses
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache file for a query: readable prefix plus a hash of the full query
    pub fn path_for(&self, query: &str) -> PathBuf {
        self.dir.join(cache_file_name(query))
    }

    /// Cached payload, if present and readable
    ///
    /// A file that fails to parse (e.g. a torn concurrent write) counts as a miss.
    pub async fn load(&self, query: &str) -> Result<Option<Value>> {
        let path = self.path_for(query);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable cache file"
                );
                Ok(None)
            }
        }
    }

    pub async fn store(&self, query: &str, payload: &Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(payload).map_err(std::io::Error::other)?;
        tokio::fs::write(self.path_for(query), content).await?;
        Ok(())
    }
}

fn cache_file_name(query: &str) -> String {
    let sanitized = UNSAFE_FILENAME_CHARS.replace_all(query, "_");
    let prefix: String = sanitized.chars().take(PREFIX_CHARS).collect();

    let digest = Sha256::digest(query.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let hash = u64::from_le_bytes(head);

    format!("{}_{:x}.json", prefix, hash)
}
