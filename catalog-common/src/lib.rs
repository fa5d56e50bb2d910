//! # Course Catalog Common Library
//!
//! Shared code for the course catalog tools including:
//! - Common error type
//! - TOML bootstrap configuration and path resolution
//! - Parsing of the catalog service's date and duration literals

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
