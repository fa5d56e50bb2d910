//! catalog-fetch library interface
//!
//! Converts the catalog service's raw course records into canonical JSON:
//! general course metadata, reconciled exam dates and a normalized weekly
//! timetable per course.

pub mod cli;
pub mod course;
pub mod error;
pub mod gateway;
pub mod output;
pub mod schedule;
pub mod semesters;
pub mod services;
pub mod types;
pub mod workflow;

pub use crate::error::{CatalogError, Result};
