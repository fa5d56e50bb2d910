//! Output files
//!
//! Course records are written as pretty JSON (2-space indent, non-ASCII kept
//! as-is) and optionally as a minified JavaScript assignment for the web
//! frontend.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;
use std::path::{Path, PathBuf};

use crate::course::CourseRecord;
use crate::error::Result;
use crate::semesters::SemesterInfo;
use crate::types::Term;

/// Variable name the frontend reads
pub const MIN_JS_PREFIX: &str = "var courses_from_rishum = ";

/// Faculties whose schedules hide restricted groups
const FILTERED_COURSE_PREFIXES: &[&str] = &["0104", "0106"];

/// Groups not open to regular students
const RESTRICTED_GROUPS: &[u32] = &[
    // Overseas program
    77,
    // External studies placeholder
    69,
    // High-school program
    40,
    // International students
    80, 86,
];

fn to_json_error(err: serde_json::Error) -> io::Error {
    io::Error::other(err)
}

/// Single-line JSON with `", "` and `": "` separators
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
    ) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn to_single_line_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer).map_err(to_json_error)?;
    Ok(String::from_utf8(buf).map_err(io::Error::other)?)
}

async fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(to_json_error)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Substitute `{year}` and `{semester}` in an output path template
pub fn expand_path_template(template: &str, term: Term) -> PathBuf {
    PathBuf::from(
        template
            .replace("{year}", &term.year.to_string())
            .replace("{semester}", &term.semester.to_string()),
    )
}

pub async fn write_courses(path: &Path, records: &[CourseRecord]) -> Result<()> {
    write_pretty(path, records).await?;
    tracing::info!(path = %path.display(), courses = records.len(), "Wrote course data");
    Ok(())
}

pub async fn write_min_js(path: &Path, records: &[CourseRecord]) -> Result<()> {
    let json = to_single_line_json(records)?;
    tokio::fs::write(path, format!("{}{}", MIN_JS_PREFIX, json)).await?;
    tracing::info!(path = %path.display(), "Wrote minified course data");
    Ok(())
}

pub async fn write_last_semesters(path: &Path, semesters: &[SemesterInfo]) -> Result<()> {
    write_pretty(path, semesters).await
}

/// Terms whose published data needs group filtering
pub fn needs_postprocessing(term: Term) -> bool {
    term.year == 2024 && (term.semester == 200 || term.semester == 201)
}

/// `<stem>.unfiltered<ext>` next to the output file
pub fn unfiltered_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}.unfiltered.{}", stem, ext.to_string_lossy()),
        None => format!("{}.unfiltered", stem),
    };
    path.with_file_name(file_name)
}

/// Drop restricted groups from the schedules of filtered faculties
pub fn filter_restricted_groups(records: &mut [CourseRecord]) {
    for record in records.iter_mut() {
        let number = &record.general.course_number;
        if !FILTERED_COURSE_PREFIXES.iter().any(|p| number.starts_with(p)) {
            continue;
        }

        let before = record.schedule.len();
        record
            .schedule
            .retain(|event| !RESTRICTED_GROUPS.contains(&event.group));

        if record.schedule.len() != before {
            tracing::debug!(
                course = %number,
                removed = before - record.schedule.len(),
                "Removed restricted groups"
            );
        }
    }
}

/// Keep the written file as `.unfiltered` and rewrite it with restricted groups removed
pub async fn postprocess_output(path: &Path, records: &mut [CourseRecord]) -> Result<()> {
    let unfiltered = unfiltered_path(path);
    tokio::fs::rename(path, &unfiltered).await?;
    tracing::info!(path = %unfiltered.display(), "Kept unfiltered course data");

    filter_restricted_groups(records);
    write_courses(path, records).await
}
