//! Command-line arguments

use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::types::Term;

/// Command-line arguments for catalog-fetch
#[derive(Parser, Debug)]
#[command(name = "catalog-fetch")]
#[command(about = "Fetch course catalog data into canonical JSON")]
#[command(version)]
pub struct Args {
    /// `YYYY-SSS` (e.g. 2024-200) or `last-N` for the N most recent semesters
    pub year_and_semester: RunTarget,

    /// Output JSON file; `{year}` and `{semester}` are substituted with `last-N`
    pub output_file: String,

    /// Also write a minified JavaScript file
    #[arg(long)]
    pub min_js_output_file: Option<String>,

    /// With `last-N`, write the selected semesters as JSON
    #[arg(long)]
    pub last_semesters_output_file: Option<PathBuf>,

    /// Filter restricted groups for terms that need it
    #[arg(long)]
    pub run_postprocessing: bool,

    /// Response cache directory
    #[arg(long, env = "CATALOG_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, env = "CATALOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Concurrent course workers (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Save the effective workers and cache directory to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Which terms to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTarget {
    Term(Term),
    /// The N most recent teaching semesters
    Last(usize),
}

impl FromStr for RunTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid year_and_semester: {}", s);

        let (first, second) = s.split_once('-').ok_or_else(invalid)?;
        if second.contains('-') {
            return Err(invalid());
        }

        if first == "last" {
            let count = second.parse().map_err(|_| invalid())?;
            return Ok(RunTarget::Last(count));
        }

        let year = first.parse().map_err(|_| invalid())?;
        let semester = second.parse().map_err(|_| invalid())?;
        Ok(RunTarget::Term(Term::new(year, semester)))
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTarget::Term(term) => write!(f, "{}-{}", term.year, term.semester),
            RunTarget::Last(count) => write!(f, "last-{}", count),
        }
    }
}
