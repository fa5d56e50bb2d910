//! catalog-fetch - course catalog exporter
//!
//! Fetches one term (or the N most recent terms) from the catalog service
//! and writes canonical course JSON, optionally with a minified JavaScript
//! copy and the list of selected semesters.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_common::config::{
    default_config_path, load_toml_config, resolve_cache_dir, resolve_config_path,
    save_run_settings, TomlConfig,
};
use catalog_fetch::cli::{Args, RunTarget};
use catalog_fetch::gateway::{CatalogGateway, Queries, ResponseCache, SapGateway};
use catalog_fetch::output;
use catalog_fetch::semesters::last_semesters;
use catalog_fetch::types::Term;
use catalog_fetch::workflow::{into_records, run_term, CatalogServices, FailurePolicy};

fn init_tracing(args: &Args, config: &TomlConfig) -> Result<()> {
    let default_level = if args.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Persist the effective settings so later runs can drop the flags
///
/// Best-effort: a failed write is logged and the run continues.
fn save_config(
    config: &TomlConfig,
    path: Option<&Path>,
    workers: usize,
    cache_dir: Option<&Path>,
) {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        warn!("No config location available, settings not saved");
        return;
    };

    match save_run_settings(config, &path, workers, cache_dir) {
        Ok(()) => info!("Settings saved to {}", path.display()),
        Err(e) => warn!("Saving settings to {} failed: {}", path.display(), e),
    }
}

struct RunOptions {
    workers: usize,
    run_postprocessing: bool,
}

async fn export_term(
    services: &CatalogServices,
    term: Term,
    output_file: &Path,
    min_js_output_file: Option<&Path>,
    options: &RunOptions,
) -> Result<()> {
    info!("Fetching data for {}-{}...", term.year, term.semester);

    let outcomes = run_term(services, term, options.workers, FailurePolicy::FailFast)
        .await
        .with_context(|| format!("Failed to fetch term {}", term))?;
    let mut records = into_records(outcomes)?;

    output::write_courses(output_file, &records)
        .await
        .with_context(|| format!("Failed to write {}", output_file.display()))?;

    if options.run_postprocessing && output::needs_postprocessing(term) {
        output::postprocess_output(output_file, &mut records)
            .await
            .context("Post-processing failed")?;
    }

    if let Some(path) = min_js_output_file {
        output::write_min_js(path, &records)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = load_toml_config(config_path.as_deref()).context("Failed to load config")?;

    init_tracing(&args, &config)?;

    info!("Starting catalog-fetch {}", env!("CARGO_PKG_VERSION"));

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let cache_dir = resolve_cache_dir(args.cache_dir.as_deref(), &config, &cwd);

    let cache = cache_dir.clone().map(|dir| {
        info!("Response cache: {}", dir.display());
        ResponseCache::new(dir)
    });

    let gateway: Arc<dyn CatalogGateway> = Arc::new(
        SapGateway::new(&config.gateway, cache).context("Failed to create catalog client")?,
    );
    let services = CatalogServices::new(gateway, Queries::new(config.gateway.client.clone()));

    let options = RunOptions {
        workers: args.workers.unwrap_or(config.workers).max(1),
        run_postprocessing: args.run_postprocessing,
    };

    if args.save_config {
        save_config(
            &config,
            config_path.as_deref(),
            options.workers,
            cache_dir.as_deref(),
        );
    }

    let start = Instant::now();

    match args.year_and_semester {
        RunTarget::Last(count) => {
            let semesters = last_semesters(services.gateway(), services.queries(), count)
                .await
                .context("Failed to list semesters")?;

            if let Some(path) = &args.last_semesters_output_file {
                output::write_last_semesters(path, &semesters)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            for semester in &semesters {
                let term = semester.term();
                let output_file = output::expand_path_template(&args.output_file, term);
                let min_js_output_file = args
                    .min_js_output_file
                    .as_deref()
                    .map(|template| output::expand_path_template(template, term));

                export_term(
                    &services,
                    term,
                    &output_file,
                    min_js_output_file.as_deref(),
                    &options,
                )
                .await?;
            }
        }
        RunTarget::Term(term) => {
            let output_file = PathBuf::from(&args.output_file);
            let min_js_output_file = args.min_js_output_file.as_ref().map(PathBuf::from);

            export_term(
                &services,
                term,
                &output_file,
                min_js_output_file.as_deref(),
                &options,
            )
            .await?;
        }
    }

    info!(
        "Completed in {:.2} minutes",
        start.elapsed().as_secs_f64() / 60.0
    );

    Ok(())
}
