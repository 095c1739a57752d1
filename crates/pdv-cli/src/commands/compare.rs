use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use pdv_cli::config::RunConfig;
use pdv_compare::ComparisonDriver;
use pdv_io::load_multiple_metrics;

use crate::commands::metrics::compute_save_metrics;

pub const CONFIG_COPY: &str = "config.json";

pub fn handle(config_path: &Path, output_dir: Option<&Path>, force: bool) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let plan = config.plan()?;
    let colors = config.colors()?;
    let processor = config.processor_kind()?.build()?;

    let sources = config.version_sources();
    for source in &sources {
        compute_save_metrics(&source.name, &source.path, processor.as_ref(), force)?;
    }
    let metrics = load_multiple_metrics(&sources, processor.name()).context("loading cached metrics")?;
    let mut driver = ComparisonDriver::new(&metrics, &colors, &config.figure_settings, plan)?;

    let root = output_dir.map(Path::to_path_buf).unwrap_or_else(|| config.output_dir.clone());
    let run_dir = create_run_dir(&root)?;
    fs::copy(config_path, run_dir.join(CONFIG_COPY))
        .with_context(|| format!("copying configuration into '{}'", run_dir.display()))?;
    info!(dir = %run_dir.display(), versions = metrics.versions().len(), "starting comparison");

    let summary = driver.run(&run_dir)?;
    println!(
        "Wrote {} artifacts to {} (manifest: {})",
        summary.artifacts.len(),
        run_dir.display(),
        summary.manifest_path.display()
    );
    if !summary.skipped.is_empty() {
        println!("Skipped {} artifacts:", summary.skipped.len());
        for (position, skipped) in summary.skipped.iter().enumerate() {
            println!("  {}. {skipped}", position + 1);
        }
    }
    Ok(())
}

/// `<root>/<YYYYmmdd_HHMMSS>`, with a numeric suffix when that second is taken.
fn create_run_dir(root: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut run_dir = root.join(&stamp);
    let mut attempt = 1;
    while run_dir.exists() {
        run_dir = root.join(format!("{stamp}_{attempt}"));
        attempt += 1;
    }
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating run directory '{}'", run_dir.display()))?;
    Ok(run_dir)
}
