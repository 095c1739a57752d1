use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use pdv_io::{metrics_cache_dir, save_metrics};
use pdv_metrics::{compute_metrics, MetricsProcessor, ProcessorKind};

/// Computes and caches the metrics of the version stored in `data_dir`,
/// unless a cached copy already exists and `force` is off.
pub fn compute_save_metrics(
    name: &str,
    data_dir: &Path,
    processor: &dyn MetricsProcessor,
    force: bool,
) -> Result<PathBuf> {
    let cache_dir = metrics_cache_dir(data_dir, processor.name());
    if cache_dir.is_dir() {
        if !force {
            info!(version = name, dir = %cache_dir.display(), "reusing cached metrics");
            return Ok(cache_dir);
        }
        fs::remove_dir_all(&cache_dir)
            .with_context(|| format!("clearing metrics cache '{}'", cache_dir.display()))?;
    }

    let sweep = compute_metrics(data_dir, processor)
        .with_context(|| format!("computing metrics of version '{name}'"))?;
    if sweep.evaluated == 0 {
        bail!(
            "no sample of version '{name}' in '{}' could be evaluated ({} skipped)",
            data_dir.display(),
            sweep.skipped.len()
        );
    }
    for (position, skipped) in sweep.skipped.iter().enumerate() {
        println!("  skipped sample {}. {}: {}", position + 1, skipped.sample, skipped.error);
    }
    save_metrics(&sweep.tables, &cache_dir)
        .with_context(|| format!("saving metrics of version '{name}'"))?;
    info!(
        version = name,
        samples = sweep.evaluated,
        skipped = sweep.skipped.len(),
        "metrics computed"
    );
    Ok(cache_dir)
}

pub fn handle(processor: &str, data_dir: &Path, force: bool) -> Result<()> {
    let kind: ProcessorKind = processor.parse()?;
    let processor = kind.build()?;
    let name = data_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| data_dir.display().to_string());
    let cache_dir = compute_save_metrics(&name, data_dir, processor.as_ref(), force)?;
    println!("Metrics of '{name}' ({kind}) are in {}", cache_dir.display());
    Ok(())
}
