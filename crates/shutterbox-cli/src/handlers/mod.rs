//! Command handlers
//!
//! Each handler module holds the execution logic for one subcommand plus
//! the pure helpers it is built from.

pub mod config;
pub mod devices;
pub mod export;
pub mod run;

pub use config::execute_config;
pub use devices::execute_devices;
pub use export::execute_export;
pub use run::execute_run;

use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use shutterbox::catalog::BackgroundCatalog;
use shutterbox::device::SyntheticBackend;
use shutterbox::export::{CompositeOutputs, SlotLayout};
use std::path::{Path, PathBuf};

/// Frame colours used when no background directory is given
const GENERATED_FRAMES: [[u8; 4]; 3] = [
    [255, 255, 255, 255],
    [24, 24, 24, 255],
    [214, 48, 49, 255],
];

/// Synthetic backend with one device per label
#[must_use]
pub fn synthetic_backend(labels: &[String]) -> SyntheticBackend {
    labels
        .iter()
        .fold(SyntheticBackend::new(), |backend, label| backend.with_device(label))
}

/// Backgrounds from `dir`, or generated frames for `layout`
pub fn load_catalog(dir: Option<&Path>, layout: &SlotLayout) -> CliResult<BackgroundCatalog> {
    match dir {
        Some(dir) => Ok(BackgroundCatalog::load_dir(dir)?),
        None => Ok(BackgroundCatalog::generated(layout, &GENERATED_FRAMES)),
    }
}

/// Highlight video frames generated for `layout`, matching the generated
/// strip backgrounds one for one
///
/// Artwork loaded from a directory is cut for the strip, so the exporter
/// decides whether it fits the highlight video.
#[must_use]
pub fn highlight_frames(dir: Option<&Path>, layout: &SlotLayout) -> Option<BackgroundCatalog> {
    dir.is_none().then(|| BackgroundCatalog::generated(layout, &GENERATED_FRAMES))
}

/// Reject a background index the catalog does not have
pub fn check_background(catalog: &BackgroundCatalog, index: usize) -> CliResult<()> {
    if index < catalog.len() {
        return Ok(());
    }
    let names: Vec<&str> = catalog.names().collect();
    Err(CliError::invalid_argument(format!(
        "background {index} does not exist (available: {})",
        names.join(", ")
    )))
}

/// Write every produced artifact into `dir`
///
/// Fails only when nothing at all was produced.
pub fn write_artifacts(
    outputs: &CompositeOutputs,
    dir: &Path,
    reporter: &ProgressReporter,
) -> CliResult<Vec<PathBuf>> {
    let artifacts = outputs.artifacts();
    if artifacts.is_empty() {
        return Err(CliError::export("no artifact could be rendered"));
    }

    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = artifact.write_to(dir)?;
        reporter.success(&format!("Wrote {}", path.display()));
        written.push(path);
    }
    Ok(written)
}
