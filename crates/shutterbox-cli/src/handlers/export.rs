//! Export command handler: six still files into a strip and a loop animation

use crate::commands::ExportArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::handlers::{check_background, load_catalog, write_artifacts};
use crate::output::ProgressReporter;
use shutterbox::config::{ExportConfig, StripConfig};
use shutterbox::events::EventSink;
use shutterbox::export::{CompositeExporter, CompositeJob};
use shutterbox::session::{Session, SessionId, Slot, Still};
use std::path::{Path, PathBuf};
use tracing::info;

/// Execute the export command
pub async fn execute_export(
    config: &CliConfig,
    mut export: ExportConfig,
    args: &ExportArgs,
) -> CliResult<()> {
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    if let Some(orientation) = args.plain {
        export.strip = StripConfig::plain(orientation.into());
    }
    if let Some(ref path) = args.loop_frame {
        export.loop_frame = Some(path.clone());
    }
    let catalog = load_catalog(args.backgrounds.as_deref(), &export.strip.layout)?;
    if export.strip.framed {
        check_background(&catalog, args.background)?;
    }

    let session = load_session(&args.session, &args.stills)?;
    let job = CompositeJob::from_session(&session, args.background);
    info!(session = %job.session_id(), stills = job.still_count(), "exporting stills");

    let (events, mut event_rx) = EventSink::channel();
    let outputs = CompositeExporter::new(export, catalog)
        .with_events(events)
        .export(&job)
        .await;
    while let Ok(event) = event_rx.try_recv() {
        reporter.event(&event);
    }

    for path in write_artifacts(&outputs, &args.output, &reporter)? {
        println!("{}", path.display());
    }
    Ok(())
}

/// A complete clipless session from still files in slot order
pub fn load_session(id: &str, paths: &[PathBuf]) -> CliResult<Session> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::invalid_argument("session name must not be empty"));
    }
    let slots = paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let image = load_still(path)?;
            Ok(Slot::captured(index, Still::new(image, 0), None))
        })
        .collect::<CliResult<Vec<_>>>()?;
    Ok(Session::from_slots(SessionId::new(id), slots)?)
}

fn load_still(path: &Path) -> CliResult<image::RgbaImage> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|e| CliError::invalid_argument(format!("{}: {e}", path.display())))
}
