//! Run command handler: one kiosk session on the synthetic backend

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::handlers::{
    check_background, highlight_frames, load_catalog, synthetic_backend, write_artifacts,
};
use crate::output::ProgressReporter;
use shutterbox::config::BoothConfig;
use shutterbox::entry::UsageLedger;
use shutterbox::events::{EventSink, KioskEvent};
use shutterbox::kiosk::Kiosk;
use shutterbox::session::{KeyBindings, OperatorCommand, SessionControl};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Key that abandons the session
pub const QUIT_KEY: char = 'q';

/// Execute the run command
pub async fn execute_run(
    config: &CliConfig,
    mut booth: BoothConfig,
    args: &RunArgs,
) -> CliResult<()> {
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    if let Some(ref path) = args.loop_frame {
        booth.export.loop_frame = Some(path.clone());
    }
    let catalog = load_catalog(args.backgrounds.as_deref(), &booth.export.strip.layout)?;
    check_background(&catalog, args.background)?;
    let frames = highlight_frames(args.backgrounds.as_deref(), &booth.export.highlight_layout);

    let bindings = booth.bindings.clone();
    let (events, mut event_rx) = EventSink::channel();
    let mut kiosk = Kiosk::new(
        booth,
        Arc::new(synthetic_backend(&args.devices)),
        Arc::new(UsageLedger::new()),
        catalog,
    )
    .with_events(events);
    if let Some(frames) = frames {
        kiosk = kiosk.with_highlight_frames(frames);
    }
    while kiosk.background_index() != args.background {
        kiosk.next_background();
    }
    if let Some(ref id) = args.select {
        kiosk.devices().list_devices().await?;
        kiosk.devices().select_device(id);
    }

    let (tx, controls) = mpsc::channel(16);
    if args.unattended {
        reporter.info("Unattended: every shot is triggered and accepted automatically");
    } else {
        reporter.info(&key_help(&bindings));
        tokio::spawn(read_keys(bindings, tx.clone()));
    }

    let pilot = args.unattended.then_some(tx);
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            reporter.event(&event);
            let command = pilot.as_ref().zip(autopilot_command(&event));
            if let Some((tx, command)) = command {
                // a closed channel means the session already ended
                let _ = tx.send(command.into()).await;
            }
        }
        reporter
    });

    let outcome = kiosk.run_session(&args.token, controls).await;
    // dropping the kiosk closes the event stream and ends the printer
    drop(kiosk);
    let reporter = printer
        .await
        .unwrap_or_else(|_| ProgressReporter::new(config.color.should_color(), false));

    let report = outcome?;
    reporter.header(&format!(
        "Session {} ({} stills, {} clips)",
        report.session_id, report.stills, report.clips
    ));
    for path in write_artifacts(&report.outputs, &args.output, &reporter)? {
        println!("{}", path.display());
    }
    Ok(())
}

/// Command the unattended driver answers an event with
#[must_use]
pub const fn autopilot_command(event: &KioskEvent) -> Option<OperatorCommand> {
    match event {
        KioskEvent::SlotReady { .. } | KioskEvent::DeviceReady { .. } => {
            Some(OperatorCommand::TriggerCapture)
        }
        KioskEvent::StillCaptured { .. } => Some(OperatorCommand::Accept),
        _ => None,
    }
}

/// Controls for one line of keyboard input; unknown keys are skipped
#[must_use]
pub fn parse_keys(line: &str, bindings: &KeyBindings) -> Vec<SessionControl> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|key| {
            if key.eq_ignore_ascii_case(&QUIT_KEY) {
                Some(SessionControl::Abandon)
            } else {
                bindings.command_for(key).map(SessionControl::from)
            }
        })
        .collect()
}

fn key_help(bindings: &KeyBindings) -> String {
    format!(
        "Keys (then Enter): {} shoot, {} retake, {} accept, {QUIT_KEY} quit",
        bindings.key_for(OperatorCommand::TriggerCapture),
        bindings.key_for(OperatorCommand::Retake),
        bindings.key_for(OperatorCommand::Accept),
    )
}

/// Forward stdin keys until EOF, quit, or the session ends
async fn read_keys(bindings: KeyBindings, tx: mpsc::Sender<SessionControl>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        for control in parse_keys(&line, &bindings) {
            debug!(?control, "operator input");
            if tx.send(control).await.is_err() {
                return;
            }
            if control == SessionControl::Abandon {
                return;
            }
        }
    }
}
