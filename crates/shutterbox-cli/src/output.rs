//! Output formatting and progress reporting

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use shutterbox::events::KioskEvent;

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Operator-facing progress on stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Move the bar to `position`
    pub fn set_position(&self, position: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_position(position);
        }
    }

    /// Finish and drop the progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefix("✓", "OK", Tone::Good), message);
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        self.line(&self.prefix("✗", "FAIL", Tone::Bad), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefix("⚠", "WARN", Tone::Warn), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefix("ℹ", "INFO", Tone::Info), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            title.to_string()
        };
        let _ = self.term.write_line(&styled);
    }

    /// Render one kiosk event
    pub fn event(&mut self, event: &KioskEvent) {
        match event {
            KioskEvent::HighlightProgress { frame, total } => {
                if self.progress_bar.is_none() {
                    self.start_progress(*total as u64, "highlight video");
                }
                self.set_position(*frame as u64);
                if frame >= total {
                    self.finish();
                }
            }
            KioskEvent::CountdownCue { remaining: 0, .. } => self.info("Smile!"),
            KioskEvent::CountdownCue { remaining, .. } => self.info(&format!("{remaining}...")),
            KioskEvent::DeviceUnavailable { .. }
            | KioskEvent::DeviceLost { .. }
            | KioskEvent::ArtifactSkipped { .. }
            | KioskEvent::Notice(_) => self.warning(&describe(event)),
            KioskEvent::ArtifactFailed { .. } => self.failure(&describe(event)),
            KioskEvent::ArtifactReady { .. }
            | KioskEvent::SessionComplete { .. }
            | KioskEvent::SlotAccepted { .. } => self.success(&describe(event)),
            _ => self.info(&describe(event)),
        }
    }

    fn prefix(&self, symbol: &str, plain: &str, tone: Tone) -> String {
        if !self.use_color {
            return plain.to_string();
        }
        let styled = style(symbol).bold();
        let colored = match tone {
            Tone::Good => styled.green(),
            Tone::Bad => styled.red(),
            Tone::Warn => styled.yellow(),
            Tone::Info => styled.blue(),
        };
        colored.to_string()
    }

    fn line(&self, prefix: &str, message: &str) {
        let text = format!("{prefix} {message}");
        match self.progress_bar {
            Some(ref pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(&text);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Bad,
    Warn,
    Info,
}

/// One-line description of an event
#[must_use]
pub fn describe(event: &KioskEvent) -> String {
    match event {
        KioskEvent::SessionStarted { session_id } => format!("Session {session_id} started"),
        KioskEvent::DeviceReady { device } => format!("Camera {device} ready"),
        KioskEvent::DeviceUnavailable { attempts, message } => {
            format!("No camera after {attempts} attempt(s): {message}")
        }
        KioskEvent::DeviceLost { message } => format!("Camera lost: {message}"),
        KioskEvent::SlotReady { slot, progress } => format!(
            "Photo {} of 6 ready ({:.0}% done)",
            slot + 1,
            progress * 100.0
        ),
        KioskEvent::CountdownCue { slot, remaining } => {
            format!("Photo {}: {remaining}", slot + 1)
        }
        KioskEvent::CountdownAborted { slot } => format!("Photo {} countdown aborted", slot + 1),
        KioskEvent::StillCaptured { slot, has_clip } => {
            let clip = if *has_clip { "with clip" } else { "still only" };
            format!("Photo {} captured ({clip})", slot + 1)
        }
        KioskEvent::SlotAccepted { slot, automatic } => {
            let how = if *automatic { "automatically" } else { "by operator" };
            format!("Photo {} accepted {how}", slot + 1)
        }
        KioskEvent::Notice(notice) => notice.to_string(),
        KioskEvent::SessionComplete { session_id } => format!("Session {session_id} complete"),
        KioskEvent::SessionReset { session_id } => format!("Session {session_id} reset"),
        KioskEvent::HighlightProgress { frame, total } => {
            format!("Highlight frame {frame}/{total}")
        }
        KioskEvent::ArtifactReady {
            kind,
            filename,
            bytes,
        } => format!("{} ready: {filename} ({bytes} bytes)", kind.label()),
        KioskEvent::ArtifactSkipped { kind, reason } => {
            format!("{} skipped: {reason}", kind.label())
        }
        KioskEvent::ArtifactFailed { kind, message } => {
            format!("{} failed: {message}", kind.label())
        }
    }
}
