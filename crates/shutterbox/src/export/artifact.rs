//! Named output blobs.

use crate::result::BoothResult;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stem used when a session id sanitizes to nothing
pub const FALLBACK_STEM: &str = "photo-strip";

/// The three composite outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Still strip over the background frame
    Strip,
    /// Looping animation of the stills
    LoopAnimation,
    /// Synchronized clip montage
    HighlightVideo,
}

impl ArtifactKind {
    /// Every kind, in pipeline order
    pub const ALL: [Self; 3] = [Self::Strip, Self::LoopAnimation, Self::HighlightVideo];

    /// File name suffix, including the extension
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Strip => "-strip.png",
            Self::LoopAnimation => "-loop.gif",
            Self::HighlightVideo => "-highlight.mp4",
        }
    }

    /// MIME type
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Strip => "image/png",
            Self::LoopAnimation => "image/gif",
            Self::HighlightVideo => "video/mp4",
        }
    }

    /// Short label for logs and errors
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Strip => "strip",
            Self::LoopAnimation => "loop-animation",
            Self::HighlightVideo => "highlight-video",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
#[must_use]
pub fn sanitize_session_id(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned
    }
}

/// An encoded artifact ready to hand off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    kind: ArtifactKind,
    filename: String,
    bytes: Vec<u8>,
}

impl Artifact {
    /// Name the artifact after the session
    #[must_use]
    pub fn new(kind: ArtifactKind, session_id: &SessionId, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            filename: format!("{}{}", session_id.file_stem(), kind.suffix()),
            bytes,
        }
    }

    /// Kind
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Output file name
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Encoded bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write into `dir`, returning the full path
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn write_to(&self, dir: &Path) -> BoothResult<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
