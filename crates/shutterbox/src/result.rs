//! Result and error types for Shutterbox.

use thiserror::Error;

/// Result type for Shutterbox operations
pub type BoothResult<T> = Result<T, BoothError>;

/// Errors that can occur while running a kiosk session or exporting artifacts
#[derive(Debug, Error)]
pub enum BoothError {
    /// No capture device could be opened after the bounded retry loop
    #[error("Capture device unavailable after {attempts} attempt(s): {message}")]
    DeviceUnavailable {
        /// Number of acquisition attempts made
        attempts: u32,
        /// Last failure reported by the backend
        message: String,
    },

    /// A live stream stopped delivering frames
    #[error("Capture device lost: {message}")]
    DeviceLost {
        /// Error message
        message: String,
    },

    /// Accept or retake invoked before a still exists for the slot
    #[error("Slot {slot} has no still yet")]
    PrematureAction {
        /// Slot index
        slot: usize,
    },

    /// Retake invoked for a slot whose retake was already used
    #[error("Retake already used for slot {slot}")]
    RetakeExhausted {
        /// Slot index
        slot: usize,
    },

    /// Clip recording could not be armed or produced no data
    #[error("Clip unavailable for slot {slot}: {message}")]
    ClipUnavailable {
        /// Slot index
        slot: usize,
        /// Error message
        message: String,
    },

    /// Animation or video encoder failure
    #[error("Encoding {artifact} failed: {message}")]
    EncodeFailure {
        /// Artifact being produced
        artifact: String,
        /// Error message
        message: String,
    },

    /// A session was built from the wrong number of slots
    #[error("A session needs exactly {expected} slots, got {actual}")]
    SlotCount {
        /// Required slot count
        expected: usize,
        /// Slot count supplied
        actual: usize,
    },

    /// Slot index outside the session
    #[error("Slot index {index} out of range")]
    SlotOutOfRange {
        /// Requested index
        index: usize,
    },

    /// The entry token was rejected by the validator
    #[error("Entry token rejected: {token}")]
    EntryRejected {
        /// Token as presented
        token: String,
    },

    /// The session was abandoned before completion
    #[error("Session {session_id} abandoned")]
    SessionAbandoned {
        /// Session identifier
        session_id: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Image processing error (resizing, compositing, decoding)
    #[error("Image processing failed: {message}")]
    ImageProcessing {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image codec error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoothError {
    /// Create an encode failure for the named artifact
    #[must_use]
    pub fn encode(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncodeFailure {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Create an image processing error
    #[must_use]
    pub fn image(message: impl Into<String>) -> Self {
        Self::ImageProcessing {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error is recovered locally and never ends a session
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PrematureAction { .. }
                | Self::RetakeExhausted { .. }
                | Self::ClipUnavailable { .. }
                | Self::EncodeFailure { .. }
                | Self::DeviceLost { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_unavailable_display() {
        let err = BoothError::DeviceUnavailable {
            attempts: 3,
            message: "no devices".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Capture device unavailable after 3 attempt(s): no devices"
        );
    }

    #[test]
    fn test_encode_helper() {
        let err = BoothError::encode("loop-animation", "palette overflow");
        assert!(matches!(err, BoothError::EncodeFailure { .. }));
        assert!(err.to_string().contains("loop-animation"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(BoothError::PrematureAction { slot: 0 }.is_recoverable());
        assert!(BoothError::RetakeExhausted { slot: 2 }.is_recoverable());
        assert!(!BoothError::SlotCount {
            expected: 6,
            actual: 5
        }
        .is_recoverable());
        assert!(!BoothError::DeviceUnavailable {
            attempts: 3,
            message: String::new()
        }
        .is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BoothError = io.into();
        assert!(matches!(err, BoothError::Io(_)));
    }
}
