//! Operator commands and key bindings.

use crate::result::{BoothError, BoothResult};
use serde::{Deserialize, Serialize};

/// Operator command; identical whether it came from a key, a button, or a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCommand {
    /// Start the countdown for the current slot
    TriggerCapture,
    /// Redo the current slot (once)
    Retake,
    /// Keep the current slot and move on
    Accept,
}

/// Messages accepted by a running session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    /// An operator command
    Operator(OperatorCommand),
    /// Drop the session and its media
    Abandon,
}

impl From<OperatorCommand> for SessionControl {
    fn from(command: OperatorCommand) -> Self {
        Self::Operator(command)
    }
}

/// Keyboard mapping for the operator commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Trigger capture
    pub trigger: char,
    /// Retake
    pub retake: char,
    /// Accept
    pub accept: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            trigger: 'h',
            retake: 'j',
            accept: 'k',
        }
    }
}

impl KeyBindings {
    /// Command bound to a key (case-insensitive)
    #[must_use]
    pub fn command_for(&self, key: char) -> Option<OperatorCommand> {
        let key = key.to_ascii_lowercase();
        [
            (self.trigger, OperatorCommand::TriggerCapture),
            (self.retake, OperatorCommand::Retake),
            (self.accept, OperatorCommand::Accept),
        ]
        .into_iter()
        .find(|(bound, _)| bound.to_ascii_lowercase() == key)
        .map(|(_, command)| command)
    }

    /// Key bound to a command
    #[must_use]
    pub const fn key_for(&self, command: OperatorCommand) -> char {
        match command {
            OperatorCommand::TriggerCapture => self.trigger,
            OperatorCommand::Retake => self.retake,
            OperatorCommand::Accept => self.accept,
        }
    }

    /// Reject bindings that map two commands to one key
    ///
    /// # Errors
    ///
    /// Returns a config error naming the duplicated key
    pub fn validate(&self) -> BoothResult<()> {
        let keys = [self.trigger, self.retake, self.accept].map(|k| k.to_ascii_lowercase());
        for (i, key) in keys.iter().enumerate() {
            if keys[i + 1..].contains(key) {
                return Err(BoothError::config(format!(
                    "key '{key}' is bound to more than one command"
                )));
            }
            if key.is_whitespace() || key.is_control() {
                return Err(BoothError::config("bindings must be printable keys"));
            }
        }
        Ok(())
    }
}
