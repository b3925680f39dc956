//! Entry token validation.
//!
//! The kiosk only needs accept/reject; the usage class is reported for
//! display. [`UsageLedger`] is an in-memory reference validator.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info};

/// How often a token may start a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageClass {
    /// One session
    SingleUse,
    /// A fixed number of sessions
    LimitedUse(u32),
    /// No limit
    Unlimited,
}

impl UsageClass {
    /// Classify a token by its markers
    #[must_use]
    pub fn for_token(token: &str) -> Self {
        if token.contains("UNLIMITED") {
            Self::Unlimited
        } else if token.contains("007") {
            Self::LimitedUse(2)
        } else {
            Self::SingleUse
        }
    }

    /// Sessions allowed, `None` when unlimited
    #[must_use]
    pub const fn allowance(self) -> Option<u32> {
        match self {
            Self::SingleUse => Some(1),
            Self::LimitedUse(n) => Some(n),
            Self::Unlimited => None,
        }
    }
}

/// Outcome of validating a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum EntryDecision {
    /// Start a session
    Accepted {
        /// Usage class of the token
        usage: UsageClass,
        /// Sessions left after this one, `None` when unlimited
        remaining: Option<u32>,
    },
    /// Do not start a session
    Rejected {
        /// Why
        reason: String,
    },
}

impl EntryDecision {
    /// Whether a session may start
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Validates entry tokens
#[async_trait]
pub trait EntryValidator: Send + Sync + fmt::Debug {
    /// Check a token and record its use when accepted
    async fn validate(&self, token: &str) -> EntryDecision;
}

/// In-memory usage accounting
#[derive(Debug, Default)]
pub struct UsageLedger {
    used: Mutex<HashMap<String, u32>>,
}

impl UsageLedger {
    /// Empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions started with `token`
    #[must_use]
    pub fn uses(&self, token: &str) -> u32 {
        self.used
            .lock()
            .map_or(0, |used| used.get(token).copied().unwrap_or(0))
    }
}

#[async_trait]
impl EntryValidator for UsageLedger {
    async fn validate(&self, token: &str) -> EntryDecision {
        let token = token.trim();
        if token.is_empty() {
            return EntryDecision::Rejected {
                reason: "empty token".to_string(),
            };
        }

        let usage = UsageClass::for_token(token);
        let Ok(mut used) = self.used.lock() else {
            return EntryDecision::Rejected {
                reason: "usage ledger unavailable".to_string(),
            };
        };
        let count = used.entry(token.to_string()).or_insert(0);

        let remaining = match usage.allowance() {
            Some(limit) if *count >= limit => {
                debug!(token, limit, "token exhausted");
                return EntryDecision::Rejected {
                    reason: format!("token already used {count} time(s)"),
                };
            }
            Some(limit) => Some(limit - *count - 1),
            None => None,
        };
        *count += 1;
        info!(token, ?usage, ?remaining, "entry accepted");
        EntryDecision::Accepted { usage, remaining }
    }
}
