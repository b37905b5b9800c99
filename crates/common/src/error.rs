//! Error types for Switchboard.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchboardError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Backend '{backend}' unavailable: {reason}")]
    AdapterUnavailable { backend: String, reason: String },

    #[error("Ticket creation failed: {0}")]
    TicketCreation(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SwitchboardError {
    /// Wrap any failure from a read-only backend as `AdapterUnavailable`.
    pub fn adapter(backend: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::AdapterUnavailable {
            backend: backend.into(),
            reason: source.to_string(),
        }
    }

    /// True when a mutation was attempted and may need a manual retry.
    pub fn is_ticket_failure(&self) -> bool {
        matches!(self, Self::TicketCreation(_))
    }
}

pub type Result<T> = std::result::Result<T, SwitchboardError>;
