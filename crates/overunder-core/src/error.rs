// Error types for autosave, draft storage and the HTTP transport.

use thiserror::Error;

/// Failure of a single network call to the contest server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),
}

/// Failure reading or writing the local draft store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode draft: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("corrupt draft for contest {contest_id}: {source}")]
    Corrupt {
        contest_id: String,
        source: serde_json::Error,
    },
}

/// Everything that can make an autosave cycle do nothing.
///
/// None of these are surfaced to the user; they are logged and the next
/// trigger tries again.
#[derive(Debug, Error)]
pub enum AutosaveError {
    #[error("no form scope bound to autosave")]
    ConfigurationAbsent,

    #[error("autosave request failed: {0}")]
    Network(#[from] TransportError),

    #[error("draft storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("could not restore draft: {0}")]
    Serialization(String),
}

impl AutosaveError {
    /// Whether the failure looks transient: connection errors, timeouts,
    /// throttling and server-side errors. A 4xx rejection is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AutosaveError::Network(TransportError::Status(code)) => {
                *code >= 500 || *code == 408 || *code == 429
            }
            AutosaveError::Network(TransportError::Request(_)) => true,
            _ => false,
        }
    }
}
