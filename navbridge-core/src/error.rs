//! Structured error types for vendor operations.
//!
//! Every fallible call in the crate returns `NavError`. The variants split
//! along the lines callers act on: bad input (fix the table), inconsistent
//! chunk schemas (vendor or descriptor drift), transport failures (retry
//! later), and expired credentials (re-authenticate).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    /// Malformed caller input. Raised before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Chunk results of one logical query disagree on their column schema.
    #[error("schema mismatch in chunk {chunk}: expected [{expected}], got [{actual}]")]
    SchemaMismatch {
        chunk: usize,
        expected: String,
        actual: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("vendor rejected request (code {code}): {message}")]
    Vendor { code: i64, message: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    /// The token-authenticated lookup did not return the expected shape.
    #[error("{message} ({detail})")]
    Credential { message: String, detail: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl NavError {
    /// True for failures of the round trip itself: network, HTTP status or a
    /// vendor-side rejection. These abort a read dispatch and mark a single
    /// upload chunk as failed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NavError::Transport(_) | NavError::HttpStatus { .. } | NavError::Vendor { .. }
        )
    }

    pub(crate) fn credential_expired(detail: impl Into<String>) -> Self {
        NavError::Credential {
            message: "company lookup returned no record; the token has likely expired".into(),
            detail: detail.into(),
        }
    }
}
