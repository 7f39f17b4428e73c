//! NAV upload path: table validation, transcoding and per-chunk outcomes.

pub mod nav;
pub mod transcode;

pub use nav::{nav_frame, validate_nav_table, NavRecord, NavRow};
pub use transcode::{transcode, NetEntry, UploadBody, UploadPayload};

use crate::error::NavError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which vendor price book an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    /// Internal products (`inner_price/batch/add`).
    Inner,
    /// Company-level series (`company_price/batch/add`).
    Company,
}

impl UploadType {
    pub fn path_prefix(self) -> &'static str {
        match self {
            UploadType::Inner => "inner",
            UploadType::Company => "company",
        }
    }
}

impl fmt::Display for UploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_prefix())
    }
}

impl std::str::FromStr for UploadType {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(UploadType::Inner),
            "company" => Ok(UploadType::Company),
            other => Err(NavError::Validation(format!(
                "unknown upload type '{other}' (expected inner or company)"
            ))),
        }
    }
}

/// Result of sending one upload chunk.
#[derive(Debug)]
pub struct UploadOutcome {
    pub chunk_index: usize,
    pub rows: usize,
    pub products: usize,
    /// Vendor response body on success.
    pub result: Result<serde_json::Value, NavError>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered outcomes of every chunk of one upload.
///
/// A failed chunk never stops later chunks, so callers must inspect this
/// to decide whether partial success is acceptable.
#[derive(Debug, Default)]
pub struct UploadSummary {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}
