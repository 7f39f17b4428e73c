//! Client configuration loaded from TOML.
//!
//! Credentials are deliberately absent: they are passed to the client as a
//! constructed [`Credential`](crate::Credential) value.

use crate::error::NavError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest number of registration codes the vendor accepts in one multi-key query.
pub const DEFAULT_READ_CHUNK: usize = 40;

/// Largest number of NAV rows sent in one upload request.
pub const DEFAULT_WRITE_CHUNK: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the signed mall API used by every read endpoint.
    pub base_url: String,

    /// Root of the upload API (`{upload_base_url}/{type}_price/batch/add`).
    pub upload_base_url: String,

    /// Root of the token-authenticated web API (company lookup).
    pub company_base_url: String,

    /// Per-request timeout handed to the HTTP client.
    pub timeout_secs: u64,

    pub user_agent: String,

    pub read_chunk_size: usize,

    pub write_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mallapi.huofuniu.com".into(),
            upload_base_url: "https://mallapi.huofuniu.com".into(),
            company_base_url: "https://api.huofuniu.com".into(),
            timeout_secs: 30,
            user_agent: concat!("navbridge/", env!("CARGO_PKG_VERSION")).into(),
            read_chunk_size: DEFAULT_READ_CHUNK,
            write_chunk_size: DEFAULT_WRITE_CHUNK,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, NavError> {
        let config: ClientConfig =
            toml::from_str(text).map_err(|e| NavError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, NavError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), NavError> {
        if self.read_chunk_size == 0 {
            return Err(NavError::Config("read_chunk_size must be at least 1".into()));
        }
        if self.write_chunk_size == 0 {
            return Err(NavError::Config("write_chunk_size must be at least 1".into()));
        }
        for (name, url) in [
            ("base_url", &self.base_url),
            ("upload_base_url", &self.upload_base_url),
            ("company_base_url", &self.company_base_url),
        ] {
            if url.trim().is_empty() {
                return Err(NavError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}
