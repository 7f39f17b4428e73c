//! Request signing and the clock that feeds it.
//!
//! The vendor authenticates mall requests with
//! `md5("app_id={app_id}&tm={tm}{app_key}")`, hex encoded. The key is glued
//! directly onto the timestamp with no separator. A signature is only valid
//! together with the `tm` it was computed from, so callers must produce both
//! at the moment of the call and never keep them around.

use crate::credential::Credential;
use md5::{Digest, Md5};

/// Compute the signature for one call.
pub fn sign(app_id: &str, app_key: &str, timestamp: i64) -> String {
    let plain = format!("app_id={app_id}&tm={timestamp}{app_key}");
    hex::encode(Md5::digest(plain.as_bytes()))
}

/// Source of unix timestamps (seconds).
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// `app_id`, `sign` and `tm` query parameters for a single outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    pub app_id: String,
    pub sign: String,
    pub tm: i64,
}

impl SignedQuery {
    /// Read the clock and sign in one step.
    pub fn fresh(credential: &Credential, clock: &dyn Clock) -> Self {
        let tm = clock.now_unix();
        Self {
            app_id: credential.app_id().to_string(),
            sign: sign(credential.app_id(), credential.app_key(), tm),
            tm,
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("app_id".to_string(), self.app_id.clone()),
            ("sign".to_string(), self.sign.clone()),
            ("tm".to_string(), self.tm.to_string()),
        ]
    }
}
