//! Application credentials issued by the vendor's API mall.

use std::fmt;

/// Immutable credential set for one client instance.
///
/// `app_id`/`app_key` sign every mall request; `token` authenticates the
/// web API used by the company lookup. None of the values ever reach a log
/// line: `Debug` redacts them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    app_id: String,
    app_key: String,
    token: String,
}

impl Credential {
    pub fn new(
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
            token: token.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("app_id", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("token", &"<redacted>")
            .finish()
    }
}
