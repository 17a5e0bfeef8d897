//! OAuth credential record

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_BUFFER_SECONDS;

/// The single mutable credential record of one connector instance.
///
/// `expires_at` is an absolute Unix timestamp in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub expires_at: Option<i64>,
}

impl Credentials {
    /// A token is usable when it exists, has a known expiry, and that expiry
    /// is at least [`TOKEN_BUFFER_SECONDS`] away from `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: i64) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at)) if !token.is_empty() => {
                expires_at.saturating_sub(now) >= TOKEN_BUFFER_SECONDS
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now().timestamp())
    }

    /// Non-empty refresh token, if one is configured.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}
