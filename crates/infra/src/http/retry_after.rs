//! `Retry-After` header parsing

use std::time::Duration;

use chrono::{DateTime, Utc};
use rseries_domain::constants::{DEFAULT_RETRY_AFTER_SECS, MAX_RETRY_TIME_SECS};
use tracing::debug;

/// Wait requested by a 429 response.
///
/// Accepts delta-seconds (`"120"`) or an HTTP-date. A missing or unparseable
/// header, and a date that is already past, fall back to
/// [`DEFAULT_RETRY_AFTER_SECS`]. Waits are capped at [`MAX_RETRY_TIME_SECS`].
pub fn parse_retry_after(header: Option<&str>, now: DateTime<Utc>) -> Duration {
    parse_uncapped(header, now).min(Duration::from_secs(MAX_RETRY_TIME_SECS))
}

fn parse_uncapped(header: Option<&str>, now: DateTime<Utc>) -> Duration {
    let default = Duration::from_secs(DEFAULT_RETRY_AFTER_SECS);
    let Some(raw) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return default;
    };

    if let Ok(seconds) = raw.parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    match DateTime::parse_from_rfc2822(raw) {
        Ok(at) => {
            let delta = at.with_timezone(&Utc) - now;
            match delta.to_std() {
                Ok(wait) if !wait.is_zero() => Duration::from_secs(wait.as_secs().max(1)),
                _ => {
                    debug!(retry_after = raw, "Retry-After date already passed, using default");
                    default
                }
            }
        }
        Err(_) => {
            debug!(retry_after = raw, "Unparseable Retry-After header, using default");
            default
        }
    }
}
