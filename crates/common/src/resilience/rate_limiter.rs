//! Minimum-interval request gate
//!
//! Serializes requests against a provider rate ceiling. A caller acquires a
//! [`GatePermit`] before issuing a request and holds it for the whole call;
//! dropping the permit records the completion time. The next acquire waits
//! until `min_interval` has passed since that completion, so at most one
//! request is ever in flight and consecutive requests never start closer
//! than the interval.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

/// Configuration for [`MinIntervalGate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Minimum spacing between the end of one request and the start of the
    /// next
    pub min_interval: Duration,
}

impl GateConfig {
    /// Spacing derived from a requests-per-second ceiling
    pub fn per_second(requests: u32) -> Self {
        Self { min_interval: Duration::from_secs(1) / requests.max(1) }
    }
}

/// Serializing gate enforcing a minimum interval between requests.
///
/// Share it through an `Arc` between every component issuing requests on
/// behalf of one connector instance.
#[derive(Debug)]
pub struct MinIntervalGate {
    config: GateConfig,
    last_completed: Mutex<Option<Instant>>,
}

impl MinIntervalGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config, last_completed: Mutex::new(None) }
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self::new(GateConfig { min_interval })
    }

    pub fn min_interval(&self) -> Duration {
        self.config.min_interval
    }

    /// Wait for the interval to elapse and take exclusive use of the gate.
    pub async fn acquire(&self) -> GatePermit<'_> {
        let guard = self.last_completed.lock().await;

        if let Some(last) = *guard {
            let ready_at = last + self.config.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(wait_ms = (ready_at - now).as_millis() as u64, "Rate limit: waiting");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        GatePermit { guard }
    }

    /// Completion time of the last request, if any.
    pub async fn last_completed(&self) -> Option<Instant> {
        *self.last_completed.lock().await
    }
}

impl Default for MinIntervalGate {
    fn default() -> Self {
        Self::with_interval(Duration::from_millis(500))
    }
}

/// Exclusive right to issue one request.
///
/// Dropping it records the completion time, whether the request succeeded or
/// not.
#[derive(Debug)]
pub struct GatePermit<'a> {
    guard: MutexGuard<'a, Option<Instant>>,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        *self.guard = Some(Instant::now());
    }
}
