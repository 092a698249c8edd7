//! Per-service minimum request interval

use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, Instant};

/// Enforces a minimum interval between consecutive outbound requests
///
/// Each geocoding service owns one throttle, so simplified re-queries against
/// the same service are spaced like primary queries.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_tick: AsyncMutex<Option<Instant>>,
}

impl RequestThrottle {
    /// Create throttle with the given minimum interval
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_tick: AsyncMutex::new(None),
        }
    }

    /// Throttle that never waits
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured interval
    #[inline]
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be sent, then claim the slot
    pub async fn wait(&self) {
        let mut guard = self.last_tick.lock().await;
        if let Some(prev) = *guard {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }
}
