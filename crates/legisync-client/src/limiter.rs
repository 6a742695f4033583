//! Token-bucket rate limiting for the shared outbound request budget.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use legisync_core::{SyncError, SyncResult};

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared by every worker issuing outbound requests.
///
/// This is the single piece of mutable shared state in the client; all
/// blocking for capacity happens here, so concurrency elsewhere can never
/// push aggregate request volume past the budget.
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    /// Budget of `requests_per_hour` with `burst` tokens of headroom.
    pub fn new(requests_per_hour: u32, burst: u32) -> Self {
        let capacity = burst.max(1) as f64;
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_per_sec: requests_per_hour as f64 / 3600.0,
        }
    }

    /// Take one token, sleeping until one is available.
    ///
    /// Fails with `DeadlineExceeded` if the token cannot become available
    /// before `deadline`.
    pub async fn acquire(&self, deadline: Option<Instant>) -> SyncResult<()> {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(());
                }
                let deficit = 1.0 - state.tokens;
                Duration::from_secs_f64(deficit / self.refill_per_sec)
            };

            if let Some(deadline) = deadline {
                if Instant::now() + wait > deadline {
                    return Err(SyncError::DeadlineExceeded("rate budget token".to_string()));
                }
            }
            tokio::time::sleep(wait).await;
        }
    }
}
