use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token-bucket limiter for outbound provider calls.
///
/// Holds up to `capacity` tokens; one token is added every `refill_interval`.
/// `acquire` waits until a token is available. Waiters are served in FIFO order.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Option<Mutex<Bucket>>,
    capacity: u32,
    refill_interval: Duration,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl RateLimiter {
    /// A zero `capacity` or zero `refill_interval` disables limiting.
    #[must_use]
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        let bucket = (capacity > 0 && !refill_interval.is_zero()).then(|| {
            Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            })
        });
        Self {
            bucket,
            capacity,
            refill_interval,
        }
    }

    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(0, Duration::ZERO)
    }

    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.bucket.is_none()
    }

    /// Wait for and consume one token.
    pub async fn acquire(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };
        let mut bucket = bucket.lock().await;
        loop {
            self.refill(&mut bucket);
            if bucket.tokens > 0 {
                bucket.tokens -= 1;
                return;
            }
            let next = bucket.last_refill + self.refill_interval;
            tracing::trace!("rate limiter exhausted, waiting for refill");
            tokio::time::sleep_until(next).await;
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let elapsed = bucket.last_refill.elapsed();
        let interval_nanos = self.refill_interval.as_nanos().max(1);
        let earned = u32::try_from(elapsed.as_nanos() / interval_nanos).unwrap_or(u32::MAX);
        if earned == 0 {
            return;
        }
        bucket.tokens = bucket.tokens.saturating_add(earned).min(self.capacity);
        if bucket.tokens == self.capacity {
            bucket.last_refill = Instant::now();
        } else {
            bucket.last_refill += self.refill_interval * earned;
        }
    }
}
