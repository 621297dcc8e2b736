//! Rate limiting for translation provider calls
//!
//! A token bucket shared by every provider call in a run. Waiting for a
//! token is the only suspension point in the pipeline.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token bucket rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens in the bucket
    capacity: f64,
    /// Tokens added per second
    rate: f64,
    state: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Limiter allowing `qps` calls per second with a burst of one
    pub fn per_second(qps: f64) -> Self {
        Self::new(qps, 1)
    }

    /// Limiter with an explicit burst capacity
    pub fn new(qps: f64, capacity: usize) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            capacity,
            rate: qps.max(0.01),
            state: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Take a token if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.reserve().is_none()
    }

    /// Wait until a token is available, then take it
    pub async fn acquire(&self) {
        while let Some(wait) = self.reserve() {
            tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate limited");
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a token, or report how long until one is available
    fn reserve(&self) -> Option<Duration> {
        let mut bucket = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            None
        } else {
            let missing = 1.0 - bucket.tokens;
            Some(Duration::from_secs_f64(missing / self.rate))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_burst() {
        let limiter = RateLimiter::new(1.0, 3);

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_rate_limiter_refills() {
        let limiter = RateLimiter::per_second(50.0);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        std::thread::sleep(Duration::from_millis(25));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_non_positive_rate_is_clamped() {
        let limiter = RateLimiter::per_second(0.0);
        assert!(limiter.rate() > 0.0);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_token() {
        let limiter = RateLimiter::per_second(20.0);
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        // Two refills at 20/s need ~100ms
        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
