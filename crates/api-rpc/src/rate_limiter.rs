//! Rate Limiter (Token Bucket Algorithm)
//!
//! Bounds how fast customers can join each queue through the RPC boundary.
//! Every queue id gets its own bucket, so a flood against one queue never
//! throttles joins elsewhere.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Tracked buckets before idle (full) ones are swept
const SWEEP_THRESHOLD: usize = 1024;

/// Bucket parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum burst size
    pub burst: u32,
    /// Tokens added per second
    pub rate_per_sec: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 200,
            rate_per_sec: 100,
        }
    }
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: f64::from(config.burst),
            last_refill: now,
        }
    }

    fn refill(&mut self, config: &RateLimitConfig, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * f64::from(config.rate_per_sec))
            .min(f64::from(config.burst));
        self.last_refill = now;
    }

    fn is_full(&self, config: &RateLimitConfig) -> bool {
        self.tokens >= f64::from(config.burst)
    }
}

/// Token buckets keyed by caller-chosen scope (the queue id for joins)
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Create a limiter; every key starts with a full bucket
    ///
    /// # Example
    /// Allow 100 requests/sec per key with burst of 200:
    /// `RateLimiter::new(RateLimitConfig { burst: 200, rate_per_sec: 100 })`
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Consume one token from `key`'s bucket; false when the caller must back off
    pub fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if buckets.len() >= SWEEP_THRESHOLD && !buckets.contains_key(key) {
            // A refilled bucket behaves exactly like a missing one
            buckets.retain(|_, bucket| {
                bucket.refill(&self.config, now);
                !bucket.is_full(&self.config)
            });
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::full(&self.config, now));
        bucket.refill(&self.config, now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whole tokens currently available to `key` (for monitoring)
    pub fn remaining(&self, key: &str) -> u32 {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets
            .get(key)
            .map_or(self.config.burst, |bucket| bucket.tokens.floor() as u32)
    }

    /// Number of keys with a tracked bucket
    pub fn tracked(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};

    fn limiter(burst: u32, rate_per_sec: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            burst,
            rate_per_sec,
        })
    }

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let limiter = limiter(10, 1);

        // Should allow 10 requests
        for _ in 0..10 {
            assert!(limiter.check("q-1"));
        }

        // 11th should be denied
        assert!(!limiter.check("q-1"));
        assert_eq!(limiter.remaining("q-1"), 0);
    }

    #[test]
    fn test_keys_have_independent_buckets() {
        let limiter = limiter(2, 1);
        assert!(limiter.check("busy"));
        assert!(limiter.check("busy"));
        assert!(!limiter.check("busy"));

        assert!(limiter.check("quiet"));
        assert_eq!(limiter.remaining("quiet"), 1);
        assert_eq!(limiter.remaining("unseen"), 2);
    }

    #[tokio::test]
    async fn test_rate_limiter_refills() {
        let limiter = limiter(5, 10); // 10 tokens/sec

        // Consume all tokens
        for _ in 0..5 {
            assert!(limiter.check("q-1"));
        }
        assert!(!limiter.check("q-1"));

        sleep(Duration::from_millis(300)).await;

        // ~3 tokens back
        assert!(limiter.check("q-1"));
    }

    #[tokio::test]
    async fn test_idle_buckets_are_swept() {
        let limiter = limiter(1, 1000);
        for i in 0..SWEEP_THRESHOLD {
            assert!(limiter.check(&format!("q-{}", i)));
        }
        assert_eq!(limiter.tracked(), SWEEP_THRESHOLD);

        // 1000 tokens/sec refills a single-token bucket within a millisecond
        sleep(Duration::from_millis(20)).await;
        assert!(limiter.check("fresh"));
        assert_eq!(limiter.tracked(), 1);
    }

    #[tokio::test]
    async fn test_rate_limiter_concurrent() {
        let limiter = Arc::new(limiter(100, 1));

        // Spawn 10 concurrent tasks, each trying 20 requests
        let mut handles = vec![];
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                (0..20).filter(|_| limiter.check("q-1")).count()
            }));
        }

        let mut total_allowed = 0;
        for handle in handles {
            total_allowed += handle.await.unwrap();
        }

        // Total requests = 200, the burst allows 100 (plus at most a trickle of refill)
        assert!(
            (100..=102).contains(&total_allowed),
            "Expected about 100 allowed, got {}",
            total_allowed
        );
    }
}
