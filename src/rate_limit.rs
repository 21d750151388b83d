//! Throttling for `/ask`, the only route that spends model tokens.
//!
//! Page loads, static assets and health checks are never counted.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::config::ResilienceConfig;

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f32,
    refilled_at: Instant,
}

impl TokenBucket {
    fn try_take(&mut self, now: Instant, per_sec: f32, capacity: f32) -> bool {
        let elapsed = now.saturating_duration_since(self.refilled_at).as_secs_f32();
        self.tokens = (self.tokens + elapsed * per_sec).min(capacity);
        self.refilled_at = self.refilled_at.max(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token bucket shared by every question the server receives.
#[derive(Debug)]
pub struct AskRateLimiter {
    bucket: Mutex<TokenBucket>,
    questions_per_sec: f32,
    burst: f32,
}

impl AskRateLimiter {
    /// A full bucket holding `burst` questions, refilled at `questions_per_sec`.
    #[must_use]
    pub fn new(questions_per_sec: f32, burst: f32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket {
                tokens: burst,
                refilled_at: Instant::now(),
            }),
            questions_per_sec,
            burst,
        }
    }

    #[must_use]
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
    }

    /// Admit one question now.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Admit one question at `now`.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        self.bucket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_take(now, self.questions_per_sec, self.burst)
    }
}

/// Reject questions once the bucket is empty.
///
/// The 429 body has the same `{"error": ...}` shape as other `/ask` failures.
pub async fn limit_questions(
    State(limiter): State<Arc<AskRateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.try_acquire() {
        tracing::warn!(name: "ask.rate_limited", "Question rejected by rate limit");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "too many questions, try again shortly" })),
        )
            .into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_then_refill() {
        let limiter = AskRateLimiter::new(2.0, 5.0);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.try_acquire_at(start));
        }
        assert!(!limiter.try_acquire_at(start));

        // 600ms at 2/s refills 1.2 questions.
        let later = start + Duration::from_millis(600);
        assert!(limiter.try_acquire_at(later));
        assert!(!limiter.try_acquire_at(later));
    }

    #[test]
    fn test_refill_capped_at_burst() {
        let limiter = AskRateLimiter::new(10.0, 2.0);
        let later = Instant::now() + Duration::from_secs(60);

        assert!(limiter.try_acquire_at(later));
        assert!(limiter.try_acquire_at(later));
        assert!(!limiter.try_acquire_at(later));
    }

    #[test]
    fn test_earlier_instant_does_not_refill() {
        let limiter = AskRateLimiter::new(1.0, 1.0);
        let now = Instant::now() + Duration::from_secs(1);

        assert!(limiter.try_acquire_at(now));
        assert!(!limiter.try_acquire_at(now - Duration::from_millis(500)));
    }
}
