//! Fixed-window rate limiting for the authentication routes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redressa_core::{AppError, AppResult};

/// Configuration for a rate limit rule.
#[derive(Debug, Clone)]
pub struct RateLimitRule {
    /// The route category name (e.g., "login", "register").
    pub category: String,
    /// Maximum number of attempts allowed in the window.
    pub max_attempts: i32,
    /// Window duration in seconds.
    pub window_seconds: i64,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(category: impl Into<String>, max_attempts: i32, window_seconds: i64) -> Self {
        Self {
            category: category.into(),
            max_attempts,
            window_seconds,
        }
    }
}

/// Information about the current rate limit window for a key.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    /// Number of attempts in the current window (including this one).
    pub attempt_count: i32,
    /// When the current window started.
    pub window_started_at: DateTime<Utc>,
}

/// Repository port for rate limit persistence.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Records an attempt for the given key.
    ///
    /// Uses an UPSERT pattern: if the current window has expired, resets the
    /// counter. Returns the updated attempt count within the active window.
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo>;

    /// Removes expired entries older than the given cutoff.
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitRepository>) -> Self {
        Self { repository }
    }

    /// Checks whether the given key is within the rate limit.
    ///
    /// Records the attempt and returns `Ok(())` if allowed, or
    /// `Err(AppError::RateLimited)` if the limit has been exceeded. The key
    /// is typically a client IP address.
    pub async fn check_rate_limit(&self, rule: &RateLimitRule, key: &str) -> AppResult<()> {
        let composite_key = format!("{}:{key}", rule.category);
        let info = self
            .repository
            .record_attempt(&composite_key, rule.window_seconds)
            .await?;

        if info.attempt_count > rule.max_attempts {
            return Err(AppError::RateLimited(
                "too many requests, please try again later".to_owned(),
            ));
        }

        Ok(())
    }

    /// Removes expired rate limit entries. Intended for periodic cleanup.
    pub async fn cleanup(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::hours(24);
        self.repository.cleanup_expired(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use redressa_core::{AppError, AppResult};
    use tokio::sync::Mutex;

    use super::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};

    #[derive(Default)]
    struct FakeRateLimitRepository {
        counts: Mutex<HashMap<String, i32>>,
    }

    #[async_trait]
    impl RateLimitRepository for FakeRateLimitRepository {
        async fn record_attempt(
            &self,
            key: &str,
            _window_duration_seconds: i64,
        ) -> AppResult<AttemptInfo> {
            let mut counts = self.counts.lock().await;
            let count = counts.entry(key.to_owned()).or_insert(0);
            *count += 1;
            Ok(AttemptInfo {
                attempt_count: *count,
                window_started_at: Utc::now(),
            })
        }

        async fn cleanup_expired(&self, _before: DateTime<Utc>) -> AppResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn attempts_within_limit_are_allowed() -> AppResult<()> {
        let service = RateLimitService::new(Arc::new(FakeRateLimitRepository::default()));
        let rule = RateLimitRule::new("login", 3, 900);

        for _ in 0..3 {
            service.check_rate_limit(&rule, "203.0.113.9").await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn attempts_over_limit_are_rejected() -> AppResult<()> {
        let service = RateLimitService::new(Arc::new(FakeRateLimitRepository::default()));
        let rule = RateLimitRule::new("login", 2, 900);

        service.check_rate_limit(&rule, "203.0.113.9").await?;
        service.check_rate_limit(&rule, "203.0.113.9").await?;

        let outcome = service.check_rate_limit(&rule, "203.0.113.9").await;
        assert!(matches!(outcome, Err(AppError::RateLimited(_))));
        Ok(())
    }

    #[tokio::test]
    async fn keys_are_scoped_by_category() -> AppResult<()> {
        let service = RateLimitService::new(Arc::new(FakeRateLimitRepository::default()));
        let login = RateLimitRule::new("login", 1, 900);
        let register = RateLimitRule::new("register", 1, 900);

        service.check_rate_limit(&login, "203.0.113.9").await?;
        // Same client, different category: separate window.
        service.check_rate_limit(&register, "203.0.113.9").await?;
        Ok(())
    }
}
