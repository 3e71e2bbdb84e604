//! Sliding-window throttling for the public authentication routes.
//!
//! Counters live in the `auth_rate_limits` table so every API replica sees
//! the same window.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use feedesk_core::{AppError, AppResult};

/// Repository port for rate limit persistence.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Records an attempt for the given key.
    ///
    /// Resets the counter when the stored window has elapsed and returns the
    /// attempt count inside the active window.
    async fn record_attempt(&self, key: &str, window_duration_seconds: i64)
    -> AppResult<AttemptInfo>;

    /// Removes entries whose window started before the cutoff.
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Information about the current rate limit window for a key.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    /// Number of attempts in the current window (including this one).
    pub attempt_count: i32,
    /// When the current window started.
    pub window_started_at: DateTime<Utc>,
}

/// One throttled route family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Key prefix, e.g. `sign_in`.
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

    /// Ten password sign-ins per fifteen minutes.
    #[must_use]
    pub fn sign_in() -> Self {
        Self::new("sign_in", 10, 15 * 60)
    }

    /// Twenty invitation token checks per hour.
    #[must_use]
    pub fn invitation_validation() -> Self {
        Self::new("invitation_validate", 20, 60 * 60)
    }

    /// Twenty signups per hour.
    #[must_use]
    pub fn signup() -> Self {
        Self::new("signup", 20, 60 * 60)
    }
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

    /// Records an attempt for `key` under `rule`.
    ///
    /// Returns `AppError::RateLimited` once the window holds more than
    /// `max_attempts` attempts. `key` is usually the client IP.
    pub async fn check_rate_limit(&self, rule: &RateLimitRule, key: &str) -> AppResult<()> {
        let composite_key = format!("{}:{key}", rule.category);
        let info = self
            .repository
            .record_attempt(&composite_key, rule.window_seconds)
            .await?;

        if info.attempt_count <= rule.max_attempts {
            return Ok(());
        }

        let wait_seconds = retry_after_seconds(rule, &info, Utc::now());
        tracing::debug!(
            category = %rule.category,
            attempts = info.attempt_count,
            wait_seconds,
            "rate limit exceeded"
        );

        Err(AppError::RateLimited(format!(
            "too many attempts, try again in {} minute(s)",
            wait_seconds.div_ceil(60).max(1)
        )))
    }

    /// Removes rate limit entries older than a day.
    pub async fn cleanup(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::hours(24);
        self.repository.cleanup_expired(cutoff).await
    }
}

/// Seconds until the window holding `info` closes.
fn retry_after_seconds(rule: &RateLimitRule, info: &AttemptInfo, now: DateTime<Utc>) -> u64 {
    let closes_at = info.window_started_at + chrono::Duration::seconds(rule.window_seconds);
    u64::try_from((closes_at - now).num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CountingRepository {
        counts: Mutex<HashMap<String, i32>>,
    }

    #[async_trait]
    impl RateLimitRepository for CountingRepository {
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
            let mut counts = self.counts.lock().await;
            let removed = counts.len() as u64;
            counts.clear();
            Ok(removed)
        }
    }

    #[tokio::test]
    async fn rejects_attempts_past_the_limit() {
        let service = RateLimitService::new(Arc::new(CountingRepository::default()));
        let rule = RateLimitRule::new("sign_in_test", 2, 60);

        assert!(service.check_rate_limit(&rule, "10.0.0.1").await.is_ok());
        assert!(service.check_rate_limit(&rule, "10.0.0.1").await.is_ok());
        assert!(matches!(
            service.check_rate_limit(&rule, "10.0.0.1").await,
            Err(AppError::RateLimited(_))
        ));
    }

    #[tokio::test]
    async fn keys_are_scoped_by_category_and_client() {
        let service = RateLimitService::new(Arc::new(CountingRepository::default()));
        let sign_in = RateLimitRule::new("sign_in", 1, 60);
        let signup = RateLimitRule::new("signup", 1, 60);

        assert!(service.check_rate_limit(&sign_in, "a").await.is_ok());
        assert!(service.check_rate_limit(&signup, "a").await.is_ok());
        assert!(service.check_rate_limit(&sign_in, "b").await.is_ok());
        assert!(service.check_rate_limit(&sign_in, "a").await.is_err());
    }

    #[test]
    fn retry_hint_counts_down_to_the_window_end() {
        let rule = RateLimitRule::sign_in();
        let started = Utc::now();
        let info = AttemptInfo {
            attempt_count: 11,
            window_started_at: started,
        };

        assert_eq!(retry_after_seconds(&rule, &info, started), 900);
        assert_eq!(
            retry_after_seconds(&rule, &info, started + chrono::Duration::seconds(899)),
            1
        );
        assert_eq!(
            retry_after_seconds(&rule, &info, started + chrono::Duration::hours(1)),
            0
        );
    }

    #[test]
    fn preset_rules_match_public_route_budgets() {
        assert_eq!(RateLimitRule::sign_in().max_attempts, 10);
        assert_eq!(RateLimitRule::sign_in().window_seconds, 900);
        assert_eq!(RateLimitRule::signup().window_seconds, 3600);
        assert_eq!(RateLimitRule::invitation_validation().max_attempts, 20);
    }
}
