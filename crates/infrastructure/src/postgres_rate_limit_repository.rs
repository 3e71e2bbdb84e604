//! Rate limit counters shared by every API replica through `auth_rate_limits`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use feedesk_application::{AttemptInfo, RateLimitRepository};
use feedesk_core::AppResult;

use crate::database_error::internal;

/// PostgreSQL implementation of the rate limit repository port.
#[derive(Clone)]
pub struct PostgresRateLimitRepository {
    pool: PgPool,
}

impl PostgresRateLimitRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WindowRow {
    attempt_count: i32,
    window_started_at: DateTime<Utc>,
}

#[async_trait]
impl RateLimitRepository for PostgresRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo> {
        // A window older than the rule restarts at one attempt.
        let row = sqlx::query_as::<_, WindowRow>(
            r#"
            INSERT INTO auth_rate_limits AS current (key, window_started_at, attempt_count)
            VALUES ($1, now(), 1)
            ON CONFLICT (key) DO UPDATE
            SET
                attempt_count = CASE
                    WHEN current.window_started_at <= now() - make_interval(secs => $2)
                    THEN 1
                    ELSE current.attempt_count + 1
                END,
                window_started_at = CASE
                    WHEN current.window_started_at <= now() - make_interval(secs => $2)
                    THEN now()
                    ELSE current.window_started_at
                END
            RETURNING attempt_count, window_started_at
            "#,
        )
        .bind(key)
        .bind(window_duration_seconds as f64)
        .fetch_one(&self.pool)
        .await
        .map_err(internal("record rate limit attempt"))?;

        Ok(AttemptInfo {
            attempt_count: row.attempt_count,
            window_started_at: row.window_started_at,
        })
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let removed = sqlx::query("DELETE FROM auth_rate_limits WHERE window_started_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(internal("remove expired rate limit windows"))?
            .rows_affected();

        Ok(removed)
    }
}
