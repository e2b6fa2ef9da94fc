use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::habit_log::HabitLog;
use crate::repository::{LogFilter, LogRepository, RepoError};

// Creation days are UTC calendar days, matching the server's notion of today
const COUNT_HABITS_SQL: &str = r#"
    SELECT COUNT(*) FROM habits
    WHERE user_id = $1
      AND ($2::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date <= $2)
"#;

/// [`LogRepository`] backed by the `habit_logs` and `habits` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LogRepository for PgStore {
    async fn fetch_logs(&self, user_id: Uuid, filter: &LogFilter) -> Result<Vec<HabitLog>, RepoError> {
        sqlx::query_as::<_, HabitLog>(
            r#"
            SELECT * FROM habit_logs
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR habit_id = $2)
              AND ($3::date IS NULL OR log_date >= $3)
              AND ($4::date IS NULL OR log_date <= $4)
              AND ($5::log_status IS NULL OR status = $5)
            ORDER BY log_date DESC, updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.habit_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| RepoError::Fetch {
            what: "habit logs",
            source,
        })
    }

    async fn count_habits(
        &self,
        user_id: Uuid,
        created_through: Option<NaiveDate>,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(COUNT_HABITS_SQL)
        .bind(user_id)
        .bind(created_through)
        .fetch_one(&self.pool)
        .await
        .map_err(|source| RepoError::Fetch {
            what: "habit count",
            source,
        })
    }
}
