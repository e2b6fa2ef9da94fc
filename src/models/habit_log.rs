use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::stats::period;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HabitLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "log_date")]
    pub date: NaiveDate,
    pub status: LogStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "log_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Completed,
    Partial,
    Skipped,
}

impl HabitLog {
    pub fn is_completed(&self) -> bool {
        self.status == LogStatus::Completed
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertLogRequest {
    pub habit_id: Uuid,
    /// `yyyy-MM-dd` or a full timestamp; any time of day is dropped.
    #[serde(default, deserialize_with = "period::deserialize_optional_day")]
    pub date: Option<NaiveDate>,
    pub status: LogStatus,
}

impl UpsertLogRequest {
    /// Resolve the target day, allowing at most one day of clock skew either way.
    pub fn validate_date(&self, server_today: NaiveDate) -> Result<NaiveDate, String> {
        let date = self.date.unwrap_or(server_today);
        let diff = (date - server_today).num_days().abs();
        if diff > 1 {
            return Err("date must be within ±1 day of today".into());
        }
        Ok(date)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub habit_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<LogStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    /// `yyyy-MM`, defaults to the current month.
    pub month: Option<String>,
    pub habit_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub habit_id: Option<Uuid>,
}
