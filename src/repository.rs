//! Read access to habit logs, kept behind a trait so the stats pipeline can
//! run against any source.

use chrono::NaiveDate;
use std::future::Future;
use uuid::Uuid;

use crate::models::habit_log::{HabitLog, LogStatus};

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub habit_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<LogStatus>,
}

impl LogFilter {
    pub fn through(to: NaiveDate) -> Self {
        Self {
            to: Some(to),
            ..Default::default()
        }
    }

    pub fn habit(mut self, habit_id: Option<Uuid>) -> Self {
        self.habit_id = habit_id;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

pub trait LogRepository: Send + Sync {
    /// Logs owned by `user_id` that match `filter`, newest date first.
    fn fetch_logs(
        &self,
        user_id: Uuid,
        filter: &LogFilter,
    ) -> impl Future<Output = Result<Vec<HabitLog>, RepoError>> + Send;

    /// Habits owned by `user_id`, optionally only those created on or before a day.
    fn count_habits(
        &self,
        user_id: Uuid,
        created_through: Option<NaiveDate>,
    ) -> impl Future<Output = Result<i64, RepoError>> + Send;
}

#[cfg(test)]
pub mod memory {
    use super::*;

    /// In-memory source for exercising the stats pipeline.
    #[derive(Debug, Default)]
    pub struct MemoryRepository {
        pub logs: Vec<HabitLog>,
        /// Creation day of each habit.
        pub habits: Vec<(Uuid, NaiveDate)>,
        pub fail: bool,
    }

    fn matches(filter: &LogFilter, log: &HabitLog) -> bool {
        filter.habit_id.map_or(true, |id| log.habit_id == id)
            && filter.from.map_or(true, |from| log.date >= from)
            && filter.to.map_or(true, |to| log.date <= to)
            && filter.status.map_or(true, |status| log.status == status)
    }

    impl LogRepository for MemoryRepository {
        async fn fetch_logs(
            &self,
            user_id: Uuid,
            filter: &LogFilter,
        ) -> Result<Vec<HabitLog>, RepoError> {
            if self.fail {
                return Err(RepoError::Fetch {
                    what: "habit logs",
                    source: sqlx::Error::PoolTimedOut,
                });
            }
            let mut logs: Vec<HabitLog> = self
                .logs
                .iter()
                .filter(|log| log.user_id == user_id && matches(filter, log))
                .cloned()
                .collect();
            logs.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(logs)
        }

        async fn count_habits(
            &self,
            _user_id: Uuid,
            created_through: Option<NaiveDate>,
        ) -> Result<i64, RepoError> {
            Ok(self
                .habits
                .iter()
                .filter(|(_, created)| created_through.map_or(true, |day| *created <= day))
                .count() as i64)
        }
    }
}
