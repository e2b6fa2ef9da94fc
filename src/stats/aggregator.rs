use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::achievements::{self, Achievement, AchievementInputs};
use super::trend::StatTrends;
use super::{latest_per_day, period, streak, weekly};
use crate::models::habit_log::HabitLog;
use crate::repository::{LogFilter, LogRepository, RepoError};

/// Trends compare against the same day one week earlier.
const TREND_PERIOD_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error(transparent)]
    Fetch(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatValues {
    pub total_habits: i64,
    pub completed_today: i64,
    pub weekly_progress: i64,
    pub current_streak: i64,
}

impl StatValues {
    pub fn compute(logs: &[HabitLog], total_habits: i64, today: NaiveDate) -> Self {
        let completed_today = latest_per_day(logs)
            .into_iter()
            .filter(|log| log.is_completed() && log.date == today)
            .count() as i64;

        Self {
            total_habits,
            completed_today,
            weekly_progress: weekly::weekly_progress(logs, total_habits, today),
            current_streak: streak::current_streak(logs, today) as i64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub as_of: NaiveDate,
    #[serde(flatten)]
    pub values: StatValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<StatTrends>,
}

impl StatsSnapshot {
    /// `previous_total_habits` is the habit count as of the end of the previous week.
    pub fn compute(
        logs: &[HabitLog],
        total_habits: i64,
        previous_total_habits: i64,
        today: NaiveDate,
    ) -> Self {
        let values = StatValues::compute(logs, total_habits, today);
        let previous = StatValues::compute(logs, previous_total_habits, previous_day(today));

        Self {
            as_of: today,
            values,
            trends: Some(StatTrends::between(&values, &previous)),
        }
    }
}

fn previous_day(today: NaiveDate) -> NaiveDate {
    today - Duration::days(TREND_PERIOD_DAYS)
}

/// Fetch everything the dashboard needs in parallel and reduce it to one snapshot.
pub async fn load_snapshot<R: LogRepository>(
    repo: &R,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<StatsSnapshot, StatsError> {
    let previous_week_end = period::week_end(previous_day(today));
    let history = LogFilter::through(today);

    let (total_habits, previous_total_habits, logs) = tokio::try_join!(
        repo.count_habits(user_id, None),
        repo.count_habits(user_id, Some(previous_week_end)),
        repo.fetch_logs(user_id, &history),
    )?;

    tracing::debug!(
        user_id = %user_id,
        logs = logs.len(),
        total_habits,
        previous_total_habits,
        "Computing stats snapshot"
    );

    Ok(StatsSnapshot::compute(
        &logs,
        total_habits,
        previous_total_habits,
        today,
    ))
}

pub async fn load_achievements<R: LogRepository>(
    repo: &R,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<Achievement>, StatsError> {
    let history = LogFilter::through(today);
    let (total_habits, logs) = tokio::try_join!(
        repo.count_habits(user_id, None),
        repo.fetch_logs(user_id, &history),
    )?;

    let inputs = AchievementInputs::from_logs(&logs, total_habits, today);
    Ok(achievements::evaluate(&achievements::CATALOG, &inputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::habit_log::LogStatus;
    use crate::repository::memory::MemoryRepository;
    use crate::stats::fixtures::*;

    // Wednesday
    fn today() -> NaiveDate {
        day(2024, 5, 15)
    }

    fn repo_with(habits: &[(Uuid, NaiveDate)], logs: Vec<HabitLog>) -> MemoryRepository {
        MemoryRepository {
            logs,
            habits: habits.to_vec(),
            fail: false,
        }
    }

    #[test]
    fn test_zero_habits_snapshot() {
        let snapshot = StatsSnapshot::compute(&[], 0, 0, today());
        assert_eq!(snapshot.values, StatValues::default());
        assert_eq!(
            snapshot.trends,
            Some(StatTrends {
                total_habits: 0,
                completed_today: 0,
                weekly_progress: 0,
                current_streak: 0,
            })
        );
    }

    #[test]
    fn test_snapshot_values() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut logs = completed_run(a, today(), 3);
        logs.push(log(b, today(), LogStatus::Partial));

        let snapshot = StatsSnapshot::compute(&logs, 2, 0, today());
        assert_eq!(
            snapshot.values,
            StatValues {
                total_habits: 2,
                completed_today: 1,
                weekly_progress: 21,
                current_streak: 3,
            }
        );
    }

    #[test]
    fn test_trends_against_previous_week() {
        let habit = Uuid::new_v4();
        // Seven-day run ending a week ago, then today only
        let mut logs = completed_run(habit, today() - Duration::days(7), 7);
        logs.push(log(habit, today(), LogStatus::Completed));

        let snapshot = StatsSnapshot::compute(&logs, 2, 1, today());
        let trends = snapshot.trends.unwrap();
        assert_eq!(trends.total_habits, 100);
        assert_eq!(trends.completed_today, 0);
        assert_eq!(trends.current_streak, -86);
    }

    #[tokio::test]
    async fn test_load_snapshot_uses_history() {
        let habit = Uuid::new_v4();
        let user = Uuid::nil();
        let mut logs = completed_run(habit, today(), 10);
        logs.push(log(habit, today() + Duration::days(1), LogStatus::Completed));
        let repo = repo_with(&[(habit, day(2024, 1, 1))], logs);

        let snapshot = load_snapshot(&repo, user, today()).await.unwrap();
        assert_eq!(snapshot.values.current_streak, 10);
        assert_eq!(snapshot.values.completed_today, 1);
        // Mon-Wed of this week
        assert_eq!(snapshot.values.weekly_progress, 43);
        assert_eq!(snapshot.as_of, today());
    }

    #[tokio::test]
    async fn test_previous_habit_count_excludes_new_habits() {
        let (old, new) = (Uuid::new_v4(), Uuid::new_v4());
        let repo = repo_with(&[(old, day(2024, 1, 1)), (new, today())], Vec::new());

        let snapshot = load_snapshot(&repo, Uuid::nil(), today()).await.unwrap();
        assert_eq!(snapshot.values.total_habits, 2);
        assert_eq!(snapshot.trends.unwrap().total_habits, 100);
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_error() {
        let repo = MemoryRepository {
            fail: true,
            ..Default::default()
        };
        let err = load_snapshot(&repo, Uuid::nil(), today()).await.unwrap_err();
        assert!(matches!(err, StatsError::Fetch(RepoError::Fetch { what: "habit logs", .. })));
        assert!(load_achievements(&repo, Uuid::nil(), today()).await.is_err());
    }

    #[tokio::test]
    async fn test_load_achievements() {
        let habit = Uuid::new_v4();
        let repo = repo_with(&[(habit, day(2024, 1, 1))], completed_run(habit, today(), 30));

        let achievements = load_achievements(&repo, Uuid::nil(), today()).await.unwrap();
        let unlocked: Vec<&str> = achievements
            .iter()
            .filter(|a| a.unlocked)
            .map(|a| a.id)
            .collect();
        assert_eq!(unlocked, vec!["getting_started", "perfect_week", "consistency_king"]);
    }
}
