use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::weekly::{self, WeekDay};
use super::{latest_per_day, percent, streak};
use crate::models::habit::Habit;
use crate::models::habit_log::{HabitLog, LogStatus};

#[derive(Debug, Clone, Serialize)]
pub struct HabitStats {
    pub habit_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed: i64,
    pub total_logged: i64,
    /// Completed share of all logged days, as a whole percentage.
    pub completion_rate: i64,
    pub completed_this_week: i64,
    pub weekly_target: i32,
    /// Progress toward `weekly_target`, capped at 100.
    pub target_progress: i64,
    pub week: Vec<WeekDay>,
    pub today_status: Option<LogStatus>,
}

/// Stats for one habit. `logs` must already be restricted to that habit.
pub fn habit_stats(habit: &Habit, logs: &[HabitLog], today: NaiveDate) -> HabitStats {
    let resolved: Vec<&HabitLog> = latest_per_day(logs)
        .into_iter()
        .filter(|log| log.date <= today)
        .collect();
    let total_logged = resolved.len() as i64;
    let total_completed = resolved.iter().filter(|log| log.is_completed()).count() as i64;
    let completed_this_week = weekly::completed_in_week(logs, today);

    HabitStats {
        habit_id: habit.id,
        current_streak: streak::current_streak(logs, today),
        longest_streak: streak::longest_streak(logs, today),
        total_completed,
        total_logged,
        completion_rate: percent(total_completed, total_logged),
        completed_this_week,
        weekly_target: habit.frequency,
        target_progress: percent(completed_this_week, habit.frequency as i64).min(100),
        week: weekly::week_breakdown(logs, today),
        today_status: resolved
            .iter()
            .find(|log| log.date == today)
            .map(|log| log.status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::*;
    use chrono::{Duration, Utc};

    fn habit(frequency: i32) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: "Stretch".into(),
            description: None,
            frequency,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_logs() {
        let h = habit(3);
        let stats = habit_stats(&h, &[], day(2024, 5, 15));
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.today_status, None);
        assert_eq!(stats.week.len(), 7);
    }

    #[test]
    fn test_frequency_target_progress() {
        let h = habit(3);
        let today = day(2024, 5, 15);
        let logs = vec![
            log(h.id, day(2024, 5, 13), LogStatus::Completed),
            log(h.id, day(2024, 5, 14), LogStatus::Completed),
            log(h.id, today, LogStatus::Skipped),
            log(h.id, today - Duration::days(10), LogStatus::Partial),
        ];

        let stats = habit_stats(&h, &logs, today);
        assert_eq!(stats.completed_this_week, 2);
        assert_eq!(stats.target_progress, 67);
        assert_eq!(stats.total_completed, 2);
        assert_eq!(stats.total_logged, 4);
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.today_status, Some(LogStatus::Skipped));
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn test_target_progress_capped() {
        let h = habit(1);
        let today = day(2024, 5, 15);
        let logs = completed_run(h.id, today, 3);
        assert_eq!(habit_stats(&h, &logs, today).target_progress, 100);
    }
}
