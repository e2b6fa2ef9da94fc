use chrono::NaiveDate;
use serde::Serialize;

use super::{latest_per_day, percent, period};
use crate::models::habit_log::{HabitLog, LogStatus};

/// Completed logs dated inside the ISO week containing `today`.
pub fn completed_in_week(logs: &[HabitLog], today: NaiveDate) -> i64 {
    latest_per_day(logs)
        .into_iter()
        .filter(|log| log.is_completed() && period::in_week_of(log.date, today))
        .count() as i64
}

/// Share of the week's habit-days completed, as a whole percentage capped at 100.
pub fn weekly_progress(logs: &[HabitLog], total_habits: i64, today: NaiveDate) -> i64 {
    if total_habits <= 0 {
        return 0;
    }
    percent(completed_in_week(logs, today), total_habits * 7).min(100)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub weekday: String,
    pub status: Option<LogStatus>,
}

/// Per-day status for a single habit across the week containing `today`.
pub fn week_breakdown(logs: &[HabitLog], today: NaiveDate) -> Vec<WeekDay> {
    let resolved = latest_per_day(logs);
    period::week_days(today)
        .map(|date| WeekDay {
            date,
            weekday: date.format("%a").to_string(),
            status: resolved
                .iter()
                .find(|log| log.date == date)
                .map(|log| log.status),
        })
        .collect()
}
