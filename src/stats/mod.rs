//! Derived metrics over in-memory habit logs.
//!
//! Everything here is a pure function of its inputs plus an explicit `today`;
//! nothing touches the database or the clock. The aggregator is the only
//! piece that fetches, and it does so through [`crate::repository::LogRepository`].

pub mod achievements;
pub mod aggregator;
pub mod calendar;
pub mod habit;
pub mod period;
pub mod streak;
pub mod trend;
pub mod weekly;

use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::habit_log::HabitLog;

/// One log per (habit, date): the most recent write wins, later input breaking ties.
///
/// The store enforces this with a unique key, but calculators accept
/// arbitrary slices so they resolve duplicates themselves.
pub fn latest_per_day(logs: &[HabitLog]) -> Vec<&HabitLog> {
    let mut latest: HashMap<(Uuid, NaiveDate), &HabitLog> = HashMap::with_capacity(logs.len());
    for log in logs {
        latest
            .entry((log.habit_id, log.date))
            .and_modify(|current| {
                if log.updated_at >= current.updated_at {
                    *current = log;
                }
            })
            .or_insert(log);
    }
    latest.into_values().collect()
}

/// `round(100 * numerator / denominator)` with half-up rounding, 0 for an empty denominator.
pub fn percent(numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        return 0;
    }
    round_half_up(100.0 * numerator as f64 / denominator as f64)
}

pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::habit_log::LogStatus;

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(percent(2, 7), 29);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(0, 7), 0);
    }

    #[test]
    fn test_percent_zero_denominator() {
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn test_round_half_up_negative() {
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
    }

    #[test]
    fn test_latest_per_day_keeps_most_recent_write() {
        let habit = Uuid::new_v4();
        let first = log(habit, day(2024, 5, 1), LogStatus::Completed);
        let second = overwrite(&first, LogStatus::Skipped);
        let logs = vec![second.clone(), first];

        let resolved = latest_per_day(&logs);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, second.id);
    }

    #[test]
    fn test_latest_per_day_separates_habits() {
        let date = day(2024, 5, 1);
        let logs = vec![
            log(Uuid::new_v4(), date, LogStatus::Completed),
            log(Uuid::new_v4(), date, LogStatus::Partial),
        ];
        assert_eq!(latest_per_day(&logs).len(), 2);
    }
}
