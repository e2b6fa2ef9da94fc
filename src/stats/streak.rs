use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::latest_per_day;
use crate::models::habit_log::HabitLog;

/// Whether each logged day up to `today` counts as completed.
///
/// A day counts when any habit's resolved log for it is `completed`.
fn completed_days(logs: &[HabitLog], today: NaiveDate) -> BTreeMap<NaiveDate, bool> {
    let mut days = BTreeMap::new();
    for log in latest_per_day(logs) {
        if log.date > today {
            continue;
        }
        *days.entry(log.date).or_insert(false) |= log.is_completed();
    }
    days
}

/// Consecutive completed days ending at `today`. Zero unless today itself is completed.
pub fn current_streak(logs: &[HabitLog], today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut expected = today;

    for (date, completed) in completed_days(logs, today).iter().rev() {
        if *date != expected || !completed {
            break;
        }
        streak += 1;
        expected = match expected.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }

    streak
}

/// Longest run of consecutive completed days on or before `today`.
pub fn longest_streak(logs: &[HabitLog], today: NaiveDate) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for (date, completed) in completed_days(logs, today) {
        if !completed {
            run = 0;
            prev = None;
            continue;
        }
        run = match prev {
            Some(p) if p.succ_opt() == Some(date) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }

    longest
}
