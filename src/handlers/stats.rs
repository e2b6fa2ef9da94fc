use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use super::habits::find_owned_habit;
use super::server_today;
use crate::auth::middleware::Session;
use crate::error::AppResult;
use crate::repository::{LogFilter, LogRepository};
use crate::stats::achievements::Achievement;
use crate::stats::aggregator::{self, StatsSnapshot};
use crate::stats::habit::{habit_stats, HabitStats};
use crate::AppState;

/// Dashboard snapshot. A failed fetch comes back as a transient 503 so the
/// client can keep showing what it already has.
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<StatsSnapshot>> {
    let snapshot =
        aggregator::load_snapshot(&state.store(), session.user_id, server_today()).await?;
    Ok(Json(snapshot))
}

pub async fn get_achievements(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<Vec<Achievement>>> {
    let achievements =
        aggregator::load_achievements(&state.store(), session.user_id, server_today()).await?;
    Ok(Json(achievements))
}

pub async fn get_habit_stats(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<HabitStats>> {
    let today = server_today();
    let habit = find_owned_habit(&state, session.user_id, habit_id).await?;

    let filter = LogFilter::through(today).habit(Some(habit.id));
    let logs = state.store().fetch_logs(session.user_id, &filter).await?;

    Ok(Json(habit_stats(&habit, &logs, today)))
}
