use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use super::server_today;
use crate::auth::middleware::Session;
use crate::error::{AppError, AppResult};
use crate::models::habit_log::{
    ActivityQuery, CalendarQuery, HabitLog, LogQuery, UpsertLogRequest,
};
use crate::realtime::Change;
use crate::repository::{LogFilter, LogRepository};
use crate::stats::calendar::{self, ActivityDay, MonthCalendar, ACTIVITY_WINDOW_DAYS};
use crate::stats::period;
use crate::AppState;

fn filter_from_query(query: LogQuery) -> AppResult<LogFilter> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::Validation(
                "start_date must not be after end_date".into(),
            ));
        }
    }

    Ok(LogFilter {
        habit_id: query.habit_id,
        from: query.start_date,
        to: query.end_date,
        status: query.status,
    })
}

fn resolve_month(raw: Option<&str>, today: NaiveDate) -> AppResult<NaiveDate> {
    match raw {
        None => Ok(period::month_start(today)),
        Some(raw) => period::parse_month(raw)
            .ok_or_else(|| AppError::Validation("month must be formatted as yyyy-MM".into())),
    }
}

async fn ensure_habit_owned(state: &AppState, user_id: Uuid, habit_id: Uuid) -> AppResult<()> {
    let owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM habits WHERE id = $1 AND user_id = $2)",
    )
    .bind(habit_id)
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    if owned {
        Ok(())
    } else {
        Err(AppError::NotFound("Habit not found".into()))
    }
}

/// Set the status of one habit on one day. A second write for the same day
/// replaces the first.
pub async fn upsert_log(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<UpsertLogRequest>,
) -> AppResult<Json<HabitLog>> {
    let date = body
        .validate_date(server_today())
        .map_err(AppError::Validation)?;

    ensure_habit_owned(&state, session.user_id, body.habit_id).await?;

    let log = sqlx::query_as::<_, HabitLog>(
        r#"
        INSERT INTO habit_logs (id, habit_id, user_id, log_date, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (habit_id, user_id, log_date)
        DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.habit_id)
    .bind(session.user_id)
    .bind(date)
    .bind(body.status)
    .fetch_one(&state.db)
    .await?;

    tracing::debug!(
        user_id = %session.user_id,
        habit_id = %log.habit_id,
        date = %log.date,
        status = ?log.status,
        "Habit log upserted"
    );
    state.feed.publish(
        session.user_id,
        Change::LogUpserted {
            habit_id: log.habit_id,
            log_id: log.id,
            date: log.date,
            status: log.status,
        },
    );

    Ok(Json(log))
}

pub async fn list_logs(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<HabitLog>>> {
    let filter = filter_from_query(query)?;
    let logs = state.store().fetch_logs(session.user_id, &filter).await?;
    Ok(Json(logs))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<MonthCalendar>> {
    let month = resolve_month(query.month.as_deref(), server_today())?;

    let filter = LogFilter {
        from: Some(period::month_start(month)),
        to: Some(period::month_end(month)),
        ..Default::default()
    }
    .habit(query.habit_id);
    let logs = state.store().fetch_logs(session.user_id, &filter).await?;

    Ok(Json(calendar::month_calendar(&logs, month)))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityDay>>> {
    let today = server_today();

    let filter = LogFilter {
        from: Some(today - Duration::days(ACTIVITY_WINDOW_DAYS - 1)),
        ..LogFilter::through(today)
    }
    .habit(query.habit_id);
    let logs = state.store().fetch_logs(session.user_id, &filter).await?;

    Ok(Json(calendar::activity_heatmap(
        &logs,
        today,
        ACTIVITY_WINDOW_DAYS,
    )))
}
