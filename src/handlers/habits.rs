use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::server_today;
use crate::auth::middleware::Session;
use crate::error::{AppError, AppResult};
use crate::models::habit::{
    CreateHabitRequest, Habit, HabitWithStatus, UpdateHabitRequest, DEFAULT_FREQUENCY,
};
use crate::models::habit_log::{HabitLog, LogStatus};
use crate::realtime::Change;
use crate::repository::{LogFilter, LogRepository};
use crate::stats::latest_per_day;
use crate::AppState;

pub(crate) async fn find_owned_habit(
    state: &AppState,
    user_id: Uuid,
    habit_id: Uuid,
) -> AppResult<Habit> {
    sqlx::query_as::<_, Habit>("SELECT * FROM habits WHERE id = $1 AND user_id = $2")
        .bind(habit_id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Habit not found".into()))
}

/// Pair each habit with its resolved status for today.
fn with_today_status(habits: Vec<Habit>, todays_logs: &[HabitLog]) -> Vec<HabitWithStatus> {
    let statuses: HashMap<Uuid, LogStatus> = latest_per_day(todays_logs)
        .into_iter()
        .map(|log| (log.habit_id, log.status))
        .collect();

    habits
        .into_iter()
        .map(|habit| {
            let today_status = statuses.get(&habit.id).copied();
            HabitWithStatus {
                habit,
                today_status,
                is_complete: today_status == Some(LogStatus::Completed),
            }
        })
        .collect()
}

pub async fn list_habits(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<Vec<HabitWithStatus>>> {
    let today = server_today();

    let habits = sqlx::query_as::<_, Habit>(
        r#"
        SELECT * FROM habits
        WHERE user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(session.user_id)
    .fetch_all(&state.db)
    .await?;

    let filter = LogFilter {
        from: Some(today),
        to: Some(today),
        ..Default::default()
    };
    let todays_logs = state.store().fetch_logs(session.user_id, &filter).await?;

    Ok(Json(with_today_status(habits, &todays_logs)))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<Habit>> {
    let habit = find_owned_habit(&state, session.user_id, habit_id).await?;
    Ok(Json(habit))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateHabitRequest>,
) -> AppResult<Json<Habit>> {
    body.validate()?;
    let name = body
        .trimmed_name()
        .ok_or_else(|| AppError::Validation("Habit name is required".into()))?;

    let habit = sqlx::query_as::<_, Habit>(
        r#"
        INSERT INTO habits (id, user_id, name, description, frequency)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session.user_id)
    .bind(name)
    .bind(&body.description)
    .bind(body.frequency.unwrap_or(DEFAULT_FREQUENCY))
    .fetch_one(&state.db)
    .await?;

    tracing::debug!(user_id = %session.user_id, habit_id = %habit.id, "Habit created");
    state
        .feed
        .publish(session.user_id, Change::HabitCreated { habit_id: habit.id });

    Ok(Json(habit))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(habit_id): Path<Uuid>,
    Json(body): Json<UpdateHabitRequest>,
) -> AppResult<Json<Habit>> {
    body.validate()?;
    let name = body.name.as_deref().map(str::trim);
    if name == Some("") {
        return Err(AppError::Validation("Habit name is required".into()));
    }

    let habit = sqlx::query_as::<_, Habit>(
        r#"
        UPDATE habits SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            frequency = COALESCE($5, frequency),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(habit_id)
    .bind(session.user_id)
    .bind(name)
    .bind(&body.description)
    .bind(body.frequency)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Habit not found".into()))?;

    state
        .feed
        .publish(session.user_id, Change::HabitUpdated { habit_id });

    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    // Logs go with the habit through ON DELETE CASCADE
    let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
        .bind(habit_id)
        .bind(session.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Habit not found".into()));
    }

    tracing::debug!(user_id = %session.user_id, habit_id = %habit_id, "Habit deleted");
    state
        .feed
        .publish(session.user_id, Change::HabitDeleted { habit_id });

    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::{day, log, overwrite};
    use chrono::Utc;

    fn habit(name: &str) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.into(),
            description: None,
            frequency: DEFAULT_FREQUENCY,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_today_status_attached_per_habit() {
        let today = day(2024, 5, 15);
        let read = habit("Read");
        let walk = habit("Walk");
        let stretch = habit("Stretch");
        let logs = vec![
            log(read.id, today, LogStatus::Completed),
            log(walk.id, today, LogStatus::Partial),
        ];

        let listed = with_today_status(vec![read, walk, stretch], &logs);

        assert_eq!(listed[0].today_status, Some(LogStatus::Completed));
        assert!(listed[0].is_complete);
        assert_eq!(listed[1].today_status, Some(LogStatus::Partial));
        assert!(!listed[1].is_complete);
        assert_eq!(listed[2].today_status, None);
        assert!(!listed[2].is_complete);
    }

    #[test]
    fn test_today_status_uses_latest_write() {
        let today = day(2024, 5, 15);
        let read = habit("Read");
        let first = log(read.id, today, LogStatus::Completed);
        let logs = vec![first.clone(), overwrite(&first, LogStatus::Skipped)];

        let listed = with_today_status(vec![read], &logs);
        assert_eq!(listed[0].today_status, Some(LogStatus::Skipped));
        assert!(!listed[0].is_complete);
    }
}
