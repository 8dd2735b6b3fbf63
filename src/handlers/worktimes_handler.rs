use axum::{
    extract::{Path, State},
    Json,
};
use chrono::TimeDelta;
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

use super::owned_workday;
use crate::{
    accounting::overlaps,
    extractors::CurrentEmployee,
    models::{
        duration, CreateWorktimeInput, UpdateWorktimeInput, WorktimeInterval, WorktimeMutationResponse,
    },
    store::RecordStore,
    AppError, AppResult, AppState,
};

fn break_from_minutes(minutes: Option<i64>) -> AppResult<Option<TimeDelta>> {
    minutes
        .map(|m| {
            duration::from_minutes(m)
                .ok_or_else(|| AppError::Validation(format!("break of {} minutes is out of range", m)))
        })
        .transpose()
}

/// Interval invariants first, then the overlap check against the rest of the day.
async fn check_before_write(store: &dyn RecordStore, candidate: &WorktimeInterval) -> AppResult<()> {
    candidate.validate()?;

    let existing = store.list_worktimes(&[candidate.workday_id]).await?;
    if overlaps(candidate, &existing) {
        counter!("worktime_overlap_rejections_total").increment(1);
        tracing::info!(
            workday_id = %candidate.workday_id,
            worktime_id = %candidate.worktime_id,
            "Rejected overlapping interval"
        );
        return Err(AppError::Validation(
            "Interval overlaps an existing interval of the same day".to_string(),
        ));
    }
    Ok(())
}

/// Loads an interval whose workday belongs to the caller.
async fn owned_worktime(
    state: &AppState,
    current: &CurrentEmployee,
    worktime_id: Uuid,
) -> AppResult<WorktimeInterval> {
    let worktime = state
        .store
        .find_worktime(worktime_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Worktime {} not found", worktime_id)))?;
    owned_workday(state.store.as_ref(), &current.employee, worktime.workday_id)
        .await
        .map_err(|_| AppError::NotFound(format!("Worktime {} not found", worktime_id)))?;
    Ok(worktime)
}

/// POST /api/worktimes
#[utoipa::path(
    post,
    path = "/api/worktimes",
    request_body = CreateWorktimeInput,
    responses(
        (status = 200, description = "Interval recorded", body = WorktimeMutationResponse),
        (status = 404, description = "Workday not found"),
        (status = 422, description = "Invalid or overlapping interval")
    ),
    tag = "worktimes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_worktime(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Json(input): Json<CreateWorktimeInput>,
) -> AppResult<Json<WorktimeMutationResponse>> {
    owned_workday(state.store.as_ref(), &current.employee, input.workday_id).await?;

    let worktime = WorktimeInterval {
        worktime_id: Uuid::new_v4(),
        workday_id: input.workday_id,
        start_time: input.start_time,
        end_time: input.end_time,
        break_time: break_from_minutes(input.break_minutes)?,
    };
    check_before_write(state.store.as_ref(), &worktime).await?;
    state.store.insert_worktime(&worktime).await?;

    tracing::debug!(worktime_id = %worktime.worktime_id, workday_id = %worktime.workday_id, "Interval recorded");
    Ok(Json(WorktimeMutationResponse {
        success: true,
        message: Some("Worktime created".to_string()),
        worktime_id: Some(worktime.worktime_id),
    }))
}

/// PATCH /api/worktimes/{id} - Missing fields keep their stored value
#[utoipa::path(
    patch,
    path = "/api/worktimes/{id}",
    params(
        ("id" = Uuid, Path, description = "Worktime ID")
    ),
    request_body = UpdateWorktimeInput,
    responses(
        (status = 200, description = "Interval updated", body = WorktimeMutationResponse),
        (status = 404, description = "Worktime not found"),
        (status = 422, description = "Invalid or overlapping interval")
    ),
    tag = "worktimes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_worktime(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(worktime_id): Path<Uuid>,
    Json(input): Json<UpdateWorktimeInput>,
) -> AppResult<Json<WorktimeMutationResponse>> {
    let existing = owned_worktime(&state, &current, worktime_id).await?;

    let updated = WorktimeInterval {
        start_time: input.start_time.unwrap_or(existing.start_time),
        end_time: input.end_time.or(existing.end_time),
        break_time: match input.break_minutes {
            Some(_) => break_from_minutes(input.break_minutes)?,
            None => existing.break_time,
        },
        ..existing
    };
    check_before_write(state.store.as_ref(), &updated).await?;

    if !state.store.update_worktime(&updated).await? {
        return Err(AppError::NotFound(format!("Worktime {} not found", worktime_id)));
    }

    Ok(Json(WorktimeMutationResponse {
        success: true,
        message: Some("Worktime updated".to_string()),
        worktime_id: Some(worktime_id),
    }))
}

/// DELETE /api/worktimes/{id}
#[utoipa::path(
    delete,
    path = "/api/worktimes/{id}",
    params(
        ("id" = Uuid, Path, description = "Worktime ID")
    ),
    responses(
        (status = 200, description = "Interval deleted", body = WorktimeMutationResponse),
        (status = 404, description = "Worktime not found")
    ),
    tag = "worktimes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_worktime(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(worktime_id): Path<Uuid>,
) -> AppResult<Json<WorktimeMutationResponse>> {
    owned_worktime(&state, &current, worktime_id).await?;
    if !state.store.delete_worktime(worktime_id).await? {
        return Err(AppError::NotFound(format!("Worktime {} not found", worktime_id)));
    }

    Ok(Json(WorktimeMutationResponse {
        success: true,
        message: Some("Worktime deleted".to_string()),
        worktime_id: Some(worktime_id),
    }))
}
