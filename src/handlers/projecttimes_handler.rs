use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use super::owned_workday;
use crate::{
    extractors::CurrentEmployee,
    models::{duration, CreateProjecttimeInput, ProjectTimeAllocation, ProjecttimeMutationResponse},
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProjecttimesQuery {
    /// Restrict to one workday; all of the caller's allocations otherwise.
    pub workday_id: Option<Uuid>,
}

/// GET /api/projecttimes?workday_id=
#[utoipa::path(
    get,
    path = "/api/projecttimes",
    params(ProjecttimesQuery),
    responses(
        (status = 200, description = "Project time allocations", body = Vec<ProjectTimeAllocation>),
        (status = 404, description = "Workday not found")
    ),
    tag = "projecttimes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_projecttimes(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Query(query): Query<ProjecttimesQuery>,
) -> AppResult<Json<Vec<ProjectTimeAllocation>>> {
    let workday_ids = match query.workday_id {
        Some(workday_id) => {
            owned_workday(state.store.as_ref(), &current.employee, workday_id).await?;
            vec![workday_id]
        }
        None => state
            .store
            .list_workdays(current.employee.employee_id, None)
            .await?
            .into_iter()
            .map(|w| w.workday_id)
            .collect(),
    };

    Ok(Json(state.store.list_projecttimes(&workday_ids).await?))
}

/// POST /api/projecttimes - Books on the default project when no project is given
#[utoipa::path(
    post,
    path = "/api/projecttimes",
    request_body = CreateProjecttimeInput,
    responses(
        (status = 200, description = "Allocation recorded", body = ProjecttimeMutationResponse),
        (status = 404, description = "Workday or project not found"),
        (status = 422, description = "Negative duration or no default project")
    ),
    tag = "projecttimes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_projecttime(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Json(input): Json<CreateProjecttimeInput>,
) -> AppResult<Json<ProjecttimeMutationResponse>> {
    owned_workday(state.store.as_ref(), &current.employee, input.workday_id).await?;

    let time_spent = duration::from_minutes(input.time_spent_minutes)
        .filter(|d| *d >= chrono::TimeDelta::zero())
        .ok_or_else(|| AppError::Validation("time_spent_minutes must not be negative".to_string()))?;

    let project = match input.project_id {
        Some(project_id) => state
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?,
        None => state
            .store
            .find_default_project()
            .await?
            .ok_or_else(|| AppError::Validation("No project given and no default project is set".to_string()))?,
    };

    let allocation = ProjectTimeAllocation {
        projecttime_id: Uuid::new_v4(),
        workday_id: input.workday_id,
        project_id: project.project_id,
        time_spent,
        note: input.note,
    };
    state.store.insert_projecttime(&allocation).await?;

    tracing::debug!(
        projecttime_id = %allocation.projecttime_id,
        project_id = %allocation.project_id,
        workday_id = %allocation.workday_id,
        "Project time recorded"
    );
    Ok(Json(ProjecttimeMutationResponse {
        success: true,
        message: Some("Project time created".to_string()),
        projecttime_id: Some(allocation.projecttime_id),
    }))
}

/// DELETE /api/projecttimes/{id}
#[utoipa::path(
    delete,
    path = "/api/projecttimes/{id}",
    params(
        ("id" = Uuid, Path, description = "Project time ID")
    ),
    responses(
        (status = 200, description = "Allocation deleted", body = ProjecttimeMutationResponse),
        (status = 404, description = "Allocation not found")
    ),
    tag = "projecttimes",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_projecttime(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(projecttime_id): Path<Uuid>,
) -> AppResult<Json<ProjecttimeMutationResponse>> {
    let not_found = || AppError::NotFound(format!("Project time {} not found", projecttime_id));

    let allocation = state
        .store
        .find_projecttime(projecttime_id)
        .await?
        .ok_or_else(not_found)?;
    owned_workday(state.store.as_ref(), &current.employee, allocation.workday_id)
        .await
        .map_err(|_| not_found())?;

    if !state.store.delete_projecttime(projecttime_id).await? {
        return Err(not_found());
    }

    Ok(Json(ProjecttimeMutationResponse {
        success: true,
        message: Some("Project time deleted".to_string()),
        projecttime_id: Some(projecttime_id),
    }))
}
