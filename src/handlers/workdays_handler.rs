use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{owned_workday, DateRangeQuery};
use crate::{
    accounting::{daily_overtime, total_worked},
    extractors::CurrentEmployee,
    models::{
        CreateWorkdayInput, ProjectTimeAllocation, UpdateWorkdayInput, Workday, WorkdayMutationResponse,
        WorkdayView, WorktimeInterval, WorktimeTotalResponse,
    },
    store::RecordStore,
    AppError, AppResult, AppState,
};

fn group_by_workday<T>(rows: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(row);
    }
    grouped
}

async fn views(store: &dyn RecordStore, workdays: Vec<Workday>) -> AppResult<Vec<WorkdayView>> {
    let ids: Vec<Uuid> = workdays.iter().map(|w| w.workday_id).collect();
    let mut worktimes = group_by_workday(store.list_worktimes(&ids).await?, |w: &WorktimeInterval| w.workday_id);
    let mut projecttimes =
        group_by_workday(store.list_projecttimes(&ids).await?, |p: &ProjectTimeAllocation| p.workday_id);

    Ok(workdays
        .into_iter()
        .map(|workday| {
            let mut day_worktimes = worktimes.remove(&workday.workday_id).unwrap_or_default();
            day_worktimes.sort_by_key(|w| w.start_time);
            WorkdayView {
                worktimes: day_worktimes,
                projecttimes: projecttimes.remove(&workday.workday_id).unwrap_or_default(),
                workday,
            }
        })
        .collect())
}

async fn ensure_date_free(store: &dyn RecordStore, workday: &Workday) -> AppResult<()> {
    match store.find_workday_by_date(workday.employee_id, workday.date).await? {
        Some(existing) if existing.workday_id != workday.workday_id => Err(AppError::Conflict(format!(
            "A workday for {} already exists",
            workday.date
        ))),
        _ => Ok(()),
    }
}

/// GET /api/workdays?from=&to= - Workdays of the caller with intervals and allocations
#[utoipa::path(
    get,
    path = "/api/workdays",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Workdays ordered by date", body = Vec<WorkdayView>)
    ),
    tag = "workdays",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_workdays(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<WorkdayView>>> {
    let workdays = state
        .store
        .list_workdays(current.employee.employee_id, query.range()?)
        .await?;
    Ok(Json(views(state.store.as_ref(), workdays).await?))
}

/// GET /api/workdays/{id}
#[utoipa::path(
    get,
    path = "/api/workdays/{id}",
    params(
        ("id" = Uuid, Path, description = "Workday ID")
    ),
    responses(
        (status = 200, description = "Workday", body = WorkdayView),
        (status = 404, description = "Workday not found")
    ),
    tag = "workdays",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_workday(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(workday_id): Path<Uuid>,
) -> AppResult<Json<WorkdayView>> {
    let workday = owned_workday(state.store.as_ref(), &current.employee, workday_id).await?;
    let mut found = views(state.store.as_ref(), vec![workday]).await?;
    found
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Workday {} not found", workday_id)))
}

/// POST /api/workdays
#[utoipa::path(
    post,
    path = "/api/workdays",
    request_body = CreateWorkdayInput,
    responses(
        (status = 200, description = "Workday created", body = WorkdayMutationResponse),
        (status = 409, description = "A workday already exists on that date")
    ),
    tag = "workdays",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_workday(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Json(input): Json<CreateWorkdayInput>,
) -> AppResult<Json<WorkdayMutationResponse>> {
    let workday = Workday {
        workday_id: Uuid::new_v4(),
        employee_id: current.employee.employee_id,
        date: input.date,
        day_type: input.day_type,
    };

    ensure_date_free(state.store.as_ref(), &workday).await?;
    state.store.insert_workday(&workday).await?;

    tracing::info!(workday_id = %workday.workday_id, date = %workday.date, day_type = %workday.day_type, "Workday created");
    Ok(Json(WorkdayMutationResponse {
        success: true,
        message: Some("Workday created".to_string()),
        workday_id: Some(workday.workday_id),
    }))
}

/// PATCH /api/workdays/{id}
#[utoipa::path(
    patch,
    path = "/api/workdays/{id}",
    params(
        ("id" = Uuid, Path, description = "Workday ID")
    ),
    request_body = UpdateWorkdayInput,
    responses(
        (status = 200, description = "Workday updated", body = WorkdayMutationResponse),
        (status = 404, description = "Workday not found"),
        (status = 409, description = "A workday already exists on the new date")
    ),
    tag = "workdays",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_workday(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(workday_id): Path<Uuid>,
    Json(input): Json<UpdateWorkdayInput>,
) -> AppResult<Json<WorkdayMutationResponse>> {
    let existing = owned_workday(state.store.as_ref(), &current.employee, workday_id).await?;
    let updated = Workday {
        date: input.date.unwrap_or(existing.date),
        day_type: input.day_type.unwrap_or(existing.day_type),
        ..existing.clone()
    };

    if updated.date != existing.date {
        ensure_date_free(state.store.as_ref(), &updated).await?;
    }
    if !state.store.update_workday(&updated).await? {
        return Err(AppError::NotFound(format!("Workday {} not found", workday_id)));
    }

    Ok(Json(WorkdayMutationResponse {
        success: true,
        message: Some("Workday updated".to_string()),
        workday_id: Some(workday_id),
    }))
}

/// DELETE /api/workdays/{id} - Removes the workday with its intervals and allocations
#[utoipa::path(
    delete,
    path = "/api/workdays/{id}",
    params(
        ("id" = Uuid, Path, description = "Workday ID")
    ),
    responses(
        (status = 200, description = "Workday deleted", body = WorkdayMutationResponse),
        (status = 404, description = "Workday not found")
    ),
    tag = "workdays",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_workday(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(workday_id): Path<Uuid>,
) -> AppResult<Json<WorkdayMutationResponse>> {
    owned_workday(state.store.as_ref(), &current.employee, workday_id).await?;
    if !state.store.delete_workday(workday_id).await? {
        return Err(AppError::NotFound(format!("Workday {} not found", workday_id)));
    }

    tracing::info!(workday_id = %workday_id, "Workday deleted");
    Ok(Json(WorkdayMutationResponse {
        success: true,
        message: Some("Workday deleted".to_string()),
        workday_id: Some(workday_id),
    }))
}

/// GET /api/workdays/{id}/worktime - Worked minutes and overtime of one day
#[utoipa::path(
    get,
    path = "/api/workdays/{id}/worktime",
    params(
        ("id" = Uuid, Path, description = "Workday ID")
    ),
    responses(
        (status = 200, description = "Worked time of the day", body = WorktimeTotalResponse),
        (status = 404, description = "Workday not found")
    ),
    tag = "workdays",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_workday_worktime(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(workday_id): Path<Uuid>,
) -> AppResult<Json<WorktimeTotalResponse>> {
    let workday = owned_workday(state.store.as_ref(), &current.employee, workday_id).await?;
    let worktimes = state.store.list_worktimes(&[workday_id]).await?;

    Ok(Json(WorktimeTotalResponse {
        workday_id,
        total_worked_minutes: total_worked(&worktimes).num_minutes(),
        overtime_hours: daily_overtime(&workday, &worktimes, current.employee.daily_working_hours),
    }))
}
