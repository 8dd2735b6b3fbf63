use axum::{
    extract::{Path, State},
    Json,
};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    accounting::{apply_default_invariant_on_write, refuse_delete_if_default, DeleteOutcome, WriteMode},
    extractors::{require_project_manager, CurrentEmployee},
    models::{validate_project, CreateProjectInput, Project, ProjectMutationResponse, UpdateProjectInput},
    AppError, AppResult, AppState,
};

// Cache the project list with 60-second TTL
static PROJECTS_CACHE: Lazy<Cache<&'static str, Vec<Project>>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(60))
        .build()
});

async fn invalidate_projects_cache() {
    PROJECTS_CACHE.invalidate(&"all").await;
}

/// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "List of projects", body = Vec<Project>)
    ),
    tag = "projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    _current: CurrentEmployee,
) -> AppResult<Json<Vec<Project>>> {
    if let Some(cached) = PROJECTS_CACHE.get(&"all").await {
        return Ok(Json(cached));
    }

    let projects = state.store.list_projects().await?;
    PROJECTS_CACHE.insert("all", projects.clone()).await;
    Ok(Json(projects))
}

/// GET /api/projects/{id}
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Project not found")
    ),
    tag = "projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    _current: CurrentEmployee,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    state
        .store
        .find_project(project_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))
}

/// POST /api/projects - Flagging the new project default moves the flag off every other project
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectInput,
    responses(
        (status = 200, description = "Project created", body = ProjectMutationResponse),
        (status = 403, description = "Missing Admin or ProjectManager role"),
        (status = 422, description = "Invalid project")
    ),
    tag = "projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Json(input): Json<CreateProjectInput>,
) -> AppResult<Json<ProjectMutationResponse>> {
    require_project_manager(&current.roles)?;

    let project = input.into_project();
    validate_project(&project).map_err(AppError::Validation)?;

    apply_default_invariant_on_write(state.store.as_ref(), &project, WriteMode::Create).await?;
    invalidate_projects_cache().await;

    tracing::info!(project_id = %project.project_id, is_default = project.is_default, "Project created");
    Ok(Json(ProjectMutationResponse {
        success: true,
        message: Some("Project created".to_string()),
        project_id: Some(project.project_id),
    }))
}

/// PATCH /api/projects/{id}
#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = UpdateProjectInput,
    responses(
        (status = 200, description = "Project updated", body = ProjectMutationResponse),
        (status = 403, description = "Missing Admin or ProjectManager role"),
        (status = 404, description = "Project not found"),
        (status = 422, description = "Invalid project")
    ),
    tag = "projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(project_id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> AppResult<Json<ProjectMutationResponse>> {
    require_project_manager(&current.roles)?;

    let existing = state
        .store
        .find_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;
    let updated = input.merged_into(&existing);
    validate_project(&updated).map_err(AppError::Validation)?;

    if !apply_default_invariant_on_write(state.store.as_ref(), &updated, WriteMode::Update).await? {
        return Err(AppError::NotFound(format!("Project {} not found", project_id)));
    }
    invalidate_projects_cache().await;

    Ok(Json(ProjectMutationResponse {
        success: true,
        message: Some("Project updated".to_string()),
        project_id: Some(project_id),
    }))
}

/// DELETE /api/projects/{id} - The default project cannot be deleted
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted", body = ProjectMutationResponse),
        (status = 403, description = "Missing Admin or ProjectManager role"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Project is the default or still has booked time")
    ),
    tag = "projects",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<ProjectMutationResponse>> {
    require_project_manager(&current.roles)?;

    match refuse_delete_if_default(state.store.as_ref(), project_id).await? {
        DeleteOutcome::Deleted => {
            invalidate_projects_cache().await;
            Ok(Json(ProjectMutationResponse {
                success: true,
                message: Some("Project deleted".to_string()),
                project_id: Some(project_id),
            }))
        }
        DeleteOutcome::NotFound => Err(AppError::NotFound(format!("Project {} not found", project_id))),
        DeleteOutcome::IsDefault => Err(AppError::Conflict(
            "The default project cannot be deleted".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Roles;
    use crate::handlers::test_support;

    const MANAGER: Roles = Roles {
        is_admin: false,
        is_project_manager: true,
    };

    fn input(name: &str, is_default: bool) -> CreateProjectInput {
        CreateProjectInput {
            name: name.to_string(),
            description: None,
            response_object: "ticket".to_string(),
            default_response_text: None,
            is_default: Some(is_default),
        }
    }

    #[tokio::test]
    async fn plain_employees_cannot_manage_projects() {
        let (state, _store) = test_support::state();
        let current = test_support::employee(&state, "oid-plain", Roles::default()).await;

        let result = create_project(State(state), current, Json(input("Nope", false))).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn default_flag_follows_the_last_writer_and_blocks_delete() {
        let (state, _store) = test_support::state();
        let current = test_support::employee(&state, "oid-manager", MANAGER).await;

        let Json(first) = create_project(State(state.clone()), current.clone(), Json(input("First", true)))
            .await
            .unwrap();
        let Json(second) = create_project(State(state.clone()), current.clone(), Json(input("Second", true)))
            .await
            .unwrap();
        let first_id = first.project_id.unwrap();
        let second_id = second.project_id.unwrap();

        let default = state.store.find_default_project().await.unwrap().unwrap();
        assert_eq!(default.project_id, second_id);

        let refused = delete_project(State(state.clone()), current.clone(), Path(second_id)).await;
        assert!(matches!(refused, Err(AppError::Conflict(_))));

        update_project(
            State(state.clone()),
            current.clone(),
            Path(first_id),
            Json(UpdateProjectInput {
                is_default: Some(true),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        delete_project(State(state.clone()), current, Path(second_id))
            .await
            .unwrap();

        let remaining = state.store.list_projects().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_default);
        assert_eq!(remaining[0].project_id, first_id);
    }

    #[tokio::test]
    async fn empty_names_are_rejected() {
        let (state, _store) = test_support::state();
        let current = test_support::employee(&state, "oid-validate", MANAGER).await;

        let result = create_project(State(state), current, Json(input("  ", false))).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
