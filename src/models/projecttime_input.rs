use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProjecttimeInput {
    pub workday_id: Uuid,
    /// Falls back to the default project when absent.
    pub project_id: Option<Uuid>,
    pub time_spent_minutes: i64,
    pub note: Option<String>,
}

/// Response for project time mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjecttimeMutationResponse {
    pub success: bool,
    pub message: Option<String>,
    pub projecttime_id: Option<Uuid>,
}
