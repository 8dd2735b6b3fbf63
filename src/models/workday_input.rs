use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{DayType, ProjectTimeAllocation, Workday, WorktimeInterval};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWorkdayInput {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub day_type: DayType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateWorkdayInput {
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub day_type: Option<DayType>,
}

/// A workday with its intervals (ordered by start time) and project allocations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkdayView {
    #[serde(flatten)]
    pub workday: Workday,
    pub worktimes: Vec<WorktimeInterval>,
    pub projecttimes: Vec<ProjectTimeAllocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorktimeTotalResponse {
    pub workday_id: Uuid,
    pub total_worked_minutes: i64,
    pub overtime_hours: f64,
}

/// Response for workday mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkdayMutationResponse {
    pub success: bool,
    pub message: Option<String>,
    pub workday_id: Option<Uuid>,
}
