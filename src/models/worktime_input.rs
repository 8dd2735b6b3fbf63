use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWorktimeInput {
    pub workday_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub break_minutes: Option<i64>,
}

/// Missing fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateWorktimeInput {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub break_minutes: Option<i64>,
}

/// Response for worktime mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorktimeMutationResponse {
    pub success: bool,
    pub message: Option<String>,
    pub worktime_id: Option<Uuid>,
}
