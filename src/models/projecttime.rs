use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::duration;

/// Time spent on one project during one workday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectTimeAllocation {
    pub projecttime_id: Uuid,
    pub workday_id: Uuid,
    pub project_id: Uuid,
    #[serde(rename = "time_spent_minutes", with = "duration")]
    #[schema(value_type = i64)]
    pub time_spent: TimeDelta,
    pub note: Option<String>,
}
