use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DayType;

/// A maximal run of consecutive calendar days without regular attendance. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AbsenceStreak {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    /// Distinct day types in order of first appearance.
    pub day_types: Vec<DayType>,
    /// `day_types` joined as `"sick, vacation"`.
    pub absence_types: String,
    pub duration_in_days: u32,
}
