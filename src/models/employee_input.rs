use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Employee, RegionCode};

/// Partial settings update for the current employee. Missing fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateEmployeeSettingsInput {
    pub region: Option<RegionCode>,
    pub vacation_days_per_year: Option<i32>,
    pub daily_working_hours: Option<f64>,
    pub overtime_correction_hours: Option<f64>,
}

impl UpdateEmployeeSettingsInput {
    pub fn merged_into(&self, employee: &Employee) -> Employee {
        let mut updated = employee.clone();
        updated.region = self.region.unwrap_or(employee.region);
        updated.vacation_days_per_year = self
            .vacation_days_per_year
            .unwrap_or(employee.vacation_days_per_year);
        updated.daily_working_hours = self
            .daily_working_hours
            .unwrap_or(employee.daily_working_hours);
        updated.overtime_correction_hours = self
            .overtime_correction_hours
            .unwrap_or(employee.overtime_correction_hours);
        updated
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(days) = self.vacation_days_per_year {
            if days < 0 {
                return Err("vacation_days_per_year must not be negative".to_string());
            }
        }
        if let Some(hours) = self.daily_working_hours {
            if !(0.0..=24.0).contains(&hours) {
                return Err("daily_working_hours must be between 0 and 24".to_string());
            }
        }
        if let Some(correction) = self.overtime_correction_hours {
            if !correction.is_finite() {
                return Err("overtime_correction_hours must be a finite number".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: Employee,
    pub is_admin: bool,
    pub is_project_manager: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct YearCountResponse {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OvertimeResponse {
    /// Signed balance in hours, correction included.
    pub overtime_hours: f64,
    pub correction_hours: f64,
    pub workdays: usize,
}
