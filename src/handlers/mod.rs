pub mod employee_handler;
pub mod health;
pub mod metrics;
pub mod projects_handler;
pub mod projecttimes_handler;
pub mod workdays_handler;
pub mod worktimes_handler;

pub use health::health_check;
pub use metrics::{detached_metrics, metrics_handler, setup_metrics_recorder, MetricsState};

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    models::{Employee, Workday},
    store::{DateRange, RecordStore},
    AppError, AppResult,
};

/// Optional inclusive date window. A missing bound is open.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRangeQuery {
    pub fn range(&self) -> AppResult<Option<DateRange>> {
        if self.from.is_none() && self.to.is_none() {
            return Ok(None);
        }
        let from = self.from.or(NaiveDate::from_ymd_opt(1, 1, 1));
        let to = self.to.or(NaiveDate::from_ymd_opt(9999, 12, 31));
        let (Some(from), Some(to)) = (from, to) else {
            return Err(AppError::Internal("date bounds out of range".to_string()));
        };
        if from > to {
            return Err(AppError::BadRequest(format!(
                "from ({}) must not be after to ({})",
                from, to
            )));
        }
        Ok(Some(DateRange::new(from, to)))
    }
}

/// Loads a workday of `employee`. Someone else's workday is reported as missing.
pub(crate) async fn owned_workday(
    store: &dyn RecordStore,
    employee: &Employee,
    workday_id: Uuid,
) -> AppResult<Workday> {
    store
        .find_workday(workday_id)
        .await?
        .filter(|w| w.employee_id == employee.employee_id)
        .ok_or_else(|| AppError::NotFound(format!("Workday {} not found", workday_id)))
}
