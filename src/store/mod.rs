//! Storage port for the record store and its adapters.
//!
//! The engine codes against [`RecordStore`]; `postgres` is the production adapter and
//! `in_memory` backs tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Employee, EmployeeSettings, Project, ProjectTimeAllocation, Workday, WorktimeInterval};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let conflict = match &err {
            sqlx::Error::RowNotFound => return StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
                Some(db.message().to_string())
            }
            _ => None,
        };

        match conflict {
            Some(message) => StoreError::Conflict(message),
            None => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// January 1st through December 31st. `None` for years chrono cannot represent.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            from: NaiveDate::from_ymd_opt(year, 1, 1)?,
            to: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_employee_by_subject(&self, subject_id: &str) -> StoreResult<Option<Employee>>;
    async fn find_employee(&self, employee_id: Uuid) -> StoreResult<Option<Employee>>;
    /// Fails with [`StoreError::Conflict`] when the subject id is already taken.
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()>;
    /// Stamps `last_seen` and, when given, replaces the display name.
    async fn touch_employee(
        &self,
        employee_id: Uuid,
        name: Option<&str>,
        last_seen: DateTime<Utc>,
    ) -> StoreResult<bool>;
    async fn update_employee_settings(
        &self,
        employee_id: Uuid,
        settings: &EmployeeSettings,
    ) -> StoreResult<bool>;

    async fn find_workday(&self, workday_id: Uuid) -> StoreResult<Option<Workday>>;
    async fn find_workday_by_date(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<Workday>>;
    /// Ordered by date. `None` returns every workday of the employee.
    async fn list_workdays(
        &self,
        employee_id: Uuid,
        range: Option<DateRange>,
    ) -> StoreResult<Vec<Workday>>;
    /// Fails with [`StoreError::Conflict`] when the employee already has a workday on that date.
    async fn insert_workday(&self, workday: &Workday) -> StoreResult<()>;
    async fn update_workday(&self, workday: &Workday) -> StoreResult<bool>;
    /// Removes the workday together with its intervals and allocations.
    async fn delete_workday(&self, workday_id: Uuid) -> StoreResult<bool>;

    /// Ordered by workday, then start time.
    async fn list_worktimes(&self, workday_ids: &[Uuid]) -> StoreResult<Vec<WorktimeInterval>>;
    async fn find_worktime(&self, worktime_id: Uuid) -> StoreResult<Option<WorktimeInterval>>;
    async fn insert_worktime(&self, worktime: &WorktimeInterval) -> StoreResult<()>;
    async fn update_worktime(&self, worktime: &WorktimeInterval) -> StoreResult<bool>;
    async fn delete_worktime(&self, worktime_id: Uuid) -> StoreResult<bool>;

    async fn list_projects(&self) -> StoreResult<Vec<Project>>;
    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<Project>>;
    async fn find_default_project(&self) -> StoreResult<Option<Project>>;
    /// Deletes only when the project is not flagged default at the time of the write.
    async fn delete_project_unless_default(&self, project_id: Uuid) -> StoreResult<bool>;
    async fn begin_project_tx(&self) -> StoreResult<Box<dyn ProjectTx>>;

    async fn list_projecttimes(&self, workday_ids: &[Uuid]) -> StoreResult<Vec<ProjectTimeAllocation>>;
    async fn find_projecttime(&self, projecttime_id: Uuid) -> StoreResult<Option<ProjectTimeAllocation>>;
    async fn insert_projecttime(&self, projecttime: &ProjectTimeAllocation) -> StoreResult<()>;
    async fn delete_projecttime(&self, projecttime_id: Uuid) -> StoreResult<bool>;
}

/// One atomic unit of project writes. Dropping it without [`ProjectTx::commit`] discards every step.
#[async_trait]
pub trait ProjectTx: Send {
    async fn insert_project(&mut self, project: &Project) -> StoreResult<()>;
    async fn update_project(&mut self, project: &Project) -> StoreResult<bool>;
    /// Unconditionally clears `is_default` on every project. Returns the number of rows touched.
    async fn clear_default_flags(&mut self) -> StoreResult<u64>;
    async fn set_default_flag(&mut self, project_id: Uuid) -> StoreResult<bool>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_range_is_inclusive() {
        let range = DateRange::year(2024).unwrap();
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }
}
