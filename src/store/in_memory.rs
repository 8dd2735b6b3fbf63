//! In-memory implementation of the record store port.
//!
//! Backs engine tests and local runs without a database. Mirrors the Postgres schema's
//! uniqueness rules so conflicts surface the same way. `set_offline` and `set_latency`
//! inject failures and slow calls.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use super::{DateRange, ProjectTx, RecordStore, StoreError, StoreResult};
use crate::models::{Employee, EmployeeSettings, Project, ProjectTimeAllocation, Workday, WorktimeInterval};

#[derive(Debug, Default)]
struct Tables {
    employees: Vec<Employee>,
    workdays: Vec<Workday>,
    worktimes: Vec<WorktimeInterval>,
    projects: Vec<Project>,
    projecttimes: Vec<ProjectTimeAllocation>,
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
    employee_inserts: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay applied before every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `insert_employee` calls that reached the table, successful or not.
    pub fn employee_insert_attempts(&self) -> usize {
        self.employee_inserts.load(Ordering::SeqCst)
    }

    pub async fn employee_count(&self) -> usize {
        self.tables.read().await.employees.len()
    }

    async fn ready(&self) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_employee_by_subject(&self, subject_id: &str) -> StoreResult<Option<Employee>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .iter()
            .find(|e| e.subject_id == subject_id)
            .cloned())
    }

    async fn find_employee(&self, employee_id: Uuid) -> StoreResult<Option<Employee>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .iter()
            .find(|e| e.employee_id == employee_id)
            .cloned())
    }

    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        self.ready().await?;
        self.employee_inserts.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.write().await;
        if tables
            .employees
            .iter()
            .any(|e| e.subject_id == employee.subject_id || e.employee_id == employee.employee_id)
        {
            return Err(StoreError::Conflict(format!(
                "employee for subject {} already exists",
                employee.subject_id
            )));
        }
        tables.employees.push(employee.clone());
        Ok(())
    }

    async fn touch_employee(
        &self,
        employee_id: Uuid,
        name: Option<&str>,
        last_seen: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        let Some(employee) = tables
            .employees
            .iter_mut()
            .find(|e| e.employee_id == employee_id)
        else {
            return Ok(false);
        };
        if let Some(name) = name {
            employee.name = name.to_string();
        }
        employee.last_seen = last_seen;
        Ok(true)
    }

    async fn update_employee_settings(
        &self,
        employee_id: Uuid,
        settings: &EmployeeSettings,
    ) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        match tables
            .employees
            .iter_mut()
            .find(|e| e.employee_id == employee_id)
        {
            Some(employee) => {
                employee.apply_settings(settings);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_workday(&self, workday_id: Uuid) -> StoreResult<Option<Workday>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .workdays
            .iter()
            .find(|w| w.workday_id == workday_id)
            .cloned())
    }

    async fn find_workday_by_date(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<Workday>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .workdays
            .iter()
            .find(|w| w.employee_id == employee_id && w.date == date)
            .cloned())
    }

    async fn list_workdays(
        &self,
        employee_id: Uuid,
        range: Option<DateRange>,
    ) -> StoreResult<Vec<Workday>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        let mut workdays: Vec<Workday> = tables
            .workdays
            .iter()
            .filter(|w| w.employee_id == employee_id)
            .filter(|w| range.map_or(true, |r| r.contains(w.date)))
            .cloned()
            .collect();
        workdays.sort_by_key(|w| w.date);
        Ok(workdays)
    }

    async fn insert_workday(&self, workday: &Workday) -> StoreResult<()> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        if tables
            .workdays
            .iter()
            .any(|w| w.employee_id == workday.employee_id && w.date == workday.date)
        {
            return Err(StoreError::Conflict(format!(
                "workday for {} already exists",
                workday.date
            )));
        }
        tables.workdays.push(workday.clone());
        Ok(())
    }

    async fn update_workday(&self, workday: &Workday) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        if tables.workdays.iter().any(|w| {
            w.workday_id != workday.workday_id
                && w.employee_id == workday.employee_id
                && w.date == workday.date
        }) {
            return Err(StoreError::Conflict(format!(
                "workday for {} already exists",
                workday.date
            )));
        }
        match tables
            .workdays
            .iter_mut()
            .find(|w| w.workday_id == workday.workday_id)
        {
            Some(existing) => {
                *existing = workday.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_workday(&self, workday_id: Uuid) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        let before = tables.workdays.len();
        tables.workdays.retain(|w| w.workday_id != workday_id);
        if tables.workdays.len() == before {
            return Ok(false);
        }
        tables.worktimes.retain(|w| w.workday_id != workday_id);
        tables.projecttimes.retain(|p| p.workday_id != workday_id);
        Ok(true)
    }

    async fn list_worktimes(&self, workday_ids: &[Uuid]) -> StoreResult<Vec<WorktimeInterval>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        let mut worktimes: Vec<WorktimeInterval> = tables
            .worktimes
            .iter()
            .filter(|w| workday_ids.contains(&w.workday_id))
            .cloned()
            .collect();
        worktimes.sort_by_key(|w| (w.workday_id, w.start_time));
        Ok(worktimes)
    }

    async fn find_worktime(&self, worktime_id: Uuid) -> StoreResult<Option<WorktimeInterval>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .worktimes
            .iter()
            .find(|w| w.worktime_id == worktime_id)
            .cloned())
    }

    async fn insert_worktime(&self, worktime: &WorktimeInterval) -> StoreResult<()> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        if !tables
            .workdays
            .iter()
            .any(|w| w.workday_id == worktime.workday_id)
        {
            return Err(StoreError::Conflict(format!(
                "workday {} does not exist",
                worktime.workday_id
            )));
        }
        tables.worktimes.push(worktime.clone());
        Ok(())
    }

    async fn update_worktime(&self, worktime: &WorktimeInterval) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        match tables
            .worktimes
            .iter_mut()
            .find(|w| w.worktime_id == worktime.worktime_id)
        {
            Some(existing) => {
                *existing = worktime.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_worktime(&self, worktime_id: Uuid) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        let before = tables.worktimes.len();
        tables.worktimes.retain(|w| w.worktime_id != worktime_id);
        Ok(tables.worktimes.len() != before)
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        let mut projects = tables.projects.clone();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<Project>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .find(|p| p.project_id == project_id)
            .cloned())
    }

    async fn find_default_project(&self) -> StoreResult<Option<Project>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.is_default).cloned())
    }

    async fn delete_project_unless_default(&self, project_id: Uuid) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        if tables
            .projecttimes
            .iter()
            .any(|p| p.project_id == project_id)
        {
            return Err(StoreError::Conflict(format!(
                "project {} still has booked time",
                project_id
            )));
        }
        let before = tables.projects.len();
        tables
            .projects
            .retain(|p| p.project_id != project_id || p.is_default);
        Ok(tables.projects.len() != before)
    }

    async fn begin_project_tx(&self) -> StoreResult<Box<dyn ProjectTx>> {
        self.ready().await?;
        let guard = self.tables.clone().write_owned().await;
        let staged = guard.projects.clone();
        Ok(Box::new(InMemoryProjectTx { guard, staged }))
    }

    async fn list_projecttimes(&self, workday_ids: &[Uuid]) -> StoreResult<Vec<ProjectTimeAllocation>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .projecttimes
            .iter()
            .filter(|p| workday_ids.contains(&p.workday_id))
            .cloned()
            .collect())
    }

    async fn find_projecttime(&self, projecttime_id: Uuid) -> StoreResult<Option<ProjectTimeAllocation>> {
        self.ready().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .projecttimes
            .iter()
            .find(|p| p.projecttime_id == projecttime_id)
            .cloned())
    }

    async fn insert_projecttime(&self, projecttime: &ProjectTimeAllocation) -> StoreResult<()> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        if !tables
            .projects
            .iter()
            .any(|p| p.project_id == projecttime.project_id)
        {
            return Err(StoreError::Conflict(format!(
                "project {} does not exist",
                projecttime.project_id
            )));
        }
        tables.projecttimes.push(projecttime.clone());
        Ok(())
    }

    async fn delete_projecttime(&self, projecttime_id: Uuid) -> StoreResult<bool> {
        self.ready().await?;
        let mut tables = self.tables.write().await;
        let before = tables.projecttimes.len();
        tables
            .projecttimes
            .retain(|p| p.projecttime_id != projecttime_id);
        Ok(tables.projecttimes.len() != before)
    }
}

/// Holds the table lock for its whole lifetime; writes land in `staged` until commit.
struct InMemoryProjectTx {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Vec<Project>,
}

impl InMemoryProjectTx {
    fn default_conflict(&self, project_id: Uuid) -> StoreResult<()> {
        if self
            .staged
            .iter()
            .any(|p| p.is_default && p.project_id != project_id)
        {
            return Err(StoreError::Conflict(
                "another project is already the default".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectTx for InMemoryProjectTx {
    async fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        if self
            .staged
            .iter()
            .any(|p| p.project_id == project.project_id)
        {
            return Err(StoreError::Conflict(format!(
                "project {} already exists",
                project.project_id
            )));
        }
        if project.is_default {
            self.default_conflict(project.project_id)?;
        }
        self.staged.push(project.clone());
        Ok(())
    }

    async fn update_project(&mut self, project: &Project) -> StoreResult<bool> {
        if project.is_default {
            self.default_conflict(project.project_id)?;
        }
        match self
            .staged
            .iter_mut()
            .find(|p| p.project_id == project.project_id)
        {
            Some(existing) => {
                *existing = project.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_default_flags(&mut self) -> StoreResult<u64> {
        let mut touched = 0;
        for project in self.staged.iter_mut().filter(|p| p.is_default) {
            project.is_default = false;
            touched += 1;
        }
        Ok(touched)
    }

    async fn set_default_flag(&mut self, project_id: Uuid) -> StoreResult<bool> {
        self.default_conflict(project_id)?;
        match self
            .staged
            .iter_mut()
            .find(|p| p.project_id == project_id)
        {
            Some(project) => {
                project.is_default = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let InMemoryProjectTx { mut guard, staged } = *self;
        guard.projects = staged;
        Ok(())
    }
}
