use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{DateRange, ProjectTx, RecordStore, StoreError, StoreResult};
use crate::models::{
    Employee, EmployeeSettings, Project, ProjectTimeAllocation, Workday, WorktimeInterval,
};

const EMPLOYEE_COLUMNS: &str = r#"
    employee_id, subject_id, email, name, region,
    vacation_days_per_year, daily_working_hours, overtime_correction_hours, last_seen
"#;

const PROJECT_COLUMNS: &str = r#"
    project_id, name, description, response_object, default_response_text, is_default
"#;

fn decode_error(message: String) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(message.into()))
}

fn minutes(value: TimeDelta) -> StoreResult<i32> {
    i32::try_from(value.num_minutes())
        .map_err(|_| StoreError::Conflict(format!("{} minutes does not fit the column", value.num_minutes())))
}

#[derive(Debug, FromRow)]
struct EmployeeRow {
    employee_id: Uuid,
    subject_id: String,
    email: String,
    name: String,
    region: String,
    vacation_days_per_year: i32,
    daily_working_hours: f64,
    overtime_correction_hours: f64,
    last_seen: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            employee_id: row.employee_id,
            subject_id: row.subject_id,
            email: row.email,
            name: row.name,
            region: row.region.parse().map_err(decode_error)?,
            vacation_days_per_year: row.vacation_days_per_year,
            daily_working_hours: row.daily_working_hours,
            overtime_correction_hours: row.overtime_correction_hours,
            last_seen: row.last_seen,
        })
    }
}

#[derive(Debug, FromRow)]
struct WorkdayRow {
    workday_id: Uuid,
    employee_id: Uuid,
    date: NaiveDate,
    day_type: String,
}

impl TryFrom<WorkdayRow> for Workday {
    type Error = StoreError;

    fn try_from(row: WorkdayRow) -> Result<Self, Self::Error> {
        Ok(Workday {
            workday_id: row.workday_id,
            employee_id: row.employee_id,
            date: row.date,
            day_type: row.day_type.parse().map_err(decode_error)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct WorktimeRow {
    worktime_id: Uuid,
    workday_id: Uuid,
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    break_minutes: Option<i32>,
}

impl From<WorktimeRow> for WorktimeInterval {
    fn from(row: WorktimeRow) -> Self {
        WorktimeInterval {
            worktime_id: row.worktime_id,
            workday_id: row.workday_id,
            start_time: row.start_time,
            end_time: row.end_time,
            break_time: row.break_minutes.map(|m| TimeDelta::minutes(m.into())),
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    project_id: Uuid,
    name: String,
    description: String,
    response_object: String,
    default_response_text: String,
    is_default: bool,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            project_id: row.project_id,
            name: row.name,
            description: row.description,
            response_object: row.response_object,
            default_response_text: row.default_response_text,
            is_default: row.is_default,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjecttimeRow {
    projecttime_id: Uuid,
    workday_id: Uuid,
    project_id: Uuid,
    time_spent_minutes: i32,
    note: Option<String>,
}

impl From<ProjecttimeRow> for ProjectTimeAllocation {
    fn from(row: ProjecttimeRow) -> Self {
        ProjectTimeAllocation {
            projecttime_id: row.projecttime_id,
            workday_id: row.workday_id,
            project_id: row.project_id,
            time_spent: TimeDelta::minutes(row.time_spent_minutes.into()),
            note: row.note,
        }
    }
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_employee_by_subject(&self, subject_id: &str) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE subject_id = $1", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_employee(&self, employee_id: Uuid) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE employee_id = $1", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (
                employee_id, subject_id, email, name, region,
                vacation_days_per_year, daily_working_hours, overtime_correction_hours, last_seen
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(employee.employee_id)
        .bind(&employee.subject_id)
        .bind(&employee.email)
        .bind(&employee.name)
        .bind(employee.region.as_str())
        .bind(employee.vacation_days_per_year)
        .bind(employee.daily_working_hours)
        .bind(employee.overtime_correction_hours)
        .bind(employee.last_seen)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch_employee(
        &self,
        employee_id: Uuid,
        name: Option<&str>,
        last_seen: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = COALESCE($2, name), last_seen = $3
            WHERE employee_id = $1
            "#,
        )
        .bind(employee_id)
        .bind(name)
        .bind(last_seen)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_employee_settings(
        &self,
        employee_id: Uuid,
        settings: &EmployeeSettings,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET region = $2,
                vacation_days_per_year = $3,
                daily_working_hours = $4,
                overtime_correction_hours = $5
            WHERE employee_id = $1
            "#,
        )
        .bind(employee_id)
        .bind(settings.region.as_str())
        .bind(settings.vacation_days_per_year)
        .bind(settings.daily_working_hours)
        .bind(settings.overtime_correction_hours)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_workday(&self, workday_id: Uuid) -> StoreResult<Option<Workday>> {
        sqlx::query_as::<_, WorkdayRow>(
            "SELECT workday_id, employee_id, date, day_type FROM workdays WHERE workday_id = $1",
        )
        .bind(workday_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Workday::try_from)
        .transpose()
    }

    async fn find_workday_by_date(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<Workday>> {
        sqlx::query_as::<_, WorkdayRow>(
            r#"
            SELECT workday_id, employee_id, date, day_type
            FROM workdays
            WHERE employee_id = $1 AND date = $2
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?
        .map(Workday::try_from)
        .transpose()
    }

    async fn list_workdays(
        &self,
        employee_id: Uuid,
        range: Option<DateRange>,
    ) -> StoreResult<Vec<Workday>> {
        let rows = sqlx::query_as::<_, WorkdayRow>(
            r#"
            SELECT workday_id, employee_id, date, day_type
            FROM workdays
            WHERE employee_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date
            "#,
        )
        .bind(employee_id)
        .bind(range.map(|r| r.from))
        .bind(range.map(|r| r.to))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Workday::try_from).collect()
    }

    async fn insert_workday(&self, workday: &Workday) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workdays (workday_id, employee_id, date, day_type)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(workday.workday_id)
        .bind(workday.employee_id)
        .bind(workday.date)
        .bind(workday.day_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_workday(&self, workday: &Workday) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE workdays SET date = $2, day_type = $3 WHERE workday_id = $1",
        )
        .bind(workday.workday_id)
        .bind(workday.date)
        .bind(workday.day_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_workday(&self, workday_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM workdays WHERE workday_id = $1")
            .bind(workday_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_worktimes(&self, workday_ids: &[Uuid]) -> StoreResult<Vec<WorktimeInterval>> {
        let rows = sqlx::query_as::<_, WorktimeRow>(
            r#"
            SELECT worktime_id, workday_id, start_time, end_time, break_minutes
            FROM worktimes
            WHERE workday_id = ANY($1)
            ORDER BY workday_id, start_time
            "#,
        )
        .bind(workday_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WorktimeInterval::from).collect())
    }

    async fn find_worktime(&self, worktime_id: Uuid) -> StoreResult<Option<WorktimeInterval>> {
        let row = sqlx::query_as::<_, WorktimeRow>(
            r#"
            SELECT worktime_id, workday_id, start_time, end_time, break_minutes
            FROM worktimes
            WHERE worktime_id = $1
            "#,
        )
        .bind(worktime_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WorktimeInterval::from))
    }

    async fn insert_worktime(&self, worktime: &WorktimeInterval) -> StoreResult<()> {
        let break_minutes = worktime.break_time.map(minutes).transpose()?;
        sqlx::query(
            r#"
            INSERT INTO worktimes (worktime_id, workday_id, start_time, end_time, break_minutes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(worktime.worktime_id)
        .bind(worktime.workday_id)
        .bind(worktime.start_time)
        .bind(worktime.end_time)
        .bind(break_minutes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_worktime(&self, worktime: &WorktimeInterval) -> StoreResult<bool> {
        let break_minutes = worktime.break_time.map(minutes).transpose()?;
        let result = sqlx::query(
            r#"
            UPDATE worktimes
            SET start_time = $2, end_time = $3, break_minutes = $4
            WHERE worktime_id = $1
            "#,
        )
        .bind(worktime.worktime_id)
        .bind(worktime.start_time)
        .bind(worktime.end_time)
        .bind(break_minutes)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_worktime(&self, worktime_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM worktimes WHERE worktime_id = $1")
            .bind(worktime_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let sql = format!("SELECT {} FROM projects ORDER BY name", PROJECT_COLUMNS);
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE project_id = $1", PROJECT_COLUMNS);
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Project::from))
    }

    async fn find_default_project(&self) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE is_default", PROJECT_COLUMNS);
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Project::from))
    }

    async fn delete_project_unless_default(&self, project_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE project_id = $1 AND NOT is_default")
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn begin_project_tx(&self) -> StoreResult<Box<dyn ProjectTx>> {
        let mut tx = self.pool.begin().await?;
        // Serializes default swaps; plain reads still go through.
        sqlx::query("LOCK TABLE projects IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgProjectTx { tx }))
    }

    async fn list_projecttimes(&self, workday_ids: &[Uuid]) -> StoreResult<Vec<ProjectTimeAllocation>> {
        let rows = sqlx::query_as::<_, ProjecttimeRow>(
            r#"
            SELECT projecttime_id, workday_id, project_id, time_spent_minutes, note
            FROM projecttimes
            WHERE workday_id = ANY($1)
            "#,
        )
        .bind(workday_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProjectTimeAllocation::from).collect())
    }

    async fn find_projecttime(&self, projecttime_id: Uuid) -> StoreResult<Option<ProjectTimeAllocation>> {
        let row = sqlx::query_as::<_, ProjecttimeRow>(
            r#"
            SELECT projecttime_id, workday_id, project_id, time_spent_minutes, note
            FROM projecttimes
            WHERE projecttime_id = $1
            "#,
        )
        .bind(projecttime_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProjectTimeAllocation::from))
    }

    async fn insert_projecttime(&self, projecttime: &ProjectTimeAllocation) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projecttimes (projecttime_id, workday_id, project_id, time_spent_minutes, note)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(projecttime.projecttime_id)
        .bind(projecttime.workday_id)
        .bind(projecttime.project_id)
        .bind(minutes(projecttime.time_spent)?)
        .bind(&projecttime.note)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_projecttime(&self, projecttime_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projecttimes WHERE projecttime_id = $1")
            .bind(projecttime_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Rolls back on drop unless committed.
struct PgProjectTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProjectTx for PgProjectTx {
    async fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (project_id, name, description, response_object, default_response_text, is_default)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(project.project_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.response_object)
        .bind(&project.default_response_text)
        .bind(project.is_default)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_project(&mut self, project: &Project) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = $2,
                description = $3,
                response_object = $4,
                default_response_text = $5,
                is_default = $6
            WHERE project_id = $1
            "#,
        )
        .bind(project.project_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.response_object)
        .bind(&project.default_response_text)
        .bind(project.is_default)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_default_flags(&mut self) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE projects SET is_default = FALSE WHERE is_default")
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_default_flag(&mut self, project_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE projects SET is_default = TRUE WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, run_migrations};
    use crate::models::DayType;

    async fn store() -> PgRecordStore {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = create_pool(&url, 2).await.expect("connect");
        run_migrations(&pool).await.expect("migrate");
        PgRecordStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "needs a Postgres database in DATABASE_URL"]
    async fn duplicate_subject_is_a_conflict() {
        let store = store().await;
        let subject = format!("test-{}", Uuid::new_v4());
        let first = Employee::first_seen(&subject, None, None, Utc::now());
        let second = Employee::first_seen(&subject, None, None, Utc::now());

        store.insert_employee(&first).await.unwrap();
        let result = store.insert_employee(&second).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        let loaded = store.find_employee_by_subject(&subject).await.unwrap().unwrap();
        assert_eq!(loaded.employee_id, first.employee_id);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres database in DATABASE_URL"]
    async fn workday_and_intervals_survive_a_round_trip() {
        let store = store().await;
        let employee = Employee::first_seen(format!("test-{}", Uuid::new_v4()), None, None, Utc::now());
        store.insert_employee(&employee).await.unwrap();
        let workday = Workday {
            workday_id: Uuid::new_v4(),
            employee_id: employee.employee_id,
            date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            day_type: DayType::HomeOffice,
        };
        store.insert_workday(&workday).await.unwrap();
        let interval = WorktimeInterval {
            worktime_id: Uuid::new_v4(),
            workday_id: workday.workday_id,
            start_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            end_time: Some(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
            break_time: Some(TimeDelta::minutes(15)),
        };
        store.insert_worktime(&interval).await.unwrap();

        assert_eq!(store.find_workday(workday.workday_id).await.unwrap(), Some(workday.clone()));
        assert_eq!(store.list_worktimes(&[workday.workday_id]).await.unwrap(), vec![interval]);

        assert!(store.delete_workday(workday.workday_id).await.unwrap());
        assert!(store.list_worktimes(&[workday.workday_id]).await.unwrap().is_empty());
    }
}
