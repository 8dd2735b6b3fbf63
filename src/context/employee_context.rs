use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

use super::ResolveOnce;
use crate::accounting::group_into_streaks;
use crate::auth::IdentityLookup;
use crate::models::{AbsenceStreak, DayType, Employee};
use crate::store::{DateRange, RecordStore, StoreError};
use crate::{AppError, AppResult};

fn record_outcome(outcome: &'static str) {
    counter!("employee_context_resolutions_total", "outcome" => outcome).increment(1);
}

/// The current employee of one session, resolved at most once.
pub struct EmployeeContext {
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityLookup>,
    current: ResolveOnce<Employee>,
}

impl EmployeeContext {
    pub fn new(store: Arc<dyn RecordStore>, identity: Arc<dyn IdentityLookup>) -> Self {
        Self {
            store,
            identity,
            current: ResolveOnce::new(),
        }
    }

    /// Get-or-create the employee behind the current identity.
    ///
    /// `Ok(None)` for an anonymous caller. Storage failures propagate and leave the context
    /// unresolved.
    pub async fn resolve_current(&self) -> AppResult<Option<Employee>> {
        let lookup = self
            .current
            .get_or_resolve(|| self.fetch_or_create())
            .await?;

        if lookup.cached {
            record_outcome("cache_hit");
        }
        Ok(lookup.value)
    }

    pub async fn require_current(&self) -> AppResult<Employee> {
        self.resolve_current()
            .await?
            .ok_or_else(|| AppError::Unauthorized("No employee for an anonymous caller".to_string()))
    }

    async fn fetch_or_create(&self) -> Result<Option<Employee>, StoreError> {
        let Some(subject_id) = self.identity.current_subject_id().await.filter(|s| !s.is_empty()) else {
            tracing::debug!("Anonymous caller, no employee to resolve");
            record_outcome("anonymous");
            return Ok(None);
        };
        let display_name = self.identity.current_display_name().await;
        let now = Utc::now();

        if let Some(employee) = self.store.find_employee_by_subject(&subject_id).await? {
            let employee = self.sync_seen(employee, display_name).await?;
            record_outcome("loaded");
            return Ok(Some(employee));
        }

        let email = self.identity.current_email().await;
        let employee = Employee::first_seen(&subject_id, email, display_name.clone(), now);

        match self.store.insert_employee(&employee).await {
            Ok(()) => {
                tracing::info!(
                    subject_id = %subject_id,
                    employee_id = %employee.employee_id,
                    "Created employee on first sight"
                );
                record_outcome("created");
                Ok(Some(employee))
            }
            Err(StoreError::Conflict(reason)) => {
                // Another session created the row first.
                tracing::debug!(subject_id = %subject_id, reason, "Employee insert lost the race, loading winner");
                let winner = self
                    .store
                    .find_employee_by_subject(&subject_id)
                    .await?
                    .ok_or(StoreError::NotFound)?;
                let winner = self.sync_seen(winner, display_name).await?;
                record_outcome("loaded");
                Ok(Some(winner))
            }
            Err(e) => {
                tracing::error!(subject_id = %subject_id, error = %e, "Failed to create employee");
                Err(e)
            }
        }
    }

    /// Stamps last-seen and adopts the provider's display name when it changed.
    async fn sync_seen(&self, mut employee: Employee, display_name: Option<String>) -> Result<Employee, StoreError> {
        let now = Utc::now();
        let rename = display_name.filter(|name| !name.is_empty() && *name != employee.name);

        if !self
            .store
            .touch_employee(employee.employee_id, rename.as_deref(), now)
            .await?
        {
            return Err(StoreError::NotFound);
        }

        if let Some(name) = rename {
            tracing::debug!(employee_id = %employee.employee_id, name, "Synced display name");
            employee.name = name;
        }
        employee.last_seen = now;
        Ok(employee)
    }

    /// Writes the settings part of `employee`. `false` when the record no longer exists.
    pub async fn update_settings(&self, employee: &Employee) -> AppResult<bool> {
        let settings = employee.settings();
        if !self
            .store
            .update_employee_settings(employee.employee_id, &settings)
            .await?
        {
            tracing::warn!(employee_id = %employee.employee_id, "Settings update for missing employee");
            return Ok(false);
        }

        self.current
            .update_resolved(|cached| {
                if cached.employee_id != employee.employee_id {
                    return false;
                }
                cached.apply_settings(&settings);
                true
            })
            .await;
        Ok(true)
    }

    pub async fn compute_absence_streaks(&self, employee_id: Uuid, year: i32) -> AppResult<Vec<AbsenceStreak>> {
        let range = year_range(year)?;
        let workdays = self.store.list_workdays(employee_id, Some(range)).await?;
        Ok(group_into_streaks(&workdays))
    }

    pub async fn count_vacation_days_taken(&self, employee_id: Uuid, year: i32) -> AppResult<usize> {
        self.count_days_of_type(employee_id, year, DayType::Vacation).await
    }

    pub async fn count_office_days(&self, employee_id: Uuid, year: i32) -> AppResult<usize> {
        self.count_days_of_type(employee_id, year, DayType::Office).await
    }

    async fn count_days_of_type(&self, employee_id: Uuid, year: i32, day_type: DayType) -> AppResult<usize> {
        let range = year_range(year)?;
        let workdays = self.store.list_workdays(employee_id, Some(range)).await?;
        Ok(workdays.iter().filter(|w| w.day_type == day_type).count())
    }
}

fn year_range(year: i32) -> AppResult<DateRange> {
    DateRange::year(year).ok_or_else(|| AppError::BadRequest(format!("Year {} is out of range", year)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::AnonymousIdentity;
    use crate::models::Workday;
    use crate::store::InMemoryRecordStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::Duration;

    /// Identity with fixed answers.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct StaticIdentity {
        pub subject_id: Option<String>,
        pub name: Option<String>,
        pub email: Option<String>,
    }

    impl StaticIdentity {
        pub(crate) fn subject(subject_id: &str) -> Self {
            Self {
                subject_id: Some(subject_id.to_string()),
                name: Some("Ada Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
            }
        }
    }

    #[async_trait]
    impl IdentityLookup for StaticIdentity {
        async fn current_subject_id(&self) -> Option<String> {
            self.subject_id.clone()
        }

        async fn current_display_name(&self) -> Option<String> {
            self.name.clone()
        }

        async fn current_email(&self) -> Option<String> {
            self.email.clone()
        }
    }

    fn context(store: &Arc<InMemoryRecordStore>, identity: StaticIdentity) -> EmployeeContext {
        EmployeeContext::new(store.clone(), Arc::new(identity))
    }

    #[tokio::test]
    async fn creates_employee_on_first_sight_with_defaults() {
        let store = Arc::new(InMemoryRecordStore::new());
        let ctx = context(&store, StaticIdentity::subject("oid-new"));

        let employee = ctx.require_current().await.unwrap();

        assert_eq!(employee.subject_id, "oid-new");
        assert_eq!(employee.name, "Ada Lovelace");
        assert_eq!(employee.email, "ada@example.com");
        assert_eq!(employee.daily_working_hours, 8.0);
        assert_eq!(
            store.find_employee_by_subject("oid-new").await.unwrap(),
            Some(employee)
        );
    }

    #[tokio::test]
    async fn missing_name_and_email_become_empty_strings() {
        let store = Arc::new(InMemoryRecordStore::new());
        let identity = StaticIdentity {
            subject_id: Some("oid-bare".to_string()),
            ..StaticIdentity::default()
        };

        let employee = context(&store, identity).require_current().await.unwrap();

        assert_eq!(employee.name, "");
        assert_eq!(employee.email, "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolution_creates_one_row() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.set_latency(Duration::from_millis(5));
        let ctx = Arc::new(context(&store, StaticIdentity::subject("oid-race")));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let ctx = ctx.clone();
                tokio::spawn(async move { ctx.require_current().await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().employee_id);
        }

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.employee_count().await, 1);
        assert_eq!(store.employee_insert_attempts(), 1);
    }

    #[tokio::test]
    async fn competing_contexts_converge_on_the_stored_row() {
        let store = Arc::new(InMemoryRecordStore::new());
        let first = context(&store, StaticIdentity::subject("oid-shared"));
        let second = context(&store, StaticIdentity::subject("oid-shared"));

        let a = first.require_current().await.unwrap();
        let b = second.require_current().await.unwrap();

        assert_eq!(a.employee_id, b.employee_id);
        assert_eq!(store.employee_count().await, 1);
    }

    /// Another session stores the row after this context's lookup missed, right before
    /// it inserts. The email lookup sits between those two steps.
    struct LateWinnerIdentity {
        inner: StaticIdentity,
        store: Arc<InMemoryRecordStore>,
        winner: Employee,
    }

    #[async_trait]
    impl IdentityLookup for LateWinnerIdentity {
        async fn current_subject_id(&self) -> Option<String> {
            self.inner.current_subject_id().await
        }

        async fn current_display_name(&self) -> Option<String> {
            self.inner.current_display_name().await
        }

        async fn current_email(&self) -> Option<String> {
            self.store.insert_employee(&self.winner).await.unwrap();
            self.inner.current_email().await
        }
    }

    #[tokio::test]
    async fn losing_the_insert_race_still_syncs_the_winner() {
        let store = Arc::new(InMemoryRecordStore::new());
        let winner = Employee::first_seen(
            "oid-raced",
            None,
            Some("Winner Name".into()),
            Utc::now() - chrono::TimeDelta::days(1),
        );
        let identity = LateWinnerIdentity {
            inner: StaticIdentity::subject("oid-raced"),
            store: store.clone(),
            winner: winner.clone(),
        };
        let ctx = EmployeeContext::new(store.clone(), Arc::new(identity));

        let resolved = ctx.require_current().await.unwrap();

        assert_eq!(resolved.employee_id, winner.employee_id);
        assert_eq!(resolved.name, "Ada Lovelace");
        assert!(resolved.last_seen > winner.last_seen);
        let stored = store.find_employee(winner.employee_id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada Lovelace");
        assert_eq!(stored.last_seen, resolved.last_seen);
        assert_eq!(store.employee_insert_attempts(), 2);
        assert_eq!(store.employee_count().await, 1);
    }

    #[tokio::test]
    async fn anonymous_caller_resolves_to_none() {
        let store = Arc::new(InMemoryRecordStore::new());
        let ctx = EmployeeContext::new(store.clone(), Arc::new(AnonymousIdentity));

        assert_eq!(ctx.resolve_current().await.unwrap(), None);
        assert!(matches!(ctx.require_current().await, Err(AppError::Unauthorized(_))));
        assert_eq!(store.employee_count().await, 0);
    }

    #[tokio::test]
    async fn storage_failure_propagates_and_a_later_call_succeeds() {
        let store = Arc::new(InMemoryRecordStore::new());
        let ctx = context(&store, StaticIdentity::subject("oid-flaky"));
        store.set_offline(true);

        let failed = ctx.resolve_current().await;
        assert!(matches!(failed, Err(AppError::Store(StoreError::Unavailable(_)))));

        store.set_offline(false);
        let employee = ctx.require_current().await.unwrap();
        assert_eq!(employee.subject_id, "oid-flaky");
        assert_eq!(store.employee_count().await, 1);
    }

    #[tokio::test]
    async fn returning_employee_gets_name_synced_and_last_seen_stamped() {
        let store = Arc::new(InMemoryRecordStore::new());
        let stale = Employee::first_seen("oid-known", None, Some("Old Name".into()), Utc::now() - chrono::TimeDelta::days(3));
        store.insert_employee(&stale).await.unwrap();

        let employee = context(&store, StaticIdentity::subject("oid-known"))
            .require_current()
            .await
            .unwrap();

        assert_eq!(employee.employee_id, stale.employee_id);
        assert_eq!(employee.name, "Ada Lovelace");
        assert!(employee.last_seen > stale.last_seen);
        let stored = store.find_employee(stale.employee_id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada Lovelace");
        assert_eq!(store.employee_insert_attempts(), 1);
    }

    #[tokio::test]
    async fn update_settings_refreshes_the_cached_employee() {
        let store = Arc::new(InMemoryRecordStore::new());
        let ctx = context(&store, StaticIdentity::subject("oid-settings"));
        let mut employee = ctx.require_current().await.unwrap();
        employee.daily_working_hours = 6.0;
        employee.overtime_correction_hours = -2.5;

        assert!(ctx.update_settings(&employee).await.unwrap());

        let cached = ctx.require_current().await.unwrap();
        assert_eq!(cached.daily_working_hours, 6.0);
        assert_eq!(cached.overtime_correction_hours, -2.5);

        let ghost = Employee::first_seen("oid-ghost", None, None, Utc::now());
        assert!(!ctx.update_settings(&ghost).await.unwrap());
    }

    #[tokio::test]
    async fn yearly_counts_and_streaks_are_scoped_to_the_employee_year() {
        let store = Arc::new(InMemoryRecordStore::new());
        let ctx = context(&store, StaticIdentity::subject("oid-year"));
        let employee = ctx.require_current().await.unwrap();
        let other = Uuid::new_v4();

        let days = [
            (employee.employee_id, (2024, 7, 1), DayType::Vacation),
            (employee.employee_id, (2024, 7, 2), DayType::Vacation),
            (employee.employee_id, (2024, 7, 3), DayType::Sick),
            (employee.employee_id, (2024, 7, 4), DayType::Office),
            (employee.employee_id, (2023, 12, 29), DayType::Vacation),
            (other, (2024, 7, 1), DayType::Vacation),
        ];
        for (employee_id, (y, m, d), day_type) in days {
            store
                .insert_workday(&Workday {
                    workday_id: Uuid::new_v4(),
                    employee_id,
                    date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                    day_type,
                })
                .await
                .unwrap();
        }

        assert_eq!(ctx.count_vacation_days_taken(employee.employee_id, 2024).await.unwrap(), 2);
        assert_eq!(ctx.count_office_days(employee.employee_id, 2024).await.unwrap(), 1);

        let streaks = ctx.compute_absence_streaks(employee.employee_id, 2024).await.unwrap();
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].absence_types, "vacation, sick");
        assert_eq!(streaks[0].duration_in_days, 3);
    }
}
