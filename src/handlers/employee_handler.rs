use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use std::sync::Arc;

use super::DateRangeQuery;
use crate::{
    accounting::{total_overtime, WorkdayRecord},
    extractors::CurrentEmployee,
    models::{AbsenceStreak, Employee, EmployeeResponse, OvertimeResponse, UpdateEmployeeSettingsInput, YearCountResponse},
    AppError, AppResult, AppState,
};

fn respond(current: &CurrentEmployee, employee: Employee) -> EmployeeResponse {
    EmployeeResponse {
        employee,
        is_admin: current.roles.is_admin,
        is_project_manager: current.roles.is_project_manager,
    }
}

/// GET /api/employee - The employee behind the caller's identity, created on first sight
#[utoipa::path(
    get,
    path = "/api/employee",
    responses(
        (status = 200, description = "Current employee", body = EmployeeResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_employee(current: CurrentEmployee) -> AppResult<Json<EmployeeResponse>> {
    let employee = current.employee.clone();
    Ok(Json(respond(&current, employee)))
}

/// PATCH /api/employee - Update region, vacation allotment, baseline hours and overtime correction
#[utoipa::path(
    patch,
    path = "/api/employee",
    request_body = UpdateEmployeeSettingsInput,
    responses(
        (status = 200, description = "Settings updated", body = EmployeeResponse),
        (status = 404, description = "Employee no longer exists"),
        (status = 422, description = "Invalid settings")
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_employee(
    current: CurrentEmployee,
    Json(input): Json<UpdateEmployeeSettingsInput>,
) -> AppResult<Json<EmployeeResponse>> {
    input.validate().map_err(AppError::Validation)?;

    let updated = input.merged_into(&current.employee);
    if !current.context.update_settings(&updated).await? {
        return Err(AppError::NotFound(format!(
            "Employee {} not found",
            updated.employee_id
        )));
    }

    tracing::info!(employee_id = %updated.employee_id, "Employee settings updated");
    Ok(Json(respond(&current, updated)))
}

/// GET /api/employee/absences/{year}
#[utoipa::path(
    get,
    path = "/api/employee/absences/{year}",
    params(
        ("year" = i32, Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "Absence streaks of the year", body = Vec<AbsenceStreak>)
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_absences(
    current: CurrentEmployee,
    Path(year): Path<i32>,
) -> AppResult<Json<Vec<AbsenceStreak>>> {
    let streaks = current
        .context
        .compute_absence_streaks(current.employee.employee_id, year)
        .await?;
    Ok(Json(streaks))
}

/// GET /api/employee/vacation-days/{year}
#[utoipa::path(
    get,
    path = "/api/employee/vacation-days/{year}",
    params(
        ("year" = i32, Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "Number of vacation days taken", body = YearCountResponse)
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_vacation_days(
    current: CurrentEmployee,
    Path(year): Path<i32>,
) -> AppResult<Json<YearCountResponse>> {
    let count = current
        .context
        .count_vacation_days_taken(current.employee.employee_id, year)
        .await?;
    Ok(Json(YearCountResponse { year, count }))
}

/// GET /api/employee/office-days/{year}
#[utoipa::path(
    get,
    path = "/api/employee/office-days/{year}",
    params(
        ("year" = i32, Path, description = "Calendar year")
    ),
    responses(
        (status = 200, description = "Number of office days", body = YearCountResponse)
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_office_days(
    current: CurrentEmployee,
    Path(year): Path<i32>,
) -> AppResult<Json<YearCountResponse>> {
    let count = current
        .context
        .count_office_days(current.employee.employee_id, year)
        .await?;
    Ok(Json(YearCountResponse { year, count }))
}

fn current_year() -> i32 {
    Utc::now().year()
}

/// GET /api/employee/absences - Absence streaks of the current year
#[utoipa::path(
    get,
    path = "/api/employee/absences",
    responses(
        (status = 200, description = "Absence streaks of the current year", body = Vec<AbsenceStreak>)
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_absences_this_year(current: CurrentEmployee) -> AppResult<Json<Vec<AbsenceStreak>>> {
    get_absences(current, Path(current_year())).await
}

/// GET /api/employee/vacation-days
#[utoipa::path(
    get,
    path = "/api/employee/vacation-days",
    responses(
        (status = 200, description = "Vacation days taken in the current year", body = YearCountResponse)
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_vacation_days_this_year(current: CurrentEmployee) -> AppResult<Json<YearCountResponse>> {
    get_vacation_days(current, Path(current_year())).await
}

/// GET /api/employee/office-days
#[utoipa::path(
    get,
    path = "/api/employee/office-days",
    responses(
        (status = 200, description = "Office days in the current year", body = YearCountResponse)
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_office_days_this_year(current: CurrentEmployee) -> AppResult<Json<YearCountResponse>> {
    get_office_days(current, Path(current_year())).await
}

/// GET /api/employee/overtime?from=&to= - Overtime balance over the window (all time when omitted)
#[utoipa::path(
    get,
    path = "/api/employee/overtime",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Overtime balance", body = OvertimeResponse),
        (status = 400, description = "Inverted date range")
    ),
    tag = "employee",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_overtime(
    State(state): State<Arc<AppState>>,
    current: CurrentEmployee,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<OvertimeResponse>> {
    let employee = &current.employee;
    let workdays = state
        .store
        .list_workdays(employee.employee_id, query.range()?)
        .await?;
    let ids: Vec<_> = workdays.iter().map(|w| w.workday_id).collect();
    let worktimes = state.store.list_worktimes(&ids).await?;

    let records = WorkdayRecord::join(workdays, worktimes);
    let overtime_hours = total_overtime(employee, &records);

    tracing::debug!(employee_id = %employee.employee_id, workdays = records.len(), overtime_hours, "Computed overtime");
    Ok(Json(OvertimeResponse {
        overtime_hours,
        correction_hours: employee.overtime_correction_hours,
        workdays: records.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Roles;
    use crate::handlers::test_support;
    use crate::models::{DayType, RegionCode, Workday, WorktimeInterval};
    use crate::store::RecordStore;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    #[tokio::test]
    async fn patch_updates_settings_and_keeps_other_fields() {
        let (state, _store) = test_support::state();
        let current = test_support::employee(&state, "oid-patch", Roles::default()).await;

        let Json(response) = update_employee(
            current.clone(),
            Json(UpdateEmployeeSettingsInput {
                region: Some(RegionCode::By),
                daily_working_hours: Some(7.0),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.employee.region, RegionCode::By);
        assert_eq!(response.employee.daily_working_hours, 7.0);
        assert_eq!(response.employee.vacation_days_per_year, 30);

        let cached = current.context.require_current().await.unwrap();
        assert_eq!(cached.region, RegionCode::By);
    }

    #[tokio::test]
    async fn patch_rejects_invalid_hours() {
        let (state, _store) = test_support::state();
        let current = test_support::employee(&state, "oid-invalid", Roles::default()).await;

        let result = update_employee(
            current,
            Json(UpdateEmployeeSettingsInput {
                daily_working_hours: Some(-1.0),
                ..Default::default()
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn overtime_covers_the_requested_window_plus_correction() {
        let (state, store) = test_support::state();
        let current = test_support::employee(&state, "oid-overtime", Roles::default()).await;
        let employee_id = current.employee.employee_id;

        for (day, day_type, hours) in [(1, DayType::Office, 9), (2, DayType::Office, 10), (3, DayType::FlexDayOff, 0)] {
            let workday = Workday {
                workday_id: Uuid::new_v4(),
                employee_id,
                date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
                day_type,
            };
            store.insert_workday(&workday).await.unwrap();
            if hours > 0 {
                store
                    .insert_worktime(&WorktimeInterval {
                        worktime_id: Uuid::new_v4(),
                        workday_id: workday.workday_id,
                        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                        end_time: NaiveTime::from_hms_opt(8 + hours, 0, 0),
                        break_time: None,
                    })
                    .await
                    .unwrap();
            }
        }

        let Json(all) = get_overtime(State(state.clone()), current.clone(), Query(DateRangeQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.workdays, 3);
        assert_eq!(all.overtime_hours, 1.0 + 2.0 - 8.0);

        let window = DateRangeQuery {
            from: NaiveDate::from_ymd_opt(2024, 4, 2),
            to: NaiveDate::from_ymd_opt(2024, 4, 2),
        };
        let Json(one_day) = get_overtime(State(state), current, Query(window)).await.unwrap();
        assert_eq!(one_day.workdays, 1);
        assert_eq!(one_day.overtime_hours, 2.0);
    }

    #[tokio::test]
    async fn yearless_routes_count_the_current_year() {
        let (state, store) = test_support::state();
        let current = test_support::employee(&state, "oid-this-year", Roles::default()).await;
        let employee_id = current.employee.employee_id;
        let year = Utc::now().year();

        for (date, day_type) in [
            (NaiveDate::from_ymd_opt(year, 1, 2).unwrap(), DayType::Vacation),
            (NaiveDate::from_ymd_opt(year, 1, 3).unwrap(), DayType::Vacation),
            (NaiveDate::from_ymd_opt(year, 1, 4).unwrap(), DayType::Office),
            (NaiveDate::from_ymd_opt(year - 1, 12, 30).unwrap(), DayType::Vacation),
        ] {
            store
                .insert_workday(&Workday {
                    workday_id: Uuid::new_v4(),
                    employee_id,
                    date,
                    day_type,
                })
                .await
                .unwrap();
        }

        let Json(vacation) = get_vacation_days_this_year(current.clone()).await.unwrap();
        assert_eq!((vacation.year, vacation.count), (year, 2));

        let Json(office) = get_office_days_this_year(current.clone()).await.unwrap();
        assert_eq!((office.year, office.count), (year, 1));

        let Json(streaks) = get_absences_this_year(current.clone()).await.unwrap();
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].start_date, NaiveDate::from_ymd_opt(year, 1, 2).unwrap());
        assert_eq!(streaks[0].duration_in_days, 2);

        let Json(last_year) = get_vacation_days(current, Path(year - 1)).await.unwrap();
        assert_eq!(last_year.count, 1);
    }
}
