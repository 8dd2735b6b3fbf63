use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Worklog API",
        version = "0.1.0",
        description = "Working time, absences and project time bookings per employee"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Employee
        crate::handlers::employee_handler::get_employee,
        crate::handlers::employee_handler::update_employee,
        crate::handlers::employee_handler::get_absences,
        crate::handlers::employee_handler::get_absences_this_year,
        crate::handlers::employee_handler::get_vacation_days,
        crate::handlers::employee_handler::get_vacation_days_this_year,
        crate::handlers::employee_handler::get_office_days,
        crate::handlers::employee_handler::get_office_days_this_year,
        crate::handlers::employee_handler::get_overtime,

        // Workdays
        crate::handlers::workdays_handler::list_workdays,
        crate::handlers::workdays_handler::get_workday,
        crate::handlers::workdays_handler::create_workday,
        crate::handlers::workdays_handler::update_workday,
        crate::handlers::workdays_handler::delete_workday,
        crate::handlers::workdays_handler::get_workday_worktime,

        // Worktimes
        crate::handlers::worktimes_handler::create_worktime,
        crate::handlers::worktimes_handler::update_worktime,
        crate::handlers::worktimes_handler::delete_worktime,

        // Projects
        crate::handlers::projects_handler::list_projects,
        crate::handlers::projects_handler::get_project,
        crate::handlers::projects_handler::create_project,
        crate::handlers::projects_handler::update_project,
        crate::handlers::projects_handler::delete_project,

        // Project times
        crate::handlers::projecttimes_handler::list_projecttimes,
        crate::handlers::projecttimes_handler::create_projecttime,
        crate::handlers::projecttimes_handler::delete_projecttime,
    ),
    components(
        schemas(
            crate::models::Employee,
            crate::models::RegionCode,
            crate::models::Workday,
            crate::models::DayType,
            crate::models::WorktimeInterval,
            crate::models::Project,
            crate::models::ProjectTimeAllocation,
            crate::models::AbsenceStreak,

            crate::models::UpdateEmployeeSettingsInput,
            crate::models::EmployeeResponse,
            crate::models::YearCountResponse,
            crate::models::OvertimeResponse,
            crate::models::CreateWorkdayInput,
            crate::models::UpdateWorkdayInput,
            crate::models::WorkdayView,
            crate::models::WorktimeTotalResponse,
            crate::models::WorkdayMutationResponse,
            crate::models::CreateWorktimeInput,
            crate::models::UpdateWorktimeInput,
            crate::models::WorktimeMutationResponse,
            crate::models::CreateProjectInput,
            crate::models::UpdateProjectInput,
            crate::models::ProjectMutationResponse,
            crate::models::CreateProjecttimeInput,
            crate::models::ProjecttimeMutationResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "employee", description = "Current employee, settings and yearly statistics"),
        (name = "workdays", description = "Workday management"),
        (name = "worktimes", description = "Clocked intervals"),
        (name = "projects", description = "Project catalogue and the default project"),
        (name = "projecttimes", description = "Time booked on projects"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("__session"))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_resource_and_both_auth_schemes() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/employee",
            "/api/employee/vacation-days",
            "/api/employee/vacation-days/{year}",
            "/api/workdays/{id}/worktime",
            "/api/projecttimes/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let schemes = &doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
        assert!(schemes.contains_key("cookie_auth"));
    }
}
