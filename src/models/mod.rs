pub mod absence;
pub mod duration;
pub mod employee;
pub mod employee_input;
pub mod project;
pub mod project_input;
pub mod projecttime;
pub mod projecttime_input;
pub mod workday;
pub mod workday_input;
pub mod worktime;
pub mod worktime_input;

pub use absence::AbsenceStreak;
pub use employee::{Employee, EmployeeSettings, RegionCode, DEFAULT_DAILY_WORKING_HOURS, DEFAULT_VACATION_DAYS_PER_YEAR};
pub use employee_input::{EmployeeResponse, OvertimeResponse, UpdateEmployeeSettingsInput, YearCountResponse};
pub use project::Project;
pub use project_input::{validate_project, CreateProjectInput, ProjectMutationResponse, UpdateProjectInput};
pub use projecttime::ProjectTimeAllocation;
pub use projecttime_input::{CreateProjecttimeInput, ProjecttimeMutationResponse};
pub use workday::{DayClass, DayType, Workday};
pub use workday_input::{CreateWorkdayInput, UpdateWorkdayInput, WorkdayMutationResponse, WorkdayView, WorktimeTotalResponse};
pub use worktime::{IntervalViolation, WorktimeInterval};
pub use worktime_input::{CreateWorktimeInput, UpdateWorktimeInput, WorktimeMutationResponse};
