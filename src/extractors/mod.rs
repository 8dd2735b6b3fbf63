pub mod auth;
pub mod permissions;

pub use auth::CurrentEmployee;
pub use permissions::require_project_manager;
