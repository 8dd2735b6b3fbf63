use crate::auth::Roles;
use crate::{AppError, AppResult};

/// Project writes are reserved for admins and project managers.
pub fn require_project_manager(roles: &Roles) -> AppResult<()> {
    if roles.can_manage_projects() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Managing projects requires the Admin or ProjectManager role".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_managers_and_admins_pass() {
        assert!(require_project_manager(&Roles::default()).is_err());
        assert!(require_project_manager(&Roles { is_admin: true, is_project_manager: false }).is_ok());
        assert!(require_project_manager(&Roles { is_admin: false, is_project_manager: true }).is_ok());
    }
}
