use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "Admin";
pub const PROJECT_MANAGER_ROLE: &str = "ProjectManager";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdentityClaims {
    pub sub: String,
    /// Object id of the account. Stable across applications, preferred over `sub`.
    pub oid: Option<String>,
    pub name: Option<String>,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
    pub iss: String,
}

impl IdentityClaims {
    pub fn subject_id(&self) -> &str {
        self.oid.as_deref().unwrap_or(&self.sub)
    }

    pub fn email(&self) -> Option<&str> {
        self.preferred_username
            .as_deref()
            .or(self.email.as_deref())
    }

    pub fn roles(&self) -> Roles {
        Roles::from_claims(&self.roles)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles {
    pub is_admin: bool,
    pub is_project_manager: bool,
}

impl Roles {
    pub fn from_claims(roles: &[String]) -> Self {
        Self {
            is_admin: roles.iter().any(|r| r == ADMIN_ROLE),
            is_project_manager: roles.iter().any(|r| r == PROJECT_MANAGER_ROLE),
        }
    }

    pub fn can_manage_projects(&self) -> bool {
        self.is_admin || self.is_project_manager
    }
}
