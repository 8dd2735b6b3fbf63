use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Project;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub response_object: String,
    pub default_response_text: Option<String>,
    pub is_default: Option<bool>,
}

impl CreateProjectInput {
    pub fn into_project(self) -> Project {
        Project {
            project_id: Uuid::new_v4(),
            name: self.name,
            description: self.description.unwrap_or_default(),
            response_object: self.response_object,
            default_response_text: self.default_response_text.unwrap_or_default(),
            is_default: self.is_default.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub response_object: Option<String>,
    pub default_response_text: Option<String>,
    pub is_default: Option<bool>,
}

impl UpdateProjectInput {
    pub fn merged_into(self, project: &Project) -> Project {
        Project {
            project_id: project.project_id,
            name: self.name.unwrap_or_else(|| project.name.clone()),
            description: self.description.unwrap_or_else(|| project.description.clone()),
            response_object: self
                .response_object
                .unwrap_or_else(|| project.response_object.clone()),
            default_response_text: self
                .default_response_text
                .unwrap_or_else(|| project.default_response_text.clone()),
            is_default: self.is_default.unwrap_or(project.is_default),
        }
    }
}

/// Length limits shared by create and update.
pub fn validate_project(project: &Project) -> Result<(), String> {
    if project.name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    if project.name.chars().count() > 256 {
        return Err("name must be at most 256 characters".to_string());
    }
    if project.response_object.trim().is_empty() {
        return Err("response_object must not be empty".to_string());
    }
    if project.response_object.chars().count() > 256 {
        return Err("response_object must be at most 256 characters".to_string());
    }
    if project.description.chars().count() > 1024 {
        return Err("description must be at most 1024 characters".to_string());
    }
    if project.default_response_text.chars().count() > 1024 {
        return Err("default_response_text must be at most 1024 characters".to_string());
    }
    Ok(())
}

/// Response for project mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectMutationResponse {
    pub success: bool,
    pub message: Option<String>,
    pub project_id: Option<Uuid>,
}
