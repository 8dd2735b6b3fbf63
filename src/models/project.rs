use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    /// Identifier of the structured object time bookings are reported against.
    pub response_object: String,
    pub default_response_text: String,
    /// At most one project carries this flag at any committed state.
    pub is_default: bool,
}
