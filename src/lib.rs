pub mod accounting;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod startup;
pub mod store;

use std::sync::Arc;

pub use auth::JwksCache;
pub use config::AppConfig;
pub use context::EmployeeContextRegistry;
pub use error::{AppError, AppResult};
pub use handlers::MetricsState;
pub use store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub contexts: Arc<EmployeeContextRegistry>,
    pub jwks_cache: Arc<JwksCache>,
    pub config: AppConfig,
    pub metrics: Arc<MetricsState>,
}
