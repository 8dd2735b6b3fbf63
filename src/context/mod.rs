//! Per-session "current employee" state.

pub mod employee_context;
pub mod registry;
pub mod resolve_once;

pub use employee_context::EmployeeContext;
pub use registry::EmployeeContextRegistry;
pub use resolve_once::{Lookup, ResolveOnce};
