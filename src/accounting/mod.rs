//! Time accounting rules: worked time and overtime, interval overlap, absence streaks,
//! and the single-default-project invariant.

pub mod absence;
pub mod overlap;
pub mod project_default;
pub mod worktime;

pub use absence::group_into_streaks;
pub use overlap::overlaps;
pub use project_default::{apply_default_invariant_on_write, refuse_delete_if_default, DeleteOutcome, WriteMode};
pub use worktime::{daily_overtime, hours, total_overtime, total_worked, WorkdayRecord};
