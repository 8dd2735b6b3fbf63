use chrono::TimeDelta;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{DayType, Employee, Workday, WorktimeInterval};

/// A workday together with the intervals clocked on it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkdayRecord {
    pub workday: Workday,
    pub worktimes: Vec<WorktimeInterval>,
}

impl WorkdayRecord {
    /// Pairs every workday with its intervals. Intervals of unknown workdays are dropped.
    pub fn join(workdays: Vec<Workday>, worktimes: Vec<WorktimeInterval>) -> Vec<WorkdayRecord> {
        let mut by_day: HashMap<Uuid, Vec<WorktimeInterval>> = HashMap::new();
        for worktime in worktimes {
            by_day.entry(worktime.workday_id).or_default().push(worktime);
        }

        workdays
            .into_iter()
            .map(|workday| {
                let worktimes = by_day.remove(&workday.workday_id).unwrap_or_default();
                WorkdayRecord { workday, worktimes }
            })
            .collect()
    }
}

pub fn hours(duration: TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

/// Sum of `end - start - break` over closed intervals. Open intervals contribute nothing.
pub fn total_worked(intervals: &[WorktimeInterval]) -> TimeDelta {
    intervals
        .iter()
        .filter_map(|interval| {
            let span = interval.span()?;
            Some(span - interval.break_time.unwrap_or_else(TimeDelta::zero))
        })
        .fold(TimeDelta::zero(), |total, worked| total + worked)
}

/// Signed overtime in hours for one day.
///
/// A flex day off always costs a full baseline day. A day without intervals is even.
/// Other non-working days credit whatever was logged; working days are measured
/// against the baseline.
pub fn daily_overtime(workday: &Workday, intervals: &[WorktimeInterval], baseline_hours: f64) -> f64 {
    if workday.day_type == DayType::FlexDayOff {
        return -baseline_hours;
    }
    if intervals.is_empty() {
        return 0.0;
    }

    let worked = hours(total_worked(intervals));
    if workday.day_type.is_non_working() {
        worked
    } else {
        worked - baseline_hours
    }
}

/// Overtime across every given day plus the employee's manual correction.
pub fn total_overtime(employee: &Employee, records: &[WorkdayRecord]) -> f64 {
    let accumulated: f64 = records
        .iter()
        .map(|record| daily_overtime(&record.workday, &record.worktimes, employee.daily_working_hours))
        .sum();
    accumulated + employee.overtime_correction_hours
}
