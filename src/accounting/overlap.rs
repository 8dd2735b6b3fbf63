use crate::models::WorktimeInterval;

/// Whether a closed `candidate` intersects any closed interval in `existing`.
///
/// Intervals are half-open, so back-to-back intervals do not overlap. An open candidate is
/// always accepted. Existing entries that are open or share the candidate's id are skipped.
/// A start of 00:00 is a real start time.
pub fn overlaps(candidate: &WorktimeInterval, existing: &[WorktimeInterval]) -> bool {
    let Some(end) = candidate.end_time else {
        return false;
    };
    let start = candidate.start_time;

    existing
        .iter()
        .filter(|other| other.worktime_id != candidate.worktime_id)
        .filter_map(|other| other.end_time.map(|other_end| (other.start_time, other_end)))
        .any(|(other_start, other_end)| !(end <= other_start || start >= other_end))
}
