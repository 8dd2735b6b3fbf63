use crate::models::{AbsenceStreak, DayType, Workday};

/// Collapses non-working workdays into runs of consecutive calendar days.
///
/// Working days are ignored. Input order does not matter; the days are stably sorted by
/// date first. Two rows on the same date break a streak since the second one is not the
/// day after the first.
pub fn group_into_streaks(workdays: &[Workday]) -> Vec<AbsenceStreak> {
    let mut absent: Vec<&Workday> = workdays
        .iter()
        .filter(|w| w.day_type.is_non_working())
        .collect();
    absent.sort_by_key(|w| w.date);

    let mut streaks = Vec::new();
    let mut current: Vec<&Workday> = Vec::new();

    for workday in absent {
        if let Some(previous) = current.last() {
            if previous.date.succ_opt() != Some(workday.date) {
                streaks.push(close_streak(&current));
                current.clear();
            }
        }
        current.push(workday);
    }
    if !current.is_empty() {
        streaks.push(close_streak(&current));
    }

    streaks
}

fn close_streak(members: &[&Workday]) -> AbsenceStreak {
    let mut day_types: Vec<DayType> = Vec::new();
    for member in members {
        if !day_types.contains(&member.day_type) {
            day_types.push(member.day_type);
        }
    }

    let absence_types = day_types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    AbsenceStreak {
        start_date: members[0].date,
        end_date: members[members.len() - 1].date,
        day_types,
        absence_types,
        duration_in_days: members.len() as u32,
    }
}
