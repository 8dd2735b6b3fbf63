use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::duration;

/// A clocked interval inside one workday. `end_time == None` means the interval is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorktimeInterval {
    pub worktime_id: Uuid,
    pub workday_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    #[serde(rename = "break_minutes", with = "duration::option", default)]
    #[schema(value_type = Option<i64>)]
    pub break_time: Option<TimeDelta>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalViolation {
    #[error("end time {end} must be after start time {start}")]
    EndNotAfterStart { start: NaiveTime, end: NaiveTime },

    #[error("break duration must not be negative")]
    NegativeBreak,

    #[error("break of {break_minutes} minutes exceeds the interval span of {span_minutes} minutes")]
    BreakExceedsSpan {
        break_minutes: i64,
        span_minutes: i64,
    },
}

impl WorktimeInterval {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// `end - start` for a closed interval.
    pub fn span(&self) -> Option<TimeDelta> {
        self.end_time.map(|end| end - self.start_time)
    }

    /// Checks the interval's own invariants before it is written.
    pub fn validate(&self) -> Result<(), IntervalViolation> {
        if let Some(end) = self.end_time {
            if end <= self.start_time {
                return Err(IntervalViolation::EndNotAfterStart {
                    start: self.start_time,
                    end,
                });
            }
        }

        if let Some(break_time) = self.break_time {
            if break_time < TimeDelta::zero() {
                return Err(IntervalViolation::NegativeBreak);
            }
            if let Some(span) = self.span() {
                if break_time > span {
                    return Err(IntervalViolation::BreakExceedsSpan {
                        break_minutes: break_time.num_minutes(),
                        span_minutes: span.num_minutes(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: (u32, u32), end: Option<(u32, u32)>, break_minutes: Option<i64>) -> WorktimeInterval {
        WorktimeInterval {
            worktime_id: Uuid::new_v4(),
            workday_id: Uuid::nil(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: end.map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap()),
            break_time: break_minutes.map(TimeDelta::minutes),
        }
    }

    #[test]
    fn accepts_closed_and_open_intervals() {
        assert!(interval((9, 0), Some((17, 0)), Some(30)).validate().is_ok());
        assert!(interval((9, 0), None, None).validate().is_ok());
        assert!(interval((9, 0), None, Some(30)).validate().is_ok());
        assert!(interval((9, 0), Some((10, 0)), Some(60)).validate().is_ok());
    }

    #[test]
    fn rejects_end_not_after_start() {
        assert!(matches!(
            interval((10, 0), Some((9, 0)), None).validate(),
            Err(IntervalViolation::EndNotAfterStart { .. })
        ));
        assert!(matches!(
            interval((10, 0), Some((10, 0)), None).validate(),
            Err(IntervalViolation::EndNotAfterStart { .. })
        ));
    }

    #[test]
    fn rejects_bad_breaks() {
        assert_eq!(
            interval((9, 0), Some((10, 0)), Some(-5)).validate(),
            Err(IntervalViolation::NegativeBreak)
        );
        assert_eq!(
            interval((9, 0), Some((10, 0)), Some(61)).validate(),
            Err(IntervalViolation::BreakExceedsSpan {
                break_minutes: 61,
                span_minutes: 60
            })
        );
    }

    #[test]
    fn break_travels_as_minutes() {
        let json = serde_json::to_value(interval((9, 0), Some((12, 0)), Some(15))).unwrap();
        assert_eq!(json["break_minutes"], 15);
        assert_eq!(json["start_time"], "09:00:00");

        let parsed: WorktimeInterval = serde_json::from_value(serde_json::json!({
            "worktime_id": Uuid::nil(),
            "workday_id": Uuid::nil(),
            "start_time": "08:00:00",
            "end_time": null
        }))
        .unwrap();
        assert!(parsed.is_open());
        assert_eq!(parsed.break_time, None);
    }
}
