use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Attendance classification of a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DayType {
    Office,
    HomeOffice,
    BusinessTrip,
    Sick,
    Vacation,
    FlexDayOff,
    PublicHoliday,
}

/// The two partitions every [`DayType`] falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    Working,
    NonWorking,
}

impl DayType {
    pub const ALL: [DayType; 7] = [
        DayType::Office,
        DayType::HomeOffice,
        DayType::BusinessTrip,
        DayType::Sick,
        DayType::Vacation,
        DayType::FlexDayOff,
        DayType::PublicHoliday,
    ];

    pub fn class(self) -> DayClass {
        match self {
            DayType::Office | DayType::HomeOffice | DayType::BusinessTrip => DayClass::Working,
            DayType::Sick | DayType::Vacation | DayType::FlexDayOff | DayType::PublicHoliday => {
                DayClass::NonWorking
            }
        }
    }

    pub fn is_working(self) -> bool {
        self.class() == DayClass::Working
    }

    pub fn is_non_working(self) -> bool {
        self.class() == DayClass::NonWorking
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Office => "office",
            DayType::HomeOffice => "home-office",
            DayType::BusinessTrip => "business-trip",
            DayType::Sick => "sick",
            DayType::Vacation => "vacation",
            DayType::FlexDayOff => "flex-day-off",
            DayType::PublicHoliday => "public-holiday",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown day type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Workday {
    pub workday_id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub day_type: DayType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_match_the_closed_membership_lists() {
        let working: Vec<_> = DayType::ALL.into_iter().filter(|t| t.is_working()).collect();
        let non_working: Vec<_> = DayType::ALL
            .into_iter()
            .filter(|t| t.is_non_working())
            .collect();

        assert_eq!(
            working,
            vec![DayType::Office, DayType::HomeOffice, DayType::BusinessTrip]
        );
        assert_eq!(
            non_working,
            vec![
                DayType::Sick,
                DayType::Vacation,
                DayType::FlexDayOff,
                DayType::PublicHoliday
            ]
        );
    }

    #[test]
    fn labels_parse_back_and_match_serde() {
        for day_type in DayType::ALL {
            assert_eq!(day_type.as_str().parse::<DayType>().unwrap(), day_type);
            let json = serde_json::to_string(&day_type).unwrap();
            assert_eq!(json, format!("\"{}\"", day_type.as_str()));
        }
        assert!("holiday".parse::<DayType>().is_err());
    }
}
