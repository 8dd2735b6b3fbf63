use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_DAILY_WORKING_HOURS: f64 = 8.0;
pub const DEFAULT_VACATION_DAYS_PER_YEAR: i32 = 30;

/// Work region used for public-holiday calendars. `ALL` means no specific state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegionCode {
    #[default]
    All,
    Bw,
    By,
    Be,
    Bb,
    Hb,
    Hh,
    He,
    Mv,
    Ni,
    Nw,
    Rp,
    Sl,
    Sn,
    St,
    Sh,
    Th,
}

impl RegionCode {
    pub const ALL: [RegionCode; 17] = [
        RegionCode::All,
        RegionCode::Bw,
        RegionCode::By,
        RegionCode::Be,
        RegionCode::Bb,
        RegionCode::Hb,
        RegionCode::Hh,
        RegionCode::He,
        RegionCode::Mv,
        RegionCode::Ni,
        RegionCode::Nw,
        RegionCode::Rp,
        RegionCode::Sl,
        RegionCode::Sn,
        RegionCode::St,
        RegionCode::Sh,
        RegionCode::Th,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegionCode::All => "ALL",
            RegionCode::Bw => "BW",
            RegionCode::By => "BY",
            RegionCode::Be => "BE",
            RegionCode::Bb => "BB",
            RegionCode::Hb => "HB",
            RegionCode::Hh => "HH",
            RegionCode::He => "HE",
            RegionCode::Mv => "MV",
            RegionCode::Ni => "NI",
            RegionCode::Nw => "NW",
            RegionCode::Rp => "RP",
            RegionCode::Sl => "SL",
            RegionCode::Sn => "SN",
            RegionCode::St => "ST",
            RegionCode::Sh => "SH",
            RegionCode::Th => "TH",
        }
    }
}

impl FromStr for RegionCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegionCode::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown region code: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub employee_id: Uuid,
    /// Subject id issued by the identity provider. Never changes.
    pub subject_id: String,
    pub email: String,
    pub name: String,
    pub region: RegionCode,
    pub vacation_days_per_year: i32,
    pub daily_working_hours: f64,
    /// Manual correction added on top of the computed overtime balance. May be negative.
    pub overtime_correction_hours: f64,
    pub last_seen: DateTime<Utc>,
}

impl Employee {
    /// First-sight record for an identity that has no stored employee yet.
    pub fn first_seen(subject_id: impl Into<String>, email: Option<String>, name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            employee_id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            email: email.unwrap_or_default(),
            name: name.unwrap_or_default(),
            region: RegionCode::All,
            vacation_days_per_year: DEFAULT_VACATION_DAYS_PER_YEAR,
            daily_working_hours: DEFAULT_DAILY_WORKING_HOURS,
            overtime_correction_hours: 0.0,
            last_seen: now,
        }
    }

    pub fn settings(&self) -> EmployeeSettings {
        EmployeeSettings {
            region: self.region,
            vacation_days_per_year: self.vacation_days_per_year,
            daily_working_hours: self.daily_working_hours,
            overtime_correction_hours: self.overtime_correction_hours,
        }
    }

    pub fn apply_settings(&mut self, settings: &EmployeeSettings) {
        self.region = settings.region;
        self.vacation_days_per_year = settings.vacation_days_per_year;
        self.daily_working_hours = settings.daily_working_hours;
        self.overtime_correction_hours = settings.overtime_correction_hours;
    }
}

/// The user-editable part of an employee record.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeSettings {
    pub region: RegionCode,
    pub vacation_days_per_year: i32,
    pub daily_working_hours: f64,
    pub overtime_correction_hours: f64,
}
