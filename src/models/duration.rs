//! Serde helpers that carry `chrono::TimeDelta` values as whole minutes on the wire.

use chrono::TimeDelta;
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn from_minutes(minutes: i64) -> Option<TimeDelta> {
    TimeDelta::try_minutes(minutes)
}

pub fn serialize<S>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(value.num_minutes())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = i64::deserialize(deserializer)?;
    from_minutes(minutes).ok_or_else(|| de::Error::custom(format!("{} minutes is out of range", minutes)))
}

pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<TimeDelta>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(delta) => serializer.serialize_some(&delta.num_minutes()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<TimeDelta>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<i64>::deserialize(deserializer)? {
            Some(minutes) => from_minutes(minutes)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("{} minutes is out of range", minutes))),
            None => Ok(None),
        }
    }
}
