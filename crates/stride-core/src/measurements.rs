//! Weekly body measurements.
//!
//! One [`WeeklyMeasurements`] record per 1-based week index. A save
//! replaces the whole record for that week; fields are never merged.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("invalid week index {0} (must be an integer >= 1)")]
    InvalidWeekIndex(i64),

    #[error("unknown measurement field {0:?}")]
    UnknownField(String),

    #[error("invalid measurement value for {0}")]
    InvalidValue(String),
}

/// Which part of the check-in form a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementGroup {
    General,
    UpperBody,
    LowerBody,
}

impl MeasurementGroup {
    /// Form order.
    pub const ALL: [Self; 3] = [Self::General, Self::UpperBody, Self::LowerBody];

    /// Fields of this group, in form order.
    pub fn fields(self) -> impl Iterator<Item = MeasurementField> {
        MeasurementField::ALL
            .into_iter()
            .filter(move |field| field.group() == self)
    }
}

impl fmt::Display for MeasurementGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::General => "General",
            Self::UpperBody => "Upper Body",
            Self::LowerBody => "Lower Body",
        };
        f.write_str(s)
    }
}

/// The fifteen measurement fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementField {
    Weight,
    Neck,
    Shoulders,
    ChestBust,
    UpperArmBiceps,
    Forearm,
    Midsection,
    Waist,
    Abdomen,
    Hips,
    ThighTop,
    MidThigh,
    Knee,
    Calf,
    Ankle,
}

impl MeasurementField {
    /// All fields in form order.
    pub const ALL: [MeasurementField; 15] = [
        Self::Weight,
        Self::Neck,
        Self::Shoulders,
        Self::ChestBust,
        Self::UpperArmBiceps,
        Self::Forearm,
        Self::Midsection,
        Self::Waist,
        Self::Abdomen,
        Self::Hips,
        Self::ThighTop,
        Self::MidThigh,
        Self::Knee,
        Self::Calf,
        Self::Ankle,
    ];

    /// JSON key, e.g. `chestBust`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Neck => "neck",
            Self::Shoulders => "shoulders",
            Self::ChestBust => "chestBust",
            Self::UpperArmBiceps => "upperArmBiceps",
            Self::Forearm => "forearm",
            Self::Midsection => "midsection",
            Self::Waist => "waist",
            Self::Abdomen => "abdomen",
            Self::Hips => "hips",
            Self::ThighTop => "thighTop",
            Self::MidThigh => "midThigh",
            Self::Knee => "knee",
            Self::Calf => "calf",
            Self::Ankle => "ankle",
        }
    }

    /// Database column, e.g. `chest_bust`.
    pub fn column(self) -> &'static str {
        match self {
            Self::ChestBust => "chest_bust",
            Self::UpperArmBiceps => "upper_arm_biceps",
            Self::ThighTop => "thigh_top",
            Self::MidThigh => "mid_thigh",
            other => other.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Weight => "Weight",
            Self::Neck => "Neck",
            Self::Shoulders => "Shoulders",
            Self::ChestBust => "Chest / Bust",
            Self::UpperArmBiceps => "Upper arm (biceps)",
            Self::Forearm => "Forearm",
            Self::Midsection => "Midsection",
            Self::Waist => "Waist",
            Self::Abdomen => "Abdomen",
            Self::Hips => "Hips",
            Self::ThighTop => "Thigh (top)",
            Self::MidThigh => "Mid-thigh",
            Self::Knee => "Knee",
            Self::Calf => "Calf",
            Self::Ankle => "Ankle",
        }
    }

    pub fn group(self) -> MeasurementGroup {
        match self {
            Self::Weight => MeasurementGroup::General,
            Self::ThighTop | Self::MidThigh | Self::Knee | Self::Calf | Self::Ankle => {
                MeasurementGroup::LowerBody
            }
            _ => MeasurementGroup::UpperBody,
        }
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MeasurementField {
    type Err = MeasurementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| MeasurementError::UnknownField(s.to_owned()))
    }
}

/// One week's check-in. Every field is free text; absent means `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyMeasurements {
    pub weight: String,
    pub neck: String,
    pub shoulders: String,
    pub chest_bust: String,
    pub upper_arm_biceps: String,
    pub forearm: String,
    pub midsection: String,
    pub waist: String,
    pub abdomen: String,
    pub hips: String,
    pub thigh_top: String,
    pub mid_thigh: String,
    pub knee: String,
    pub calf: String,
    pub ankle: String,
}

impl WeeklyMeasurements {
    pub fn get(&self, field: MeasurementField) -> &str {
        match field {
            MeasurementField::Weight => &self.weight,
            MeasurementField::Neck => &self.neck,
            MeasurementField::Shoulders => &self.shoulders,
            MeasurementField::ChestBust => &self.chest_bust,
            MeasurementField::UpperArmBiceps => &self.upper_arm_biceps,
            MeasurementField::Forearm => &self.forearm,
            MeasurementField::Midsection => &self.midsection,
            MeasurementField::Waist => &self.waist,
            MeasurementField::Abdomen => &self.abdomen,
            MeasurementField::Hips => &self.hips,
            MeasurementField::ThighTop => &self.thigh_top,
            MeasurementField::MidThigh => &self.mid_thigh,
            MeasurementField::Knee => &self.knee,
            MeasurementField::Calf => &self.calf,
            MeasurementField::Ankle => &self.ankle,
        }
    }

    fn slot(&mut self, field: MeasurementField) -> &mut String {
        match field {
            MeasurementField::Weight => &mut self.weight,
            MeasurementField::Neck => &mut self.neck,
            MeasurementField::Shoulders => &mut self.shoulders,
            MeasurementField::ChestBust => &mut self.chest_bust,
            MeasurementField::UpperArmBiceps => &mut self.upper_arm_biceps,
            MeasurementField::Forearm => &mut self.forearm,
            MeasurementField::Midsection => &mut self.midsection,
            MeasurementField::Waist => &mut self.waist,
            MeasurementField::Abdomen => &mut self.abdomen,
            MeasurementField::Hips => &mut self.hips,
            MeasurementField::ThighTop => &mut self.thigh_top,
            MeasurementField::MidThigh => &mut self.mid_thigh,
            MeasurementField::Knee => &mut self.knee,
            MeasurementField::Calf => &mut self.calf,
            MeasurementField::Ankle => &mut self.ankle,
        }
    }

    pub fn set(&mut self, field: MeasurementField, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }

    /// Copy with every field trimmed of surrounding whitespace.
    pub fn trimmed(&self) -> Self {
        let mut out = Self::default();
        for field in MeasurementField::ALL {
            out.set(field, self.get(field).trim());
        }
        out
    }

    /// True when every field is empty.
    pub fn is_empty(&self) -> bool {
        MeasurementField::ALL
            .into_iter()
            .all(|field| self.get(field).is_empty())
    }

    /// Build a record from an untyped JSON `metrics` object.
    ///
    /// Missing and `null` fields become `""`; any other non-string value
    /// for a known field is rejected. Unknown keys are ignored. Values are
    /// trimmed.
    pub fn from_json(metrics: &serde_json::Value) -> Result<Self, MeasurementError> {
        let mut out = Self::default();
        for field in MeasurementField::ALL {
            match metrics.get(field.key()) {
                None | Some(serde_json::Value::Null) => {}
                Some(serde_json::Value::String(value)) => out.set(field, value.trim()),
                Some(_) => return Err(MeasurementError::InvalidValue(field.key().to_owned())),
            }
        }
        Ok(out)
    }
}

/// Check that a week index is an integer >= 1.
pub fn validate_week_index(index: i64) -> Result<u32, MeasurementError> {
    u32::try_from(index)
        .ok()
        .filter(|week| *week >= 1)
        .ok_or(MeasurementError::InvalidWeekIndex(index))
}

/// Measurements keyed by 1-based week index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementsByWeek(BTreeMap<u32, WeeklyMeasurements>);

impl MeasurementsByWeek {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record for `week`.
    pub fn save(&mut self, week: u32, record: WeeklyMeasurements) {
        self.0.insert(week, record);
    }

    pub fn get(&self, week: u32) -> Option<&WeeklyMeasurements> {
        self.0.get(&week)
    }

    /// The stored record for `week`, or an empty one.
    pub fn for_week(&self, week: u32) -> WeeklyMeasurements {
        self.0.get(&week).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &WeeklyMeasurements)> {
        self.0.iter().map(|(week, record)| (*week, record))
    }
}

impl FromIterator<(u32, WeeklyMeasurements)> for MeasurementsByWeek {
    fn from_iter<I: IntoIterator<Item = (u32, WeeklyMeasurements)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn field_keys_round_trip_through_from_str() {
        for field in MeasurementField::ALL {
            assert_eq!(field.key().parse::<MeasurementField>(), Ok(field));
        }
        assert_eq!(
            "elbow".parse::<MeasurementField>(),
            Err(MeasurementError::UnknownField("elbow".to_owned()))
        );
    }

    #[test]
    fn groups_match_the_check_in_form() {
        let count = |group| {
            MeasurementField::ALL
                .into_iter()
                .filter(|f| f.group() == group)
                .count()
        };
        assert_eq!(count(MeasurementGroup::General), 1);
        assert_eq!(count(MeasurementGroup::UpperBody), 9);
        assert_eq!(count(MeasurementGroup::LowerBody), 5);
    }

    #[test]
    fn columns_are_snake_case() {
        assert_eq!(MeasurementField::ChestBust.column(), "chest_bust");
        assert_eq!(MeasurementField::UpperArmBiceps.column(), "upper_arm_biceps");
        assert_eq!(MeasurementField::Waist.column(), "waist");
    }

    #[test]
    fn missing_json_fields_default_to_empty() {
        let record: WeeklyMeasurements = serde_json::from_value(json!({ "weight": "68 kg" })).unwrap();
        assert_eq!(record.weight, "68 kg");
        assert_eq!(record.ankle, "");
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["chestBust"], "");
    }

    #[test]
    fn from_json_trims_and_rejects_non_strings() {
        let record =
            WeeklyMeasurements::from_json(&json!({ "waist": "  80 cm ", "knee": null, "extra": 3 }))
                .unwrap();
        assert_eq!(record.waist, "80 cm");
        assert_eq!(record.knee, "");

        let err = WeeklyMeasurements::from_json(&json!({ "calf": 38 })).unwrap_err();
        assert_eq!(err, MeasurementError::InvalidValue("calf".to_owned()));
    }

    #[test]
    fn trimmed_trims_every_field() {
        let mut record = WeeklyMeasurements::default();
        record.set(MeasurementField::Neck, " 38 ");
        record.set(MeasurementField::Hips, "\t95\n");
        let trimmed = record.trimmed();
        assert_eq!(trimmed.neck, "38");
        assert_eq!(trimmed.hips, "95");
    }

    #[test]
    fn week_index_must_be_positive() {
        assert_eq!(validate_week_index(1), Ok(1));
        assert_eq!(validate_week_index(12), Ok(12));
        assert_eq!(validate_week_index(0), Err(MeasurementError::InvalidWeekIndex(0)));
        assert_eq!(validate_week_index(-3), Err(MeasurementError::InvalidWeekIndex(-3)));
    }

    #[test]
    fn save_overwrites_the_whole_record() {
        let mut by_week = MeasurementsByWeek::new();
        let mut first = WeeklyMeasurements::default();
        first.weight = "70".to_owned();
        first.neck = "38".to_owned();
        by_week.save(1, first);

        let mut second = WeeklyMeasurements::default();
        second.weight = "69".to_owned();
        by_week.save(1, second);

        let stored = by_week.for_week(1);
        assert_eq!(stored.weight, "69");
        assert_eq!(stored.neck, "", "fields are not merged");
        assert!(by_week.for_week(2).is_empty());
    }

    #[test]
    fn json_keys_are_week_numbers() {
        let mut by_week = MeasurementsByWeek::new();
        by_week.save(3, WeeklyMeasurements::default());
        let json = serde_json::to_value(&by_week).unwrap();
        assert!(json.get("3").is_some());
        let back: MeasurementsByWeek = serde_json::from_value(json).unwrap();
        assert_eq!(back, by_week);
    }
}
