//! The [`PlanDay`] record produced by the plan parser.

use serde::{Deserialize, Serialize};

/// One scheduled workout day from the plan file.
///
/// Every field is free-form text taken from the CSV cell; a missing cell
/// is stored as an empty string. The JSON form uses camelCase keys so it
/// matches what the HTTP API and guest state files carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    /// Display date, e.g. `2026-01-05` or `Jan 5`.
    pub date: String,
    /// Day label, usually a weekday name.
    pub day: String,
    /// Main workout text. May be `Heading: item, item`.
    pub main_workout: String,
    /// Plank focus, optional.
    #[serde(default)]
    pub plank_focus: String,
    /// Abs focus.
    #[serde(default)]
    pub abs_focus: String,
    /// Comma-separated lower-back items, optional.
    #[serde(default)]
    pub lower_back: String,
}

impl PlanDay {
    /// The identity key used by completion and measurement records.
    ///
    /// Formed as `"{date}-{day}"`. Two days with the same date and label
    /// share an identity and collide in any map keyed by it.
    pub fn id(&self) -> String {
        format!("{}-{}", self.date, self.day)
    }
}
