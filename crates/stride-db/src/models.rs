//! Row types for the stride tables and their conversions into core types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use stride_core::measurements::WeeklyMeasurements;
use stride_core::store::{Session, User, UserCredentials};

/// A row of `app_users`.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
        }
    }
}

impl From<UserRow> for UserCredentials {
    fn from(row: UserRow) -> Self {
        let password_hash = row.password_hash.clone();
        Self {
            user: row.into_user(),
            password_hash,
        }
    }
}

/// A row of `app_sessions`.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub token_digest: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            token_digest: row.token_digest,
            user_id: row.user_id,
            expires_at: row.expires_at,
        }
    }
}

/// A row of `workout_completions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CompletionRow {
    pub day_id: String,
    pub is_done: bool,
}

/// A row of `weekly_measurements`, without the owning user.
#[derive(Debug, Clone, FromRow)]
pub struct MeasurementRow {
    pub week_index: i32,
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

impl MeasurementRow {
    /// The 1-based week, or `None` for a row that violates the schema's
    /// `week_index >= 1` check.
    pub fn week(&self) -> Option<u32> {
        u32::try_from(self.week_index).ok().filter(|w| *w >= 1)
    }

    pub fn into_record(self) -> WeeklyMeasurements {
        WeeklyMeasurements {
            weight: self.weight,
            neck: self.neck,
            shoulders: self.shoulders,
            chest_bust: self.chest_bust,
            upper_arm_biceps: self.upper_arm_biceps,
            forearm: self.forearm,
            midsection: self.midsection,
            waist: self.waist,
            abdomen: self.abdomen,
            hips: self.hips,
            thigh_top: self.thigh_top,
            mid_thigh: self.mid_thigh,
            knee: self.knee,
            calf: self.calf,
            ankle: self.ankle,
        }
    }
}
