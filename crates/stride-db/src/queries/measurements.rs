//! Database query functions for the `weekly_measurements` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use stride_core::measurements::{MeasurementField, WeeklyMeasurements};

use crate::models::MeasurementRow;

// Value columns are listed in `MeasurementField::ALL` order; binds follow
// the same order.
const UPSERT_SQL: &str = "INSERT INTO weekly_measurements \
     (user_id, week_index, weight, neck, shoulders, chest_bust, upper_arm_biceps, \
      forearm, midsection, waist, abdomen, hips, thigh_top, mid_thigh, knee, calf, ankle) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
     ON CONFLICT (user_id, week_index) DO UPDATE SET \
     weight = EXCLUDED.weight, neck = EXCLUDED.neck, shoulders = EXCLUDED.shoulders, \
     chest_bust = EXCLUDED.chest_bust, upper_arm_biceps = EXCLUDED.upper_arm_biceps, \
     forearm = EXCLUDED.forearm, midsection = EXCLUDED.midsection, waist = EXCLUDED.waist, \
     abdomen = EXCLUDED.abdomen, hips = EXCLUDED.hips, thigh_top = EXCLUDED.thigh_top, \
     mid_thigh = EXCLUDED.mid_thigh, knee = EXCLUDED.knee, calf = EXCLUDED.calf, \
     ankle = EXCLUDED.ankle, updated_at = now()";

/// All measurement rows for a user, ordered by week.
pub async fn list_measurements(pool: &PgPool, user_id: Uuid) -> Result<Vec<MeasurementRow>> {
    let rows = sqlx::query_as::<_, MeasurementRow>(
        "SELECT * FROM weekly_measurements \
         WHERE user_id = $1 \
         ORDER BY week_index",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list measurements for user {user_id}"))?;

    Ok(rows)
}

/// Insert or replace the whole record for `(user_id, week)`.
pub async fn upsert_measurements(
    pool: &PgPool,
    user_id: Uuid,
    week: u32,
    record: &WeeklyMeasurements,
) -> Result<()> {
    let week_index = i32::try_from(week).context("week index out of range")?;

    let mut query = sqlx::query(UPSERT_SQL).bind(user_id).bind(week_index);
    for field in MeasurementField::ALL {
        query = query.bind(record.get(field));
    }

    query.execute(pool).await.with_context(|| {
        format!("failed to upsert measurements for user {user_id} week {week}")
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_columns_follow_field_order() {
        let start = UPSERT_SQL.find("(user_id, week_index, ").unwrap();
        let end = start + UPSERT_SQL[start..].find(')').unwrap();
        let columns: Vec<&str> = UPSERT_SQL[start + 1..end]
            .split(',')
            .map(str::trim)
            .skip(2)
            .collect();
        let expected: Vec<&str> = MeasurementField::ALL.iter().map(|f| f.column()).collect();
        assert_eq!(columns, expected);
    }

    #[test]
    fn every_column_is_updated_on_conflict() {
        for field in MeasurementField::ALL {
            let clause = format!("{0} = EXCLUDED.{0}", field.column());
            assert!(UPSERT_SQL.contains(&clause), "missing {clause}");
        }
    }
}
