use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::models::{PointHistoryRow, PointSource};

// The partial unique indexes on (volunteer_id, campaign_id) and
// (volunteer_id, help_request_id) turn a repeated award into a no-op.
const SQL_INSERT_AWARD_IF_ABSENT: &str = r#"
INSERT OR IGNORE INTO point_history (
  point_history_id,
  volunteer_id,
  points,
  source,
  campaign_id,
  help_request_id,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub struct NewPointAward<'a> {
    pub point_history_id: &'a str,
    pub volunteer_id: &'a str,
    pub points: i64,
    pub source: PointSource,
    pub campaign_id: Option<&'a str>,
    pub help_request_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Returns 1 when the row was appended, 0 when an award for the same source already exists.
pub async fn insert_award_if_absent(
    conn: &mut SqliteConnection,
    award: NewPointAward<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_AWARD_IF_ABSENT)
        .bind(award.point_history_id)
        .bind(award.volunteer_id)
        .bind(award.points)
        .bind(award.source)
        .bind(award.campaign_id)
        .bind(award.help_request_id)
        .bind(award.created_at)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_FOR_VOLUNTEER: &str = r#"
SELECT
  point_history_id,
  volunteer_id,
  points,
  source,
  campaign_id,
  help_request_id,
  created_at
FROM point_history
WHERE volunteer_id = ?1
ORDER BY julianday(created_at) DESC, point_history_id ASC
"#;

pub async fn list_for_volunteer(
    executor: impl SqliteExecutor<'_>,
    volunteer_id: &str,
) -> sqlx::Result<Vec<PointHistoryRow>> {
    sqlx::query_as::<_, PointHistoryRow>(SQL_LIST_FOR_VOLUNTEER)
        .bind(volunteer_id)
        .fetch_all(executor)
        .await
}
