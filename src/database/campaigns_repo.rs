use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::models::{CampaignStatus, CampaignsRow};

const SQL_INSERT_CAMPAIGN: &str = r#"
INSERT INTO campaigns (
  campaign_id,
  organization_id,
  title,
  description,
  district,
  start_date,
  end_date,
  target_volunteers,
  max_volunteers,
  current_volunteers,
  status,
  proof_images,
  created_at,
  updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 'PENDING', '[]', ?10, ?10)
"#;

pub struct NewCampaign<'a> {
    pub campaign_id: &'a str,
    pub organization_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub district: &'a str,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_volunteers: i64,
    pub max_volunteers: i64,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_campaign(
    executor: impl SqliteExecutor<'_>,
    campaign: NewCampaign<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_CAMPAIGN)
        .bind(campaign.campaign_id)
        .bind(campaign.organization_id)
        .bind(campaign.title)
        .bind(campaign.description)
        .bind(campaign.district)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(campaign.target_volunteers)
        .bind(campaign.max_volunteers)
        .bind(campaign.created_at)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_CAMPAIGN_BY_ID: &str = r#"
SELECT
  campaign_id,
  organization_id,
  title,
  description,
  district,
  start_date,
  end_date,
  target_volunteers,
  max_volunteers,
  current_volunteers,
  status,
  proof_images,
  done_at,
  created_at,
  updated_at
FROM campaigns
WHERE campaign_id = ?1
LIMIT 1
"#;

pub async fn load_campaign_by_id(
    executor: impl SqliteExecutor<'_>,
    campaign_id: &str,
) -> sqlx::Result<Option<CampaignsRow>> {
    sqlx::query_as::<_, CampaignsRow>(SQL_LOAD_CAMPAIGN_BY_ID)
        .bind(campaign_id)
        .fetch_optional(executor)
        .await
}

// The capacity guard lives in the statement: the increment never pushes
// current_volunteers past max_volunteers, whatever the caller read before.
const SQL_TAKE_SEAT: &str = r#"
UPDATE campaigns
SET current_volunteers = current_volunteers + 1,
    updated_at = ?2
WHERE campaign_id = ?1
  AND status IN ('APPROVED', 'ONGOING')
  AND current_volunteers < max_volunteers
"#;

pub async fn take_seat(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_TAKE_SEAT)
        .bind(campaign_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_RELEASE_SEAT: &str = r#"
UPDATE campaigns
SET current_volunteers = current_volunteers - 1,
    updated_at = ?2
WHERE campaign_id = ?1
  AND current_volunteers > 0
"#;

pub async fn release_seat(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_RELEASE_SEAT)
        .bind(campaign_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_REVIEW_CAMPAIGN: &str = r#"
UPDATE campaigns
SET status = ?2,
    updated_at = ?3
WHERE campaign_id = ?1
  AND status = 'PENDING'
"#;

/// Moves a PENDING campaign to `decision`. Returns 0 when the campaign was not pending.
pub async fn review_campaign(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    decision: CampaignStatus,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_REVIEW_CAMPAIGN)
        .bind(campaign_id)
        .bind(decision)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_MARK_COMPLETED: &str = r#"
UPDATE campaigns
SET status = 'COMPLETED',
    proof_images = ?2,
    done_at = COALESCE(done_at, ?3),
    updated_at = ?3
WHERE campaign_id = ?1
  AND status IN ('APPROVED', 'ONGOING', 'COMPLETED')
"#;

pub async fn mark_completed(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    proof_images_json: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_COMPLETED)
        .bind(campaign_id)
        .bind(proof_images_json)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_CAMPAIGN: &str = r#"
DELETE FROM campaigns
WHERE campaign_id = ?1
  AND NOT EXISTS (
    SELECT 1 FROM campaign_registrations r WHERE r.campaign_id = ?1
  )
"#;

pub async fn delete_campaign(conn: &mut SqliteConnection, campaign_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_CAMPAIGN)
        .bind(campaign_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DueCampaignRow {
    pub campaign_id: String,
    pub due_at: DateTime<Utc>,
}

// julianday() resolves to milliseconds. Candidates carry one second of slack; the exact
// `due_at <= now` check runs on the decoded rows.
const SQL_LIST_START_CANDIDATES: &str = r#"
SELECT
  campaign_id,
  start_date AS due_at
FROM campaigns
WHERE status = 'APPROVED'
  AND julianday(start_date) <= julianday(?1, '+1 seconds')
ORDER BY julianday(start_date) ASC, campaign_id ASC
"#;

pub async fn list_start_candidates(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> sqlx::Result<Vec<DueCampaignRow>> {
    sqlx::query_as::<_, DueCampaignRow>(SQL_LIST_START_CANDIDATES)
        .bind(now)
        .fetch_all(conn)
        .await
}

const SQL_START_CAMPAIGN: &str = r#"
UPDATE campaigns
SET status = 'ONGOING',
    updated_at = ?2
WHERE campaign_id = ?1
  AND status = 'APPROVED'
"#;

/// APPROVED -> ONGOING. Returns 0 when the campaign is no longer APPROVED.
pub async fn start_campaign(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_START_CAMPAIGN)
        .bind(campaign_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_FINISH_CANDIDATES: &str = r#"
SELECT
  campaign_id,
  end_date AS due_at
FROM campaigns
WHERE status = 'ONGOING'
  AND end_date IS NOT NULL
  AND julianday(end_date) <= julianday(?1, '+1 seconds')
ORDER BY julianday(end_date) ASC, campaign_id ASC
"#;

pub async fn list_finish_candidates(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> sqlx::Result<Vec<DueCampaignRow>> {
    sqlx::query_as::<_, DueCampaignRow>(SQL_LIST_FINISH_CANDIDATES)
        .bind(now)
        .fetch_all(conn)
        .await
}

const SQL_FINISH_CAMPAIGN: &str = r#"
UPDATE campaigns
SET status = 'COMPLETED',
    done_at = COALESCE(done_at, ?2),
    updated_at = ?2
WHERE campaign_id = ?1
  AND status = 'ONGOING'
"#;

/// ONGOING -> COMPLETED. Returns 0 when the campaign is no longer ONGOING.
pub async fn finish_campaign(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_FINISH_CAMPAIGN)
        .bind(campaign_id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CounterDriftRow {
    pub campaign_id: String,
    pub current_volunteers: i64,
    pub registration_count: i64,
}

const SQL_LIST_COUNTER_DRIFT: &str = r#"
SELECT
  c.campaign_id,
  c.current_volunteers,
  COUNT(r.registration_id) AS registration_count
FROM campaigns c
LEFT JOIN campaign_registrations r
  ON r.campaign_id = c.campaign_id
  AND r.status IN ('REGISTERED', 'ATTENDED')
GROUP BY c.campaign_id, c.current_volunteers
HAVING c.current_volunteers != COUNT(r.registration_id)
ORDER BY c.campaign_id
"#;

/// Campaigns whose denormalized volunteer counter disagrees with the registration ledger.
pub async fn list_counter_drift(
    executor: impl SqliteExecutor<'_>,
) -> sqlx::Result<Vec<CounterDriftRow>> {
    sqlx::query_as::<_, CounterDriftRow>(SQL_LIST_COUNTER_DRIFT)
        .fetch_all(executor)
        .await
}
