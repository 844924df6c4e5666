use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::models::{CampaignRegistrationsRow, RegistrationStatus};

const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO campaign_registrations (
  registration_id,
  campaign_id,
  volunteer_id,
  status,
  notes,
  registered_at,
  updated_at
) VALUES (?1, ?2, ?3, 'REGISTERED', ?4, ?5, ?5)
"#;

pub struct NewCampaignRegistration<'a> {
    pub registration_id: &'a str,
    pub campaign_id: &'a str,
    pub volunteer_id: &'a str,
    pub notes: Option<&'a str>,
    pub registered_at: DateTime<Utc>,
}

pub async fn insert_registration(
    conn: &mut SqliteConnection,
    registration: NewCampaignRegistration<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_REGISTRATION)
        .bind(registration.registration_id)
        .bind(registration.campaign_id)
        .bind(registration.volunteer_id)
        .bind(registration.notes)
        .bind(registration.registered_at)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_REGISTRATION: &str = r#"
SELECT
  registration_id,
  campaign_id,
  volunteer_id,
  status,
  notes,
  registered_at,
  updated_at
FROM campaign_registrations
WHERE campaign_id = ?1
  AND volunteer_id = ?2
LIMIT 1
"#;

pub async fn load_registration(
    executor: impl SqliteExecutor<'_>,
    campaign_id: &str,
    volunteer_id: &str,
) -> sqlx::Result<Option<CampaignRegistrationsRow>> {
    sqlx::query_as::<_, CampaignRegistrationsRow>(SQL_LOAD_REGISTRATION)
        .bind(campaign_id)
        .bind(volunteer_id)
        .fetch_optional(executor)
        .await
}

const SQL_LOAD_REGISTRATION_BY_ID: &str = r#"
SELECT
  registration_id,
  campaign_id,
  volunteer_id,
  status,
  notes,
  registered_at,
  updated_at
FROM campaign_registrations
WHERE registration_id = ?1
LIMIT 1
"#;

pub async fn load_registration_by_id(
    executor: impl SqliteExecutor<'_>,
    registration_id: &str,
) -> sqlx::Result<Option<CampaignRegistrationsRow>> {
    sqlx::query_as::<_, CampaignRegistrationsRow>(SQL_LOAD_REGISTRATION_BY_ID)
        .bind(registration_id)
        .fetch_optional(executor)
        .await
}

const SQL_DELETE_REGISTRATION: &str = r#"
DELETE FROM campaign_registrations
WHERE registration_id = ?1
"#;

pub async fn delete_registration(
    conn: &mut SqliteConnection,
    registration_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_REGISTRATION)
        .bind(registration_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_UPDATE_REGISTRATION_STATUS: &str = r#"
UPDATE campaign_registrations
SET status = ?2,
    updated_at = ?3
WHERE registration_id = ?1
"#;

pub async fn update_registration_status(
    conn: &mut SqliteConnection,
    registration_id: &str,
    status: RegistrationStatus,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_REGISTRATION_STATUS)
        .bind(registration_id)
        .bind(status)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_FOR_CAMPAIGN: &str = r#"
SELECT
  registration_id,
  campaign_id,
  volunteer_id,
  status,
  notes,
  registered_at,
  updated_at
FROM campaign_registrations
WHERE campaign_id = ?1
ORDER BY julianday(registered_at) ASC, registration_id ASC
"#;

pub async fn list_for_campaign(
    executor: impl SqliteExecutor<'_>,
    campaign_id: &str,
) -> sqlx::Result<Vec<CampaignRegistrationsRow>> {
    sqlx::query_as::<_, CampaignRegistrationsRow>(SQL_LIST_FOR_CAMPAIGN)
        .bind(campaign_id)
        .fetch_all(executor)
        .await
}

const SQL_LIST_FOR_VOLUNTEER: &str = r#"
SELECT
  registration_id,
  campaign_id,
  volunteer_id,
  status,
  notes,
  registered_at,
  updated_at
FROM campaign_registrations
WHERE volunteer_id = ?1
ORDER BY julianday(registered_at) DESC, registration_id ASC
"#;

pub async fn list_for_volunteer(
    executor: impl SqliteExecutor<'_>,
    volunteer_id: &str,
) -> sqlx::Result<Vec<CampaignRegistrationsRow>> {
    sqlx::query_as::<_, CampaignRegistrationsRow>(SQL_LIST_FOR_VOLUNTEER)
        .bind(volunteer_id)
        .fetch_all(executor)
        .await
}

const SQL_COUNT_FOR_CAMPAIGN: &str = r#"
SELECT COUNT(*)
FROM campaign_registrations
WHERE campaign_id = ?1
"#;

pub async fn count_for_campaign(
    executor: impl SqliteExecutor<'_>,
    campaign_id: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_FOR_CAMPAIGN)
        .bind(campaign_id)
        .fetch_one(executor)
        .await
}
