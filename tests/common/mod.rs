#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use volunteer::database::{self, campaigns_repo, users_repo};
use volunteer::models::{CampaignStatus, UserRole};

/// Fresh in-memory database with the schema applied. A single connection keeps
/// the database alive for the whole test.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    database::migrate(&pool).await.unwrap();
    pool
}

pub async fn seed_user(pool: &SqlitePool, role: UserRole) -> String {
    let id = format!("user-{}", Uuid::new_v4());
    users_repo::upsert_user(pool, &id, Some("Test User"), role)
        .await
        .unwrap();
    id
}

pub struct CampaignSeed {
    pub status: CampaignStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_volunteers: i64,
    pub max_volunteers: i64,
}

impl CampaignSeed {
    /// Approved, starting tomorrow, ten seats.
    pub fn open() -> Self {
        CampaignSeed {
            status: CampaignStatus::Approved,
            start_date: Utc::now() + Duration::days(1),
            end_date: Some(Utc::now() + Duration::days(2)),
            target_volunteers: 5,
            max_volunteers: 10,
        }
    }

    pub fn with_seats(mut self, max_volunteers: i64) -> Self {
        self.target_volunteers = self.target_volunteers.min(max_volunteers);
        self.max_volunteers = max_volunteers;
        self
    }

    pub fn with_status(mut self, status: CampaignStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_window(mut self, start_date: DateTime<Utc>, end_date: Option<DateTime<Utc>>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }
}

/// Inserts a campaign directly, bypassing create-time validation so tests can
/// place it in any status or time window.
pub async fn seed_campaign(pool: &SqlitePool, organization_id: &str, seed: CampaignSeed) -> String {
    let campaign_id = format!("campaign-{}", Uuid::new_v4());
    campaigns_repo::insert_campaign(
        pool,
        campaigns_repo::NewCampaign {
            campaign_id: &campaign_id,
            organization_id,
            title: "Beach cleanup",
            description: None,
            district: "District 1",
            start_date: seed.start_date,
            end_date: seed.end_date,
            target_volunteers: seed.target_volunteers,
            max_volunteers: seed.max_volunteers,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    sqlx::query("UPDATE campaigns SET status = ?1 WHERE campaign_id = ?2")
        .bind(seed.status)
        .bind(&campaign_id)
        .execute(pool)
        .await
        .unwrap();
    campaign_id
}

pub async fn current_volunteers(pool: &SqlitePool, campaign_id: &str) -> i64 {
    campaigns_repo::load_campaign_by_id(pool, campaign_id)
        .await
        .unwrap()
        .unwrap()
        .current_volunteers
}

pub async fn assert_counters_consistent(pool: &SqlitePool) {
    let drift = campaigns_repo::list_counter_drift(pool).await.unwrap();
    assert!(drift.is_empty(), "counter drift: {:?}", drift);
}
