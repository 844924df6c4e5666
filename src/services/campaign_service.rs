use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::{self, campaigns_repo, registrations_repo};
use crate::error::{AppError, AppResult};
use crate::models::{CampaignStatus, CampaignsRow, UserRole};
use crate::services::require_role;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaignInput {
    pub title: String,
    pub description: Option<String>,
    pub district: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_volunteers: i64,
    pub max_volunteers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignView {
    pub campaign_id: String,
    pub organization_id: String,
    pub title: String,
    pub description: Option<String>,
    pub district: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_volunteers: i64,
    pub max_volunteers: i64,
    pub current_volunteers: i64,
    pub seats_left: i64,
    pub is_full: bool,
    pub status: CampaignStatus,
    pub proof_images: Vec<String>,
    pub done_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CampaignsRow> for CampaignView {
    fn from(row: CampaignsRow) -> Self {
        let proof_images = row.proof_image_urls();
        let is_full = row.is_full();
        CampaignView {
            seats_left: (row.max_volunteers - row.current_volunteers).max(0),
            is_full,
            proof_images,
            campaign_id: row.campaign_id,
            organization_id: row.organization_id,
            title: row.title,
            description: row.description,
            district: row.district,
            start_date: row.start_date,
            end_date: row.end_date,
            target_volunteers: row.target_volunteers,
            max_volunteers: row.max_volunteers,
            current_volunteers: row.current_volunteers,
            status: row.status,
            done_at: row.done_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn create_campaign(
    pool: &SqlitePool,
    organization_id: &str,
    input: NewCampaignInput,
    now: DateTime<Utc>,
) -> AppResult<CampaignView> {
    require_role(
        pool,
        organization_id,
        UserRole::Organization,
        "only organizations can create campaigns",
    )
    .await?;
    validate_new_campaign(&input, now)?;

    let campaign_id = Uuid::new_v4().to_string();
    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    campaigns_repo::insert_campaign(
        pool,
        campaigns_repo::NewCampaign {
            campaign_id: &campaign_id,
            organization_id,
            title: input.title.trim(),
            description,
            district: input.district.trim(),
            start_date: input.start_date,
            end_date: input.end_date,
            target_volunteers: input.target_volunteers,
            max_volunteers: input.max_volunteers,
            created_at: now,
        },
    )
    .await?;

    info!(
        campaign_id = %campaign_id,
        organization_id = %organization_id,
        max_volunteers = input.max_volunteers,
        "campaign_created"
    );

    get_campaign(pool, &campaign_id).await
}

fn validate_new_campaign(input: &NewCampaignInput, now: DateTime<Utc>) -> AppResult<()> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    if input.district.trim().is_empty() {
        return Err(AppError::BadRequest("district is required".into()));
    }
    if input.target_volunteers < 1 {
        return Err(AppError::BadRequest(
            "target_volunteers must be at least 1".into(),
        ));
    }
    if input.max_volunteers < input.target_volunteers {
        return Err(AppError::BadRequest(
            "max_volunteers must be greater than or equal to target_volunteers".into(),
        ));
    }
    if input.start_date <= now {
        return Err(AppError::BadRequest(
            "start_date must be in the future".into(),
        ));
    }
    if let Some(end_date) = input.end_date {
        if end_date <= input.start_date {
            return Err(AppError::BadRequest(
                "end_date must be after start_date".into(),
            ));
        }
    }
    Ok(())
}

pub async fn get_campaign(pool: &SqlitePool, campaign_id: &str) -> AppResult<CampaignView> {
    campaigns_repo::load_campaign_by_id(pool, campaign_id)
        .await?
        .map(CampaignView::from)
        .ok_or(AppError::NotFound("Campaign"))
}

/// Deletes a campaign owned by `organization_id`. Campaigns that still carry
/// registrations are never deleted.
pub async fn delete_campaign(
    pool: &SqlitePool,
    organization_id: &str,
    campaign_id: &str,
) -> AppResult<()> {
    let mut tx = database::begin_write(pool).await?;

    let campaign = campaigns_repo::load_campaign_by_id(&mut *tx, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;
    if campaign.organization_id != organization_id {
        return Err(AppError::Forbidden("campaign belongs to another organization"));
    }

    let registrations = registrations_repo::count_for_campaign(&mut *tx, campaign_id).await?;
    if registrations > 0 {
        return Err(AppError::Conflict(format!(
            "campaign has {registrations} registration(s) and cannot be deleted"
        )));
    }

    let deleted = campaigns_repo::delete_campaign(&mut tx, campaign_id).await?;
    if deleted == 0 {
        return Err(AppError::Conflict("campaign could not be deleted".into()));
    }
    tx.commit().await?;

    info!(campaign_id = %campaign_id, "campaign_deleted");
    Ok(())
}
