use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{self, campaigns_repo, point_history_repo, registrations_repo, users_repo};
use crate::error::{AppError, AppResult};
use crate::models::{PointHistoryRow, PointSource};
use crate::services::campaign_service::CampaignView;

pub const CAMPAIGN_AWARD_POINTS: i64 = 10;
pub const HELP_REQUEST_AWARD_POINTS: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CampaignCompletion {
    pub message: String,
    pub campaign: CampaignView,
    pub volunteers_awarded: usize,
    pub already_awarded: usize,
    pub failed_awards: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolunteerPoints {
    pub volunteer_id: String,
    pub balance: i64,
    pub history: Vec<PointHistoryRow>,
}

/// Appends the CAMPAIGN ledger row and credits the balance, at most once per
/// (volunteer, campaign). Returns whether points were newly awarded.
pub(crate) async fn award_campaign_points(
    conn: &mut SqliteConnection,
    volunteer_id: &str,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<bool> {
    let id = Uuid::new_v4().to_string();
    award_points(
        conn,
        point_history_repo::NewPointAward {
            point_history_id: &id,
            volunteer_id,
            points: CAMPAIGN_AWARD_POINTS,
            source: PointSource::Campaign,
            campaign_id: Some(campaign_id),
            help_request_id: None,
            created_at: now,
        },
    )
    .await
}

async fn award_points(
    conn: &mut SqliteConnection,
    award: point_history_repo::NewPointAward<'_>,
) -> sqlx::Result<bool> {
    let volunteer_id = award.volunteer_id;
    let points = award.points;
    if point_history_repo::insert_award_if_absent(&mut *conn, award).await? == 0 {
        return Ok(false);
    }
    users_repo::add_points(conn, volunteer_id, points).await?;
    Ok(true)
}

pub async fn add_points_for_campaign(
    pool: &SqlitePool,
    volunteer_id: &str,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    let mut tx = database::begin_write(pool).await?;
    let awarded = award_campaign_points(&mut tx, volunteer_id, campaign_id, now).await?;
    tx.commit().await?;

    if awarded {
        info!(
            volunteer_id = %volunteer_id,
            campaign_id = %campaign_id,
            points = CAMPAIGN_AWARD_POINTS,
            "campaign_points_awarded"
        );
    }
    Ok(awarded)
}

pub async fn add_points_for_help_request(
    pool: &SqlitePool,
    volunteer_id: &str,
    help_request_id: &str,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    let id = Uuid::new_v4().to_string();
    let mut tx = database::begin_write(pool).await?;
    let awarded = award_points(
        &mut tx,
        point_history_repo::NewPointAward {
            point_history_id: &id,
            volunteer_id,
            points: HELP_REQUEST_AWARD_POINTS,
            source: PointSource::HelpRequest,
            campaign_id: None,
            help_request_id: Some(help_request_id),
            created_at: now,
        },
    )
    .await?;
    tx.commit().await?;

    if awarded {
        info!(
            volunteer_id = %volunteer_id,
            help_request_id = %help_request_id,
            points = HELP_REQUEST_AWARD_POINTS,
            "help_request_points_awarded"
        );
    }
    Ok(awarded)
}

/// Marks a campaign COMPLETED with its proof images, then awards every registered or
/// attended volunteer. Awards run one by one in their own transactions; a failed award
/// is logged and counted, and calling this again retries only the volunteers still
/// missing their ledger row.
pub async fn complete_campaign(
    pool: &SqlitePool,
    campaign_id: &str,
    organization_id: &str,
    proof_image_urls: &[String],
    now: DateTime<Utc>,
) -> AppResult<CampaignCompletion> {
    let mut tx = database::begin_write(pool).await?;

    let campaign = campaigns_repo::load_campaign_by_id(&mut *tx, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;
    if campaign.organization_id != organization_id {
        return Err(AppError::Forbidden("campaign belongs to another organization"));
    }

    let proof_images: Vec<&str> = proof_image_urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect();
    if proof_images.is_empty() {
        return Err(AppError::BadRequest(
            "at least one proof image is required to complete a campaign".into(),
        ));
    }

    let proof_images_json = serde_json::to_string(&proof_images)
        .map_err(|e| AppError::BadRequest(format!("invalid proof images: {e}")))?;
    if campaigns_repo::mark_completed(&mut tx, campaign_id, &proof_images_json, now).await? == 0 {
        return Err(AppError::Conflict(format!(
            "campaign in status {} cannot be completed",
            campaign.status
        )));
    }
    tx.commit().await?;

    let registrations = registrations_repo::list_for_campaign(pool, campaign_id).await?;
    let mut volunteers_awarded = 0;
    let mut already_awarded = 0;
    let mut failed_awards = 0;
    for registration in &registrations {
        match add_points_for_campaign(pool, &registration.volunteer_id, campaign_id, now).await {
            Ok(true) => volunteers_awarded += 1,
            Ok(false) => already_awarded += 1,
            Err(e) => {
                warn!(
                    campaign_id = %campaign_id,
                    volunteer_id = %registration.volunteer_id,
                    error = %e,
                    "campaign completion award failed"
                );
                failed_awards += 1;
            }
        }
    }

    let campaign = campaigns_repo::load_campaign_by_id(pool, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    info!(
        campaign_id = %campaign_id,
        registrations = registrations.len(),
        volunteers_awarded,
        already_awarded,
        failed_awards,
        "campaign_completed"
    );

    Ok(CampaignCompletion {
        message: "Campaign completed".to_string(),
        campaign: CampaignView::from(campaign),
        volunteers_awarded,
        already_awarded,
        failed_awards,
    })
}

pub async fn get_volunteer_points(
    pool: &SqlitePool,
    volunteer_id: &str,
) -> AppResult<VolunteerPoints> {
    let user = users_repo::load_user(pool, volunteer_id)
        .await?
        .ok_or(AppError::NotFound("Volunteer"))?;
    let history = point_history_repo::list_for_volunteer(pool, volunteer_id).await?;
    Ok(VolunteerPoints {
        volunteer_id: user.user_id,
        balance: user.points,
        history,
    })
}
