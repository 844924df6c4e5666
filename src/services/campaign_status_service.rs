use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::{self, campaigns_repo};
use crate::error::{AppError, AppResult};
use crate::models::{CampaignStatus, UserRole};
use crate::services::campaign_service::CampaignView;
use crate::services::require_role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    fn target_status(self) -> CampaignStatus {
        match self {
            ReviewDecision::Approve => CampaignStatus::Approved,
            ReviewDecision::Reject => CampaignStatus::Rejected,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct TransitionDetails {
    pub approved_to_ongoing: usize,
    pub ongoing_to_completed: usize,
    pub started_campaign_ids: Vec<String>,
    pub completed_campaign_ids: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct TransitionReport {
    pub total_updated: usize,
    pub details: TransitionDetails,
}

/// PENDING -> APPROVED | REJECTED, by an admin.
pub async fn review_campaign(
    pool: &SqlitePool,
    admin_id: &str,
    campaign_id: &str,
    decision: ReviewDecision,
    now: DateTime<Utc>,
) -> AppResult<CampaignView> {
    require_role(pool, admin_id, UserRole::Admin, "only admins can review campaigns").await?;

    let mut tx = database::begin_write(pool).await?;
    let campaign = campaigns_repo::load_campaign_by_id(&mut *tx, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    let target = decision.target_status();
    if campaigns_repo::review_campaign(&mut tx, campaign_id, target, now).await? == 0 {
        return Err(AppError::Conflict(format!(
            "campaign in status {} cannot move to {}",
            campaign.status, target
        )));
    }
    let reviewed = campaigns_repo::load_campaign_by_id(&mut *tx, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;
    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        admin_id = %admin_id,
        status = target.as_str(),
        "campaign_reviewed"
    );
    Ok(CampaignView::from(reviewed))
}

/// One pass of the time-driven lifecycle:
/// APPROVED -> ONGOING once `start_date` has passed, then
/// ONGOING -> COMPLETED once a set `end_date` has passed.
///
/// Both bulk updates share one transaction. A campaign whose whole window lies in the
/// past moves through both transitions in the same pass. Running it again with nothing
/// due updates nothing.
pub async fn auto_transition_campaigns(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> AppResult<TransitionReport> {
    let mut tx = database::begin_write(pool).await?;
    let mut started = Vec::new();
    for due in campaigns_repo::list_start_candidates(&mut tx, now).await? {
        if due.due_at > now {
            continue;
        }
        if campaigns_repo::start_campaign(&mut tx, &due.campaign_id, now).await? > 0 {
            started.push(due.campaign_id);
        }
    }
    let mut completed = Vec::new();
    for due in campaigns_repo::list_finish_candidates(&mut tx, now).await? {
        if due.due_at > now {
            continue;
        }
        if campaigns_repo::finish_campaign(&mut tx, &due.campaign_id, now).await? > 0 {
            completed.push(due.campaign_id);
        }
    }
    tx.commit().await?;

    let report = TransitionReport {
        total_updated: started.len() + completed.len(),
        details: TransitionDetails {
            approved_to_ongoing: started.len(),
            ongoing_to_completed: completed.len(),
            started_campaign_ids: started,
            completed_campaign_ids: completed,
        },
    };

    if report.total_updated > 0 {
        info!(
            approved_to_ongoing = report.details.approved_to_ongoing,
            ongoing_to_completed = report.details.ongoing_to_completed,
            "campaign_status_transitions_applied"
        );
    }
    Ok(report)
}
