use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::UserRole;
use crate::services::campaign_service::CampaignView;
use crate::services::campaign_status_service::{self, ReviewDecision, TransitionReport};
use crate::services::require_role;
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct ReviewCampaignBody {
    pub decision: ReviewDecision,
}

pub async fn review_campaign_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(campaign_id): Path<String>,
    State(pool): State<SqlitePool>,
    Json(body): Json<ReviewCampaignBody>,
) -> Result<Json<CampaignView>, AppError> {
    campaign_status_service::review_campaign(
        &pool,
        &auth_user.id,
        &campaign_id,
        body.decision,
        Utc::now(),
    )
    .await
    .map(Json)
}

// Normally driven by the auto_transition_campaigns binary from cron.
pub async fn auto_transition_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
) -> Result<Json<TransitionReport>, AppError> {
    require_role(&pool, &auth_user.id, UserRole::Admin, "only admins can run transitions").await?;
    campaign_status_service::auto_transition_campaigns(&pool, Utc::now())
        .await
        .map(Json)
}
