use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::services::campaign_service::{self, CampaignView, NewCampaignInput};
use crate::services::reward_service::{self, CampaignCompletion};
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn create_campaign_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
    Json(input): Json<NewCampaignInput>,
) -> Result<impl IntoResponse, AppError> {
    let campaign =
        campaign_service::create_campaign(&pool, &auth_user.id, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_campaign_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(campaign_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<Json<CampaignView>, AppError> {
    campaign_service::get_campaign(&pool, &campaign_id)
        .await
        .map(Json)
}

pub async fn delete_campaign_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(campaign_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<StatusCode, AppError> {
    campaign_service::delete_campaign(&pool, &auth_user.id, &campaign_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CompleteCampaignBody {
    #[serde(default)]
    pub proof_images: Vec<String>,
}

pub async fn complete_campaign_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(campaign_id): Path<String>,
    State(pool): State<SqlitePool>,
    Json(body): Json<CompleteCampaignBody>,
) -> Result<Json<CampaignCompletion>, AppError> {
    reward_service::complete_campaign(
        &pool,
        &campaign_id,
        &auth_user.id,
        &body.proof_images,
        Utc::now(),
    )
    .await
    .map(Json)
}
