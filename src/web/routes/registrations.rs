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
use crate::models::{CampaignRegistrationsRow, RegistrationStatus};
use crate::services::registration_service::{self, CancellationResult};
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterBody {
    pub notes: Option<String>,
}

pub async fn register_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(campaign_id): Path<String>,
    State(pool): State<SqlitePool>,
    body: Option<Json<RegisterBody>>,
) -> Result<impl IntoResponse, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let registration = registration_service::register_campaign(
        &pool,
        &auth_user.id,
        &campaign_id,
        body.notes.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn cancel_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(campaign_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<Json<CancellationResult>, AppError> {
    registration_service::cancel_registration(&pool, &auth_user.id, &campaign_id, Utc::now())
        .await
        .map(Json)
}

pub async fn list_campaign_registrations_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(campaign_id): Path<String>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<CampaignRegistrationsRow>>, AppError> {
    registration_service::list_campaign_registrations(&pool, &auth_user.id, &campaign_id)
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct UpdateRegistrationStatusBody {
    pub status: RegistrationStatus,
}

pub async fn update_registration_status_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(registration_id): Path<String>,
    State(pool): State<SqlitePool>,
    Json(body): Json<UpdateRegistrationStatusBody>,
) -> Result<Json<CampaignRegistrationsRow>, AppError> {
    registration_service::update_registration_status(
        &pool,
        &auth_user.id,
        &registration_id,
        body.status,
        Utc::now(),
    )
    .await
    .map(Json)
}

pub async fn my_registrations_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<CampaignRegistrationsRow>>, AppError> {
    registration_service::list_volunteer_registrations(&pool, &auth_user.id)
        .await
        .map(Json)
}
