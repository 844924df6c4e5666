use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{self, campaigns_repo, registrations_repo};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{CampaignRegistrationsRow, RegistrationStatus, UserRole};
use crate::services::{require_role, reward_service};

const MAX_NOTES_LEN: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct CancellationResult {
    pub message: String,
}

/// Takes one seat in a campaign for `volunteer_id`.
///
/// Duplicate, status, window and capacity checks run in that order inside a single
/// write transaction; the seat counter is incremented by a guarded update in the
/// same transaction, so `current_volunteers` never exceeds `max_volunteers`.
pub async fn register_campaign(
    pool: &SqlitePool,
    volunteer_id: &str,
    campaign_id: &str,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<CampaignRegistrationsRow> {
    let notes = normalize_notes(notes)?;
    require_role(
        pool,
        volunteer_id,
        UserRole::Volunteer,
        "only volunteers can register for campaigns",
    )
    .await?;

    let mut tx = database::begin_write(pool).await?;

    let campaign = campaigns_repo::load_campaign_by_id(&mut *tx, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    if registrations_repo::load_registration(&mut *tx, campaign_id, volunteer_id)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateRegistration);
    }
    if !campaign.status.accepts_registrations() {
        return Err(AppError::InvalidCampaignState(campaign.status));
    }
    if now >= campaign.start_date {
        return Err(AppError::RegistrationWindowClosed);
    }
    if campaign.is_full() {
        return Err(AppError::CampaignFull);
    }

    if campaigns_repo::take_seat(&mut tx, campaign_id, now).await? == 0 {
        return Err(AppError::CampaignFull);
    }

    let registration_id = Uuid::new_v4().to_string();
    registrations_repo::insert_registration(
        &mut tx,
        registrations_repo::NewCampaignRegistration {
            registration_id: &registration_id,
            campaign_id,
            volunteer_id,
            notes,
            registered_at: now,
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateRegistration
        } else {
            AppError::Database(e)
        }
    })?;

    let registration = registrations_repo::load_registration_by_id(&mut *tx, &registration_id)
        .await?
        .ok_or(AppError::NotFound("Registration"))?;
    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        volunteer_id = %volunteer_id,
        seats_taken = campaign.current_volunteers + 1,
        max_volunteers = campaign.max_volunteers,
        "campaign_registration_created"
    );
    Ok(registration)
}

fn normalize_notes(notes: Option<&str>) -> AppResult<Option<&str>> {
    let notes = notes.map(str::trim).filter(|s| !s.is_empty());
    if let Some(n) = notes {
        if n.chars().count() > MAX_NOTES_LEN {
            return Err(AppError::BadRequest(format!(
                "notes must be at most {MAX_NOTES_LEN} characters"
            )));
        }
    }
    Ok(notes)
}

/// Gives the volunteer's seat back. Only allowed before the campaign starts.
pub async fn cancel_registration(
    pool: &SqlitePool,
    volunteer_id: &str,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> AppResult<CancellationResult> {
    let mut tx = database::begin_write(pool).await?;

    let registration = registrations_repo::load_registration(&mut *tx, campaign_id, volunteer_id)
        .await?
        .ok_or(AppError::NotFound("Registration"))?;
    let campaign = campaigns_repo::load_campaign_by_id(&mut *tx, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;

    if now >= campaign.start_date {
        return Err(AppError::RegistrationWindowClosed);
    }

    registrations_repo::delete_registration(&mut tx, &registration.registration_id).await?;
    if campaigns_repo::release_seat(&mut tx, campaign_id, now).await? == 0 {
        warn!(
            campaign_id = %campaign_id,
            registration_id = %registration.registration_id,
            "volunteer counter already at zero while a registration existed"
        );
        return Err(AppError::Conflict(
            "campaign volunteer counter is out of sync".into(),
        ));
    }
    tx.commit().await?;

    info!(
        campaign_id = %campaign_id,
        volunteer_id = %volunteer_id,
        "campaign_registration_cancelled"
    );
    Ok(CancellationResult {
        message: "Registration cancelled".to_string(),
    })
}

/// Sets a registration's status on behalf of the organization that owns its campaign.
/// Marking a volunteer ATTENDED awards the campaign points in the same transaction.
pub async fn update_registration_status(
    pool: &SqlitePool,
    organization_id: &str,
    registration_id: &str,
    status: RegistrationStatus,
    now: DateTime<Utc>,
) -> AppResult<CampaignRegistrationsRow> {
    let mut tx = database::begin_write(pool).await?;

    let registration = registrations_repo::load_registration_by_id(&mut *tx, registration_id)
        .await?
        .ok_or(AppError::NotFound("Registration"))?;
    let campaign = campaigns_repo::load_campaign_by_id(&mut *tx, &registration.campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;
    if campaign.organization_id != organization_id {
        return Err(AppError::Forbidden("campaign belongs to another organization"));
    }

    registrations_repo::update_registration_status(&mut tx, registration_id, status, now).await?;

    let mut points_awarded = false;
    if status == RegistrationStatus::Attended {
        points_awarded = reward_service::award_campaign_points(
            &mut tx,
            &registration.volunteer_id,
            &registration.campaign_id,
            now,
        )
        .await?;
    }

    let updated = registrations_repo::load_registration_by_id(&mut *tx, registration_id)
        .await?
        .ok_or(AppError::NotFound("Registration"))?;
    tx.commit().await?;

    info!(
        registration_id = %registration_id,
        campaign_id = %registration.campaign_id,
        status = status.as_str(),
        points_awarded,
        "campaign_registration_status_updated"
    );
    Ok(updated)
}

pub async fn list_campaign_registrations(
    pool: &SqlitePool,
    organization_id: &str,
    campaign_id: &str,
) -> AppResult<Vec<CampaignRegistrationsRow>> {
    let campaign = campaigns_repo::load_campaign_by_id(pool, campaign_id)
        .await?
        .ok_or(AppError::NotFound("Campaign"))?;
    if campaign.organization_id != organization_id {
        return Err(AppError::Forbidden("campaign belongs to another organization"));
    }
    Ok(registrations_repo::list_for_campaign(pool, campaign_id).await?)
}

pub async fn list_volunteer_registrations(
    pool: &SqlitePool,
    volunteer_id: &str,
) -> AppResult<Vec<CampaignRegistrationsRow>> {
    Ok(registrations_repo::list_for_volunteer(pool, volunteer_id).await?)
}
