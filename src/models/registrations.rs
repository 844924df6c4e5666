use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// CANCELLED is never stored: a cancelled registration is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Registered,
    Attended,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "REGISTERED",
            RegistrationStatus::Attended => "ATTENDED",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignRegistrationsRow {
    pub registration_id: String,
    pub campaign_id: String,
    pub volunteer_id: String,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
