use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Pending,
    Approved,
    Rejected,
    Ongoing,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Pending => "PENDING",
            CampaignStatus::Approved => "APPROVED",
            CampaignStatus::Rejected => "REJECTED",
            CampaignStatus::Ongoing => "ONGOING",
            CampaignStatus::Completed => "COMPLETED",
        }
    }

    /// Volunteers may only take a seat while the campaign is approved or running.
    pub fn accepts_registrations(self) -> bool {
        matches!(self, CampaignStatus::Approved | CampaignStatus::Ongoing)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignsRow {
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
    pub status: CampaignStatus,
    // JSON array of image URLs
    pub proof_images: String,
    pub done_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignsRow {
    pub fn proof_image_urls(&self) -> Vec<String> {
        serde_json::from_str::<Vec<String>>(&self.proof_images).unwrap_or_default()
    }

    pub fn is_full(&self) -> bool {
        self.current_volunteers >= self.max_volunteers
    }
}
