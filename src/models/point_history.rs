use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointSource {
    HelpRequest,
    Campaign,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PointHistoryRow {
    pub point_history_id: String,
    pub volunteer_id: String,
    pub points: i64,
    pub source: PointSource,
    pub campaign_id: Option<String>,
    pub help_request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
