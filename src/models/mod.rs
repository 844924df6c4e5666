pub mod campaigns;
pub mod point_history;
pub mod registrations;
pub mod users;

pub use campaigns::{CampaignStatus, CampaignsRow};
pub use point_history::{PointHistoryRow, PointSource};
pub use registrations::{CampaignRegistrationsRow, RegistrationStatus};
pub use users::{UserRole, UsersRow};
