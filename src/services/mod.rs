use sqlx::SqliteExecutor;

use crate::database::users_repo;
use crate::error::{AppError, AppResult};
use crate::models::{UserRole, UsersRow};

pub mod campaign_service;
pub mod campaign_status_service;
pub mod registration_service;
pub mod reward_service;

/// Loads the acting user and checks their role.
pub(crate) async fn require_role(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
    role: UserRole,
    what: &'static str,
) -> AppResult<UsersRow> {
    let user = users_repo::load_user(executor, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    if user.role != role {
        return Err(AppError::Forbidden(what));
    }
    Ok(user)
}
