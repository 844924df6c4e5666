use axum::{extract::State, Extension, Json};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::services::reward_service::{self, VolunteerPoints};
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn my_points_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
) -> Result<Json<VolunteerPoints>, AppError> {
    reward_service::get_volunteer_points(&pool, &auth_user.id)
        .await
        .map(Json)
}
