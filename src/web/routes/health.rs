use axum::{extract::State, Json};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::AppError;

pub async fn health_handler(State(pool): State<SqlitePool>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
