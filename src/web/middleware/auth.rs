use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::users_repo;
use crate::error::AppError;
use crate::models::UserRole;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub name: Option<String>,
    pub role: UserRole,
}

// Tokens are issued and verified by the auth service in front of us; only the
// payload claims are read here.
#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    role: UserRole,
}

pub async fn require_auth(
    State(pool): State<SqlitePool>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = bearer_token(&request)
        .or_else(|| cookie_token(&request))
        .and_then(|token| decode_payload(&token));

    let Some(user) = user else {
        return AppError::Unauthorized.into_response();
    };

    // The token is authoritative for identity and role; the local users row is a mirror.
    if let Err(err) =
        users_repo::upsert_user(&pool, &user.id, user.name.as_deref(), user.role).await
    {
        return AppError::Database(err).into_response();
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

fn cookie_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find_map(|c| c.strip_prefix("access_token="))
                .map(|t| t.to_string())
        })
}

fn decode_payload(token: &str) -> Option<AuthenticatedUser> {
    // header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let payload = serde_json::from_slice::<JwtPayload>(&payload_bytes).ok()?;
    if payload.sub.trim().is_empty() {
        return None;
    }
    Some(AuthenticatedUser {
        id: payload.sub,
        name: payload.name.filter(|n| !n.trim().is_empty()),
        role: payload.role,
    })
}
