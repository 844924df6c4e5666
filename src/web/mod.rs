use axum::{
    routing::{get, patch, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::SqlitePool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod middleware;
pub mod routes;

use middleware::auth as auth_middleware;
use routes::{admin, campaigns, health, points, registrations};

pub fn app(pool: SqlitePool) -> Router {
    // Every route below needs a caller identity
    let protected_routes = Router::new()
        .route("/campaigns", post(campaigns::create_campaign_handler))
        .route(
            "/campaigns/:campaign_id",
            get(campaigns::get_campaign_handler).delete(campaigns::delete_campaign_handler),
        )
        .route(
            "/campaigns/:campaign_id/registrations",
            post(registrations::register_handler)
                .delete(registrations::cancel_handler)
                .get(registrations::list_campaign_registrations_handler),
        )
        .route(
            "/campaigns/:campaign_id/complete",
            post(campaigns::complete_campaign_handler),
        )
        .route(
            "/registrations/:registration_id",
            patch(registrations::update_registration_status_handler),
        )
        .route("/me/registrations", get(registrations::my_registrations_handler))
        .route("/me/points", get(points::my_points_handler))
        .route(
            "/admin/campaigns/auto-transition",
            post(admin::auto_transition_handler),
        )
        .route(
            "/admin/campaigns/:campaign_id/review",
            post(admin::review_campaign_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            pool.clone(),
            auth_middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(protected_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(pool)
}
