pub mod admin;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod notices;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::{
    dto::application_dto::MAX_RESUME_BYTES,
    middleware::{
        admin_gate::require_admin,
        rate_limit::{limit_requests, RateLimiter},
    },
    AppState,
};

/// All HTTP routes. Application submissions share a budget of `public_rps` per second.
pub fn build_router(state: AppState, public_rps: u32) -> Router {
    let apply = Router::new()
        .route("/api/jobs/:id/apply", post(jobs::apply_for_job))
        .layer(DefaultBodyLimit::max(MAX_RESUME_BYTES + 1024 * 1024))
        .layer(from_fn_with_state(
            RateLimiter::per_second(public_rps),
            limit_requests,
        ));

    let admin = Router::new()
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/jobs", post(admin::create_job))
        .route(
            "/api/admin/jobs/:id",
            put(admin::update_job).delete(admin::delete_job),
        )
        .route(
            "/api/admin/jobs/:id/applications",
            get(admin::applications_for_job),
        )
        .route("/api/admin/applications", get(admin::list_applications))
        .route(
            "/api/admin/applications/:id",
            axum::routing::patch(admin::review_application),
        )
        .layer(from_fn_with_state(state.session.clone(), require_admin));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/jobs", get(jobs::list_jobs))
        .route("/api/jobs/refresh", post(jobs::refresh_jobs))
        .route("/api/jobs/filter-options", get(jobs::filter_options))
        .route(
            "/api/jobs/filter",
            put(jobs::set_filter).delete(jobs::clear_filter),
        )
        .route("/api/jobs/:id", get(jobs::get_job))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/notices", get(notices::drain_notices))
        .merge(apply)
        .merge(admin)
        .with_state(state)
}
