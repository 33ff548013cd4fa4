use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use crate::services::session_service::{SessionHolder, SessionState};

pub const LOGIN_PATH: &str = "/login";

/// Lets admins through and sends everyone else to the login page with `303 See Other`.
pub async fn require_admin(
    State(session): State<SessionHolder>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match session.settled().await {
        SessionState::Authenticated(user) if user.is_admin() => next.run(req).await,
        state => {
            debug!(path = %req.uri().path(), signed_in = state.user().is_some(), "Admin area refused");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}
