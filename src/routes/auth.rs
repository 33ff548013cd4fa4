use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::auth_dto::{LoginPayload, SessionResponse, SignupPayload},
    error::{Error, Result},
    AppState,
};

fn current(state: &AppState) -> SessionResponse {
    SessionResponse::from(&state.session.state())
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in", body = Json<SessionResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account role not permitted")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<SessionResponse>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(Error::BadRequest("Email and password are required".into()));
    }
    state
        .session
        .login(payload.email.trim(), &payload.password)
        .await?;
    Ok(Json(current(&state)))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupPayload,
    responses(
        (status = 201, description = "Account created and signed in", body = Json<SessionResponse>),
        (status = 202, description = "Account created, e-mail confirmation pending", body = Json<SessionResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse> {
    if payload.email.trim().is_empty() || payload.password.is_empty() || payload.name.trim().is_empty() {
        return Err(Error::BadRequest("Name, email and password are required".into()));
    }
    let user = state
        .session
        .signup(payload.email.trim(), &payload.password, payload.name.trim())
        .await?;
    let status = if user.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(current(&state))))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Signed out", body = Json<SessionResponse>)
    )
)]
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>) -> Json<SessionResponse> {
    state.session.logout().await;
    Json(current(&state))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current session state", body = Json<SessionResponse>)
    )
)]
#[axum::debug_handler]
pub async fn me(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(current(&state))
}
