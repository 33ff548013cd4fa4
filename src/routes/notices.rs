use axum::{extract::State, response::Json};

use crate::{services::notice_service::Notice, AppState};

#[utoipa::path(
    get,
    path = "/api/notices",
    responses(
        (status = 200, description = "Pending notices, oldest first. Reading clears them.", body = Json<Vec<Notice>>)
    )
)]
#[axum::debug_handler]
pub async fn drain_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notices.drain())
}
