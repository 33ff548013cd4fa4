use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::ApplicationReviewPayload,
    dto::job_dto::{DashboardStats, NewJob},
    error::{Error, Result},
    models::{Application, Job},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Job and application counts", body = Json<DashboardStats>),
        (status = 303, description = "Not signed in as an admin")
    )
)]
#[axum::debug_handler]
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardStats> {
    state.store.fetch_applications().await;
    Json(state.store.dashboard_stats())
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs",
    request_body = NewJob,
    responses(
        (status = 201, description = "Job created", body = Json<Job>),
        (status = 422, description = "Invalid payload"),
        (status = 303, description = "Not signed in as an admin")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<NewJob>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state
        .store
        .add_job(payload)
        .await
        .ok_or_else(|| Error::BadRequest("The job could not be created".into()))?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    put,
    path = "/api/admin/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = NewJob,
    responses(
        (status = 200, description = "Job updated", body = Json<Job>),
        (status = 404, description = "Job not found"),
        (status = 303, description = "Not signed in as an admin")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewJob>,
) -> Result<Json<Job>> {
    payload.validate()?;
    let existing = state
        .store
        .get_job_by_id(id)
        .await
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))?;

    let job = Job {
        id,
        title: payload.title,
        company: payload.company,
        location: payload.location,
        employment_type: payload.employment_type,
        salary: payload.salary,
        description: payload.description,
        requirements: payload.requirements,
        responsibilities: payload.responsibilities,
        benefits: payload.benefits,
        posted_date: existing.posted_date,
        deadline: payload.deadline,
        logo: payload.logo,
        featured: payload.featured,
    };

    state
        .store
        .update_job(job)
        .await
        .map(Json)
        .ok_or_else(|| Error::BadRequest("The job could not be updated".into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "Job not found"),
        (status = 303, description = "Not signed in as an admin")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    if state.store.get_job_by_id(id).await.is_none() {
        return Err(Error::NotFound(format!("Job {} not found", id)));
    }
    if !state.store.delete_job(id).await {
        return Err(Error::BadRequest("The job could not be deleted".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/applications",
    responses(
        (status = 200, description = "All applications, newest first", body = Json<Vec<Application>>),
        (status = 303, description = "Not signed in as an admin")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(State(state): State<AppState>) -> Json<Vec<Application>> {
    state.store.fetch_applications().await;
    Json(state.store.applications())
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs/{id}/applications",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Applications for the job", body = Json<Vec<Application>>),
        (status = 303, description = "Not signed in as an admin")
    )
)]
#[axum::debug_handler]
pub async fn applications_for_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Application>> {
    Json(state.store.get_applications_for_job(id))
}

#[utoipa::path(
    patch,
    path = "/api/admin/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = ApplicationReviewPayload,
    responses(
        (status = 200, description = "Application updated", body = Json<Application>),
        (status = 404, description = "Application not found"),
        (status = 303, description = "Not signed in as an admin")
    )
)]
#[axum::debug_handler]
pub async fn review_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplicationReviewPayload>,
) -> Result<Json<Application>> {
    let find = |apps: Vec<Application>| apps.into_iter().find(|a| a.id == id);
    let cached = match find(state.store.applications()) {
        Some(application) => Some(application),
        None => {
            state.store.fetch_applications().await;
            find(state.store.applications())
        }
    };
    let mut application =
        cached.ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?;

    application.status = payload.status;
    if let Some(notes) = payload.notes {
        let notes = notes.trim();
        application.notes = (!notes.is_empty()).then(|| notes.to_string());
    }

    state
        .store
        .update_application(application)
        .await
        .map(Json)
        .ok_or_else(|| Error::BadRequest("The application could not be updated".into()))
}
