use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    dto::application_dto::{ApplicationForm, ApplicationSubmitted, FormRejected, ResumeFile},
    dto::job_dto::{FilterOptionsResponse, FilterPatch, JobListResponse},
    error::{Error, Result},
    models::Job,
    services::application_service::SubmissionError,
    store::JobStore,
    AppState,
};

fn job_list(store: &JobStore) -> JobListResponse {
    let state = store.state();
    JobListResponse {
        total: state.filtered_jobs.len(),
        items: state.filtered_jobs,
        filters: state.filters,
        loading: state.loading,
    }
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    responses(
        (status = 200, description = "Jobs visible under the current filters", body = Json<JobListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(job_list(&state.store))
}

#[utoipa::path(
    post,
    path = "/api/jobs/refresh",
    responses(
        (status = 200, description = "Jobs reloaded from the service", body = Json<JobListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn refresh_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    if !state.store.fetch_jobs().await {
        debug!("Job refresh did not replace the cache");
    }
    Json(job_list(&state.store))
}

#[utoipa::path(
    get,
    path = "/api/jobs/filter-options",
    responses(
        (status = 200, description = "Distinct employment types and locations", body = Json<FilterOptionsResponse>)
    )
)]
#[axum::debug_handler]
pub async fn filter_options(State(state): State<AppState>) -> Json<FilterOptionsResponse> {
    Json(state.store.filter_options())
}

#[utoipa::path(
    put,
    path = "/api/jobs/filter",
    request_body = FilterPatch,
    responses(
        (status = 200, description = "Filters merged", body = Json<JobListResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn set_filter(
    State(state): State<AppState>,
    Json(patch): Json<FilterPatch>,
) -> Json<JobListResponse> {
    state.store.set_filter(patch);
    Json(job_list(&state.store))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/filter",
    responses(
        (status = 200, description = "Filters cleared", body = Json<JobListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn clear_filter(State(state): State<AppState>) -> Json<JobListResponse> {
    state.store.clear_filter();
    Json(job_list(&state.store))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = Json<Job>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Job>> {
    state
        .store
        .get_job_by_id(id)
        .await
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/apply",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 201, description = "Application submitted", body = Json<ApplicationSubmitted>),
        (status = 422, description = "Form has errors", body = Json<FormRejected>),
        (status = 502, description = "Resume upload failed")
    )
)]
#[axum::debug_handler]
pub async fn apply_for_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_application_form(multipart).await?;

    match state.submitter.submit(id, form).await {
        Ok(application) => Ok((
            StatusCode::CREATED,
            Json(ApplicationSubmitted { application }),
        )
            .into_response()),
        Err(SubmissionError::Invalid(errors)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(FormRejected { errors }),
        )
            .into_response()),
        Err(SubmissionError::Upload(e)) => Err(e),
        Err(SubmissionError::NotSubmitted) => Err(Error::BadRequest(
            "The application could not be submitted".into(),
        )),
    }
}

async fn read_application_form(mut multipart: Multipart) -> Result<ApplicationForm> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "full_name" => form.full_name = field.text().await?,
            "email" => form.email = field.text().await?,
            "phone" => form.phone = field.text().await?,
            "cover_letter" => form.cover_letter = Some(field.text().await?),
            "resume_url" => form.resume_reference = Some(field.text().await?),
            "resume" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.resume_file = Some(ResumeFile {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}
