use uuid::Uuid;

use crate::dto::job_dto::FilterPatch;
use crate::models::{Application, Job};
use crate::store::filter::{apply_filters, JobFilters, KeywordMode};

/// Everything the job board holds for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobState {
    pub jobs: Vec<Job>,
    pub filtered_jobs: Vec<Job>,
    pub applications: Vec<Application>,
    pub filters: JobFilters,
    pub loading: bool,
    in_flight: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobAction {
    SetJobs(Vec<Job>),
    /// Appends, or replaces an already cached record with the same id.
    AddJob(Job),
    UpdateJob(Job),
    DeleteJob(Uuid),
    SetFilter(FilterPatch),
    ClearFilter,
    SetApplications(Vec<Application>),
    AddApplication(Application),
    UpdateApplication(Application),
    RequestStarted,
    RequestFinished,
}

fn refilter(mut state: JobState, mode: KeywordMode) -> JobState {
    state.filtered_jobs = apply_filters(&state.jobs, &state.filters, mode);
    state
}

pub fn reduce(mut state: JobState, action: JobAction, mode: KeywordMode) -> JobState {
    match action {
        JobAction::SetJobs(jobs) => {
            state.jobs = jobs;
            refilter(state, mode)
        }
        JobAction::AddJob(job) => {
            match state.jobs.iter_mut().find(|j| j.id == job.id) {
                Some(existing) => *existing = job,
                None => state.jobs.push(job),
            }
            refilter(state, mode)
        }
        JobAction::UpdateJob(job) => {
            let Some(existing) = state.jobs.iter_mut().find(|j| j.id == job.id) else {
                return state;
            };
            *existing = job;
            refilter(state, mode)
        }
        JobAction::DeleteJob(id) => {
            state.jobs.retain(|j| j.id != id);
            state.filtered_jobs.retain(|j| j.id != id);
            state
        }
        JobAction::SetFilter(patch) => {
            state.filters = state.filters.merged(patch);
            refilter(state, mode)
        }
        JobAction::ClearFilter => {
            state.filters = JobFilters::default();
            state.filtered_jobs = state.jobs.clone();
            state
        }
        JobAction::SetApplications(applications) => {
            state.applications = applications;
            state
        }
        JobAction::AddApplication(application) => {
            match state.applications.iter_mut().find(|a| a.id == application.id) {
                Some(existing) => *existing = application,
                None => state.applications.push(application),
            }
            state
        }
        JobAction::UpdateApplication(mut application) => {
            if let Some(existing) = state.applications.iter_mut().find(|a| a.id == application.id) {
                // submitted_at is fixed at creation.
                application.submitted_at = existing.submitted_at;
                *existing = application;
            }
            state
        }
        JobAction::RequestStarted => {
            state.in_flight += 1;
            state.loading = true;
            state
        }
        JobAction::RequestFinished => {
            state.in_flight = state.in_flight.saturating_sub(1);
            state.loading = state.in_flight > 0;
            state
        }
    }
}
