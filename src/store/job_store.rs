use std::sync::{Arc, RwLock};

use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::{ApplicationUpdate, NewApplication};
use crate::dto::job_dto::{DashboardStats, FilterOptionsResponse, FilterPatch, NewJob};
use crate::error::Result;
use crate::models::{Application, ApplicationStatus, Job};
use crate::services::notice_service::NoticeService;
use crate::services::remote::DataService;
use crate::store::fence::{RequestFence, RequestKey, Ticket};
use crate::store::filter::{JobFilters, KeywordMode};
use crate::store::state::{reduce, JobAction, JobState};
use crate::utils::time::{deadline_not_before, now};
use crate::utils::validation::field_messages;

struct Inner {
    data: Arc<dyn DataService>,
    notices: NoticeService,
    mode: KeywordMode,
    state: RwLock<JobState>,
    fence: RequestFence,
}

/// Session-wide cache of jobs and applications, kept in step with the remote tables.
///
/// Failures never escape an action: they are logged, reported through the
/// [`NoticeService`], and turned into `None` or `false`.
#[derive(Clone)]
pub struct JobStore {
    inner: Arc<Inner>,
}

/// Keeps the loading flag raised for as long as it lives.
struct InFlight<'a> {
    store: &'a JobStore,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.dispatch(JobAction::RequestFinished);
    }
}

impl JobStore {
    pub fn new(data: Arc<dyn DataService>, notices: NoticeService, mode: KeywordMode) -> Self {
        Self {
            inner: Arc::new(Inner {
                data,
                notices,
                mode,
                state: RwLock::new(JobState::default()),
                fence: RequestFence::new(),
            }),
        }
    }

    pub fn keyword_mode(&self) -> KeywordMode {
        self.inner.mode
    }

    fn dispatch(&self, action: JobAction) {
        let mut state = self.inner.state.write().expect("job state lock poisoned");
        let current = std::mem::take(&mut *state);
        *state = reduce(current, action, self.inner.mode);
    }

    /// Applies `action` only if `ticket` is still the newest request for its key.
    fn dispatch_if_current(&self, ticket: &Ticket, action: JobAction) -> bool {
        let mut state = self.inner.state.write().expect("job state lock poisoned");
        if !self.inner.fence.is_current(ticket) {
            return false;
        }
        let current = std::mem::take(&mut *state);
        *state = reduce(current, action, self.inner.mode);
        true
    }

    fn begin(&self) -> InFlight<'_> {
        self.dispatch(JobAction::RequestStarted);
        InFlight { store: self }
    }

    fn read<T>(&self, f: impl FnOnce(&JobState) -> T) -> T {
        let state = self.inner.state.read().expect("job state lock poisoned");
        f(&state)
    }

    pub fn state(&self) -> JobState {
        self.read(|s| s.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|s| s.loading)
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.read(|s| s.jobs.clone())
    }

    pub fn filtered_jobs(&self) -> Vec<Job> {
        self.read(|s| s.filtered_jobs.clone())
    }

    pub fn filters(&self) -> JobFilters {
        self.read(|s| s.filters.clone())
    }

    pub fn applications(&self) -> Vec<Application> {
        self.read(|s| s.applications.clone())
    }

    pub async fn fetch_jobs(&self) -> bool {
        let _loading = self.begin();
        let ticket = self.inner.fence.issue(RequestKey::FetchJobs);

        match self.inner.data.list_jobs().await {
            Ok(jobs) => {
                let count = jobs.len();
                if self.dispatch_if_current(&ticket, JobAction::SetJobs(jobs)) {
                    debug!(count, "Loaded jobs");
                    true
                } else {
                    debug!("Discarding superseded job list");
                    false
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch jobs");
                if self.inner.fence.is_current(&ticket) {
                    self.inner.notices.error("Failed to load jobs");
                }
                false
            }
        }
    }

    pub async fn add_job(&self, data: NewJob) -> Option<Job> {
        if let Err(e) = data.validate() {
            let fields: Vec<String> = field_messages(&e).into_keys().collect();
            warn!(?fields, "Rejected invalid job");
            self.inner
                .notices
                .error(format!("Please fill in: {}", fields.join(", ")));
            return None;
        }
        if !deadline_not_before(data.deadline, now()) {
            self.inner.notices.error("The deadline cannot be in the past");
            return None;
        }

        let _loading = self.begin();
        match self.inner.data.insert_job(&data).await {
            Ok(job) => {
                info!(job_id = %job.id, title = %job.title, "Job created");
                self.dispatch(JobAction::AddJob(job.clone()));
                self.inner.notices.success("Job added successfully");
                Some(job)
            }
            Err(e) => {
                error!(error = %e, "Failed to add job");
                self.inner.notices.error(format!("Failed to add job: {}", e));
                None
            }
        }
    }

    pub async fn update_job(&self, job: Job) -> Option<Job> {
        let blank = blank_fields(&job);
        if !blank.is_empty() {
            warn!(job_id = %job.id, fields = ?blank, "Rejected invalid job update");
            self.inner
                .notices
                .error(format!("Please fill in: {}", blank.join(", ")));
            return None;
        }
        if !deadline_not_before(job.deadline, job.posted_date) {
            self.inner
                .notices
                .error("The deadline cannot be earlier than the posting date");
            return None;
        }

        let _loading = self.begin();
        match self.inner.data.update_job(&job).await {
            Ok(updated) => {
                info!(job_id = %updated.id, "Job updated");
                self.dispatch(JobAction::UpdateJob(updated.clone()));
                self.inner.notices.success("Job updated successfully");
                Some(updated)
            }
            Err(e) if e.is_not_found() => {
                warn!(job_id = %job.id, "Update for unknown job");
                self.inner.notices.error("Job not found");
                None
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Failed to update job");
                self.inner.notices.error(format!("Failed to update job: {}", e));
                None
            }
        }
    }

    pub async fn delete_job(&self, id: Uuid) -> bool {
        let _loading = self.begin();
        match self.inner.data.delete_job(id).await {
            Ok(()) => {
                info!(job_id = %id, "Job deleted");
                self.dispatch(JobAction::DeleteJob(id));
                self.inner.notices.success("Job deleted successfully");
                true
            }
            Err(e) => {
                error!(job_id = %id, error = %e, "Failed to delete job");
                let message = if e.is_not_found() {
                    "Job not found".to_string()
                } else {
                    format!("Failed to delete job: {}", e)
                };
                self.inner.notices.error(message);
                false
            }
        }
    }

    pub fn set_filter(&self, patch: FilterPatch) {
        self.dispatch(JobAction::SetFilter(patch));
    }

    pub fn clear_filter(&self) {
        self.dispatch(JobAction::ClearFilter);
    }

    pub async fn fetch_applications(&self) -> bool {
        let _loading = self.begin();
        let ticket = self.inner.fence.issue(RequestKey::FetchApplications);

        match self.inner.data.list_applications().await {
            Ok(applications) => {
                let count = applications.len();
                if self.dispatch_if_current(&ticket, JobAction::SetApplications(applications)) {
                    debug!(count, "Loaded applications");
                    true
                } else {
                    debug!("Discarding superseded application list");
                    false
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch applications");
                if self.inner.fence.is_current(&ticket) {
                    self.inner.notices.error("Failed to load applications");
                }
                false
            }
        }
    }

    /// Submits a new application. The status always starts at `Pending`.
    pub async fn add_application(&self, mut data: NewApplication) -> Option<Application> {
        data.status = ApplicationStatus::Pending;

        let _loading = self.begin();
        match self.lookup_job(data.job_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(job_id = %data.job_id, "Application for unknown job");
                self.inner
                    .notices
                    .error("The job you are applying for no longer exists");
                return None;
            }
            Err(e) => {
                error!(job_id = %data.job_id, error = %e, "Failed to check job before applying");
                self.inner
                    .notices
                    .error("Failed to submit application. Please try again.");
                return None;
            }
        }

        match self.inner.data.insert_application(&data).await {
            Ok(application) => {
                info!(
                    application_id = %application.id,
                    job_id = %application.job_id,
                    "Application submitted"
                );
                self.dispatch(JobAction::AddApplication(application.clone()));
                self.inner.notices.success("Application submitted successfully!");
                Some(application)
            }
            Err(e) => {
                error!(job_id = %data.job_id, error = %e, "Failed to submit application");
                self.inner
                    .notices
                    .error("Failed to submit application. Please try again.");
                None
            }
        }
    }

    /// Persists the status and notes of `application`. Other fields are not sent.
    pub async fn update_application(&self, application: Application) -> Option<Application> {
        let _loading = self.begin();
        let update = ApplicationUpdate::from(&application);
        match self
            .inner
            .data
            .update_application(application.id, &update)
            .await
        {
            Ok(mut updated) => {
                info!(application_id = %updated.id, status = %updated.status, "Application updated");
                let cached_at = self.read(|s| {
                    s.applications
                        .iter()
                        .find(|a| a.id == updated.id)
                        .map(|a| a.submitted_at)
                });
                if let Some(submitted_at) = cached_at {
                    updated.submitted_at = submitted_at;
                }
                self.dispatch(JobAction::UpdateApplication(updated.clone()));
                self.inner.notices.success("Application updated");
                Some(updated)
            }
            Err(e) => {
                error!(application_id = %application.id, error = %e, "Failed to update application");
                let message = if e.is_not_found() {
                    "Application not found".to_string()
                } else {
                    format!("Failed to update application: {}", e)
                };
                self.inner.notices.error(message);
                None
            }
        }
    }

    /// Cached job, or a point lookup against the service when it is not cached.
    pub async fn get_job_by_id(&self, id: Uuid) -> Option<Job> {
        let _loading = self.begin();
        match self.lookup_job(id).await {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %id, error = %e, "Failed to look up job");
                self.inner.notices.error("Failed to load job details");
                None
            }
        }
    }

    /// Cache first, then the service. A fetched job joins the cache unless a newer lookup for it won.
    async fn lookup_job(&self, id: Uuid) -> Result<Option<Job>> {
        if let Some(job) = self.read(|s| s.jobs.iter().find(|j| j.id == id).cloned()) {
            return Ok(Some(job));
        }

        let ticket = self.inner.fence.issue(RequestKey::GetJob(id));
        let result = self.inner.data.get_job(id).await;
        match &result {
            Ok(Some(job)) => {
                self.dispatch_if_current(&ticket, JobAction::AddJob(job.clone()));
            }
            Ok(None) => debug!(job_id = %id, "Job not found"),
            Err(_) => {}
        }
        self.inner.fence.retire(&ticket);
        result
    }

    pub fn get_applications_for_job(&self, job_id: Uuid) -> Vec<Application> {
        self.read(|s| {
            s.applications
                .iter()
                .filter(|a| a.job_id == job_id)
                .cloned()
                .collect()
        })
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        self.read(|s| {
            let mut applications_by_status = ApplicationStatus::ALL
                .into_iter()
                .map(|status| (status, 0))
                .collect::<std::collections::BTreeMap<_, _>>();
            for application in &s.applications {
                *applications_by_status.entry(application.status).or_insert(0) += 1;
            }
            DashboardStats {
                total_jobs: s.jobs.len(),
                featured_jobs: s.jobs.iter().filter(|j| j.is_featured()).count(),
                total_applications: s.applications.len(),
                applications_by_status,
            }
        })
    }

    /// Distinct types and primary locations among cached jobs, in first-seen order.
    pub fn filter_options(&self) -> FilterOptionsResponse {
        self.read(|s| {
            let mut types = Vec::new();
            let mut locations: Vec<String> = Vec::new();
            for job in &s.jobs {
                if !types.contains(&job.employment_type) {
                    types.push(job.employment_type);
                }
                let location = job.primary_location();
                if !location.is_empty() && !locations.iter().any(|l| l == location) {
                    locations.push(location.to_string());
                }
            }
            FilterOptionsResponse { types, locations }
        })
    }
}

/// Required text columns left blank, named as in [`NewJob`] validation.
fn blank_fields(job: &Job) -> Vec<&'static str> {
    [
        ("company", &job.company),
        ("description", &job.description),
        ("location", &job.location),
        ("title", &job.title),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect()
}
