#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use tokio::sync::{broadcast, oneshot, Notify};
use uuid::Uuid;

use jobboard_core::dto::application_dto::{ApplicationUpdate, NewApplication};
use jobboard_core::dto::auth_dto::{AuthEvent, AuthUser, Session};
use jobboard_core::dto::job_dto::NewJob;
use jobboard_core::error::{Error, Result};
use jobboard_core::models::{Application, ApplicationStatus, EmploymentType, Job, ProfileRow};
use jobboard_core::services::remote::{AuthService, DataService, StorageService};
use jobboard_core::services::session_service::RoleRequirement;
use jobboard_core::store::KeywordMode;
use jobboard_core::AppState;

struct Account {
    password: String,
    user_id: Uuid,
}

/// Holds the next list call after it has read the table.
pub struct ListGate {
    pub entered: Arc<Notify>,
    pub release: oneshot::Sender<()>,
}

struct PendingGate {
    entered: Arc<Notify>,
    release: oneshot::Receiver<()>,
}

/// In-memory stand-in for the hosted backend.
pub struct FakeBackend {
    jobs: Mutex<Vec<Job>>,
    applications: Mutex<Vec<Application>>,
    profiles: Mutex<HashMap<Uuid, ProfileRow>>,
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Session>>,
    buckets: Mutex<HashSet<String>>,
    objects: Mutex<HashMap<String, Bytes>>,
    list_gate: Mutex<Option<PendingGate>>,
    application_gate: Mutex<Option<PendingGate>>,
    events: broadcast::Sender<AuthEvent>,
    pub bucket_creates: AtomicUsize,
    pub confirm_signups: bool,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    pub fn requiring_confirmation() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(confirm_signups: bool) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            jobs: Mutex::new(Vec::new()),
            applications: Mutex::new(Vec::new()),
            profiles: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            buckets: Mutex::new(HashSet::new()),
            objects: Mutex::new(HashMap::new()),
            list_gate: Mutex::new(None),
            application_gate: Mutex::new(None),
            events,
            bucket_creates: AtomicUsize::new(0),
            confirm_signups,
        }
    }

    pub fn seed_job(&self, job: Job) {
        self.jobs.lock().unwrap().push(job);
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn stored_applications(&self) -> Vec<Application> {
        self.applications.lock().unwrap().clone()
    }

    pub fn stored_objects(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn has_session(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    pub fn add_account(&self, email: &str, password: &str, name: &str, role: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id,
            },
        );
        self.profiles.lock().unwrap().insert(
            user_id,
            ProfileRow {
                id: user_id,
                email: Some(email.to_string()),
                name: Some(name.to_string()),
                role: Some(role.to_string()),
            },
        );
        user_id
    }

    pub fn hold_next_list(&self) -> ListGate {
        arm(&self.list_gate)
    }

    pub fn hold_next_application_list(&self) -> ListGate {
        arm(&self.application_gate)
    }

    pub fn seed_application(&self, application: Application) {
        self.applications.lock().unwrap().push(application);
    }

    fn open_session(&self, user_id: Uuid, email: &str) -> Session {
        let session = Session {
            access_token: format!("token-{}", Uuid::new_v4()),
            refresh_token: None,
            expires_in: Some(3600),
            user: AuthUser {
                id: user_id,
                email: Some(email.to_string()),
            },
        };
        *self.session.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        session
    }
}

fn arm(slot: &Mutex<Option<PendingGate>>) -> ListGate {
    let entered = Arc::new(Notify::new());
    let (release, rx) = oneshot::channel();
    *slot.lock().unwrap() = Some(PendingGate {
        entered: entered.clone(),
        release: rx,
    });
    ListGate { entered, release }
}

async fn pass(slot: &Mutex<Option<PendingGate>>) {
    let gate = slot.lock().unwrap().take();
    if let Some(gate) = gate {
        gate.entered.notify_one();
        let _ = gate.release.await;
    }
}

#[async_trait]
impl DataService for FakeBackend {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs = self.jobs.lock().unwrap().clone();
        jobs.sort_by(|a, b| b.posted_date.cmp(&a.posted_date));
        pass(&self.list_gate).await;
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn insert_job(&self, data: &NewJob) -> Result<Job> {
        let job = Job {
            id: Uuid::new_v4(),
            title: data.title.clone(),
            company: data.company.clone(),
            location: data.location.clone(),
            employment_type: data.employment_type,
            salary: data.salary.clone(),
            description: data.description.clone(),
            requirements: data.requirements.clone(),
            responsibilities: data.responsibilities.clone(),
            benefits: data.benefits.clone(),
            posted_date: Utc::now(),
            deadline: data.deadline,
            logo: data.logo.clone(),
            featured: data.featured,
        };
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn update_job(&self, job: &Job) -> Result<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        let existing = jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", job.id)))?;
        *existing = job.clone();
        Ok(job.clone())
    }

    async fn delete_job(&self, id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        if jobs.len() == before {
            return Err(Error::NotFound(format!("Job {} not found", id)));
        }
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<Application>> {
        let mut applications = self.applications.lock().unwrap().clone();
        applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        pass(&self.application_gate).await;
        Ok(applications)
    }

    async fn insert_application(&self, data: &NewApplication) -> Result<Application> {
        let application = Application {
            id: Uuid::new_v4(),
            job_id: data.job_id,
            full_name: data.full_name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            resume: data.resume.clone(),
            cover_letter: data.cover_letter.clone(),
            status: data.status,
            submitted_at: Utc::now(),
            notes: None,
            user_id: data.user_id,
        };
        self.applications.lock().unwrap().push(application.clone());
        Ok(application)
    }

    async fn update_application(&self, id: Uuid, update: &ApplicationUpdate) -> Result<Application> {
        let mut applications = self.applications.lock().unwrap();
        let existing = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?;
        existing.status = update.status;
        existing.notes = update.notes.clone();
        Ok(existing.clone())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }
}

#[async_trait]
impl AuthService for FakeBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let user_id = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(account) if account.password == password => account.user_id,
                _ => return Err(Error::Unauthorized("Invalid login credentials".into())),
            }
        };
        Ok(self.open_session(user_id, email))
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Option<Session>> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(Error::Remote {
                status: 422,
                message: "User already registered".into(),
            });
        }
        let user_id = self.add_account(email, password, name, "applicant");
        if self.confirm_signups {
            return Ok(None);
        }
        Ok(Some(self.open_session(user_id, email)))
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl StorageService for FakeBackend {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.lock().unwrap().contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str, _public: bool) -> Result<()> {
        self.bucket_creates.fetch_add(1, Ordering::SeqCst);
        self.buckets.lock().unwrap().insert(bucket.to_string());
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        _content_type: Option<String>,
    ) -> Result<()> {
        if !self.buckets.lock().unwrap().contains(bucket) {
            return Err(Error::Remote {
                status: 404,
                message: "Bucket not found".into(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{}/{}", bucket, path), bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.test/{}/{}", bucket, path)
    }
}

pub fn app_state(backend: &Arc<FakeBackend>, requirement: RoleRequirement) -> AppState {
    AppState::with_services(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        KeywordMode::Combined,
        requirement,
        "resumes",
    )
}

pub fn job(title: &str, employment_type: EmploymentType, location: &str) -> Job {
    let posted_date = Utc::now() - Duration::days(3);
    Job {
        id: Uuid::new_v4(),
        title: title.to_string(),
        company: "TechCorp".to_string(),
        location: location.to_string(),
        employment_type,
        salary: "$100,000 - $130,000".to_string(),
        description: format!("{} role", title),
        requirements: vec!["3+ years of experience".to_string()],
        responsibilities: vec![],
        benefits: vec![],
        posted_date,
        deadline: posted_date + Duration::days(30),
        logo: None,
        featured: Some(false),
    }
}

pub fn application(job_id: Uuid, full_name: &str) -> Application {
    Application {
        id: Uuid::new_v4(),
        job_id,
        full_name: full_name.to_string(),
        email: format!("{}@example.com", full_name.to_lowercase().replace(' ', ".")),
        phone: "555-123-4567".to_string(),
        resume: "https://example.com/resume.pdf".to_string(),
        cover_letter: None,
        status: ApplicationStatus::Pending,
        submitted_at: Utc::now(),
        notes: None,
        user_id: None,
    }
}
