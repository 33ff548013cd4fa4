//! Seams to the hosted backend: tables, auth sessions and blob storage.
//!
//! The store and session holder only ever talk to these traits, so tests can
//! swap in mocks or in-memory fakes for the HTTP client.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::application_dto::{ApplicationUpdate, NewApplication};
use crate::dto::auth_dto::{AuthEvent, Session};
use crate::dto::job_dto::NewJob;
use crate::error::Result;
use crate::models::{Application, Job, ProfileRow};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataService: Send + Sync {
    /// All jobs, newest `posted_date` first.
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>>;

    async fn insert_job(&self, job: &NewJob) -> Result<Job>;

    /// Replaces the row keyed by `job.id`. A missing row is `Error::NotFound`.
    async fn update_job(&self, job: &Job) -> Result<Job>;

    /// A missing row is `Error::NotFound`.
    async fn delete_job(&self, id: Uuid) -> Result<()>;

    /// All applications, newest `submitted_at` first.
    async fn list_applications(&self) -> Result<Vec<Application>>;

    async fn insert_application(&self, application: &NewApplication) -> Result<Application>;

    async fn update_application(&self, id: Uuid, update: &ApplicationUpdate) -> Result<Application>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// `None` when the service requires e-mail confirmation before issuing a session.
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Option<Session>>;

    async fn sign_out(&self) -> Result<()>;

    async fn current_session(&self) -> Result<Option<Session>>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    async fn create_bucket(&self, bucket: &str, public: bool) -> Result<()>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: Option<String>,
    ) -> Result<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}
