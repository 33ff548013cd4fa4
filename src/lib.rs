pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    application_service::ApplicationSubmitter,
    notice_service::NoticeService,
    remote::{AuthService, DataService, StorageService},
    session_service::{RoleRequirement, SessionHolder},
    supabase_service::SupabaseClient,
};
use crate::store::{JobStore, KeywordMode};

#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub session: SessionHolder,
    pub submitter: ApplicationSubmitter,
    pub notices: NoticeService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Arc::new(SupabaseClient::new(
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?);

        Ok(Self::with_services(
            client.clone(),
            client.clone(),
            client,
            config.keyword_mode,
            RoleRequirement::AnyRole,
            &config.resume_bucket,
        ))
    }

    /// Wires the store, session holder and submitter around the given backends.
    pub fn with_services(
        data: Arc<dyn DataService>,
        auth: Arc<dyn AuthService>,
        storage: Arc<dyn StorageService>,
        keyword_mode: KeywordMode,
        requirement: RoleRequirement,
        resume_bucket: &str,
    ) -> Self {
        let notices = NoticeService::new();
        let store = JobStore::new(data.clone(), notices.clone(), keyword_mode);
        let session = SessionHolder::new(auth, data, notices.clone(), requirement);
        let submitter = ApplicationSubmitter::new(
            storage,
            store.clone(),
            session.clone(),
            notices.clone(),
            resume_bucket,
        );

        Self {
            store,
            session,
            submitter,
            notices,
        }
    }
}
