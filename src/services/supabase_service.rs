use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::dto::application_dto::{ApplicationUpdate, NewApplication};
use crate::dto::auth_dto::{AuthEvent, Session};
use crate::dto::job_dto::{JobRecord, NewJob};
use crate::error::{Error, Result};
use crate::models::{Application, Job, ProfileRow};
use crate::services::remote::{AuthService, DataService, StorageService};

const JOBS: &str = "jobs";
const APPLICATIONS: &str = "applications";
const PROFILES: &str = "profiles";

/// HTTP client for a Supabase-style backend (PostgREST, GoTrue, Storage).
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    anon_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid SUPABASE_URL {}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        let (events, _) = broadcast::channel(16);

        info!("Remote data service at {}", base_url);

        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.into(),
            session: RwLock::new(None),
            events,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Internal(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn table_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.endpoint(&format!("rest/v1/{}", table))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn bearer(&self) -> String {
        let guard = self.session.read().expect("session lock poisoned");
        guard
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.bearer()))
    }

    fn store_session(&self, session: Option<Session>) {
        let mut guard = self.session.write().expect("session lock poisoned");
        *guard = session;
    }

    fn current(&self) -> Option<Session> {
        self.session.read().expect("session lock poisoned").clone()
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine: nobody is listening for session changes yet.
        let _ = self.events.send(event);
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let url = self.table_url(table, query)?;
        debug!(%url, "select");
        let response = check(self.request(Method::GET, url).send().await?).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    /// Sends a write that asks PostgREST to echo the affected rows back.
    async fn write_returning<T: DeserializeOwned>(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: Option<JsonValue>,
    ) -> Result<Vec<T>> {
        let url = self.table_url(table, query)?;
        debug!(%url, %method, "write");
        let mut request = self
            .request(method, url)
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = check(request.send().await?).await?;
        Ok(response.json::<Vec<T>>().await?)
    }
}

fn id_eq(id: Uuid) -> (&'static str, String) {
    ("id", format!("eq.{}", id))
}

fn select_all() -> (&'static str, String) {
    ("select", "*".to_string())
}

/// Turns a non-2xx response into `Error::Remote`, lifting the service's message when present.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<JsonValue>(&body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            }
        });
    Err(Error::Remote {
        status: status.as_u16(),
        message,
    })
}

fn single<T>(rows: Vec<T>, missing: impl FnOnce() -> Error) -> Result<T> {
    rows.into_iter().next().ok_or_else(missing)
}

#[async_trait]
impl DataService for SupabaseClient {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.select(JOBS, &[select_all(), ("order", "posted_date.desc".to_string())])
            .await
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let rows: Vec<Job> = self.select(JOBS, &[select_all(), id_eq(id)]).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_job(&self, job: &NewJob) -> Result<Job> {
        let rows = self
            .write_returning(Method::POST, JOBS, &[], Some(serde_json::to_value(job)?))
            .await?;
        single(rows, || Error::Internal("Job insert returned no row".into()))
    }

    async fn update_job(&self, job: &Job) -> Result<Job> {
        let body = serde_json::to_value(JobRecord::from(job))?;
        let rows = self
            .write_returning(Method::PATCH, JOBS, &[id_eq(job.id)], Some(body))
            .await?;
        single(rows, || Error::NotFound(format!("Job {} not found", job.id)))
    }

    async fn delete_job(&self, id: Uuid) -> Result<()> {
        let rows: Vec<JsonValue> = self
            .write_returning(Method::DELETE, JOBS, &[id_eq(id)], None)
            .await?;
        single(rows, || Error::NotFound(format!("Job {} not found", id))).map(|_| ())
    }

    async fn list_applications(&self) -> Result<Vec<Application>> {
        self.select(
            APPLICATIONS,
            &[select_all(), ("order", "submitted_at.desc".to_string())],
        )
        .await
    }

    async fn insert_application(&self, application: &NewApplication) -> Result<Application> {
        let rows = self
            .write_returning(
                Method::POST,
                APPLICATIONS,
                &[],
                Some(serde_json::to_value(application)?),
            )
            .await?;
        single(rows, || Error::Internal("Application insert returned no row".into()))
    }

    async fn update_application(&self, id: Uuid, update: &ApplicationUpdate) -> Result<Application> {
        let rows = self
            .write_returning(
                Method::PATCH,
                APPLICATIONS,
                &[id_eq(id)],
                Some(serde_json::to_value(update)?),
            )
            .await?;
        single(rows, || Error::NotFound(format!("Application {} not found", id)))
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        let rows: Vec<ProfileRow> = self.select(PROFILES, &[select_all(), id_eq(user_id)]).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = match check(response).await {
            Ok(r) => r,
            Err(Error::Remote { status, message }) if status == 400 || status == 401 => {
                return Err(Error::Unauthorized(message));
            }
            Err(e) => return Err(e),
        };
        let session = response.json::<Session>().await?;
        self.store_session(Some(session.clone()));
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Option<Session>> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;
        let body = check(response).await?.json::<JsonValue>().await?;
        if body.get("access_token").is_none() {
            info!(email, "Sign-up accepted, awaiting e-mail confirmation");
            return Ok(None);
        }
        let session: Session = serde_json::from_value(body)?;
        self.store_session(Some(session.clone()));
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.current() else {
            self.emit(AuthEvent::SignedOut);
            return Ok(());
        };
        let url = self.endpoint("auth/v1/logout")?;
        let result = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
            .send()
            .await;

        // The local session is dropped even if the service could not be reached.
        self.store_session(None);
        self.emit(AuthEvent::SignedOut);

        check(result?).await.map(|_| ())
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .client
            .get(url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", session.access_token))
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(user_id = %session.user.id, "Stored session rejected by auth service");
            self.store_session(None);
            self.emit(AuthEvent::SignedOut);
            return Ok(None);
        }
        check(response).await?;
        Ok(Some(session))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl StorageService for SupabaseClient {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let url = self.endpoint(&format!("storage/v1/bucket/{}", bucket))?;
        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        match check(response).await {
            Ok(_) => Ok(true),
            Err(Error::Remote { message, .. }) if message.to_lowercase().contains("not found") => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_bucket(&self, bucket: &str, public: bool) -> Result<()> {
        let url = self.endpoint("storage/v1/bucket")?;
        let response = self
            .request(Method::POST, url)
            .json(&json!({ "id": bucket, "name": bucket, "public": public }))
            .send()
            .await?;
        check(response).await?;
        info!(bucket, public, "Created storage bucket");
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: Option<String>,
    ) -> Result<()> {
        let url = self.endpoint(&format!("storage/v1/object/{}/{}", bucket, path))?;
        let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
        let response = self
            .request(Method::POST, url)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client =
            SupabaseClient::new("https://demo.supabase.co", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.public_url("resumes", "abc.pdf"),
            "https://demo.supabase.co/storage/v1/object/public/resumes/abc.pdf"
        );
    }

    #[test]
    fn table_url_encodes_filters() {
        let client =
            SupabaseClient::new("https://demo.supabase.co/", "anon", Duration::from_secs(5)).unwrap();
        let id = Uuid::nil();
        let url = client.table_url(JOBS, &[select_all(), id_eq(id)]).unwrap();
        assert_eq!(
            url.as_str(),
            format!(
                "https://demo.supabase.co/rest/v1/jobs?select=*&id=eq.{}",
                id
            )
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = SupabaseClient::new("not a url", "anon", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
