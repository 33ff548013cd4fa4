use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dto::auth_dto::{AuthEvent, Session, SessionResponse};
use crate::error::{Error, Result};
use crate::models::user::{Role, User};
use crate::services::notice_service::NoticeService;
use crate::services::remote::{AuthService, DataService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Loading,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

impl From<&SessionState> for SessionResponse {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::Unauthenticated => SessionResponse::Unauthenticated,
            SessionState::Loading => SessionResponse::Loading,
            SessionState::Authenticated(user) => SessionResponse::Authenticated {
                is_admin: user.is_admin(),
                user: user.clone(),
            },
        }
    }
}

/// Which roles a holder accepts. Sessions outside it are signed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleRequirement {
    #[default]
    AnyRole,
    AdminOnly,
}

impl RoleRequirement {
    fn admits(&self, role: Role) -> bool {
        match self {
            RoleRequirement::AnyRole => true,
            RoleRequirement::AdminOnly => role == Role::Admin,
        }
    }
}

struct Inner {
    auth: Arc<dyn AuthService>,
    data: Arc<dyn DataService>,
    notices: NoticeService,
    requirement: RoleRequirement,
    state: watch::Sender<SessionState>,
}

/// Signed-in identity for the process, resolved against the `profiles` table.
#[derive(Clone)]
pub struct SessionHolder {
    inner: Arc<Inner>,
}

/// Settles a holder left in `Loading` once the owning operation returns or is dropped.
struct Settle<'a> {
    holder: &'a SessionHolder,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.holder.inner.state.send_if_modified(|state| {
            if *state == SessionState::Loading {
                *state = SessionState::Unauthenticated;
                true
            } else {
                false
            }
        });
    }
}

impl SessionHolder {
    pub fn new(
        auth: Arc<dyn AuthService>,
        data: Arc<dyn DataService>,
        notices: NoticeService,
        requirement: RoleRequirement,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            inner: Arc::new(Inner {
                auth,
                data,
                notices,
                requirement,
                state,
            }),
        }
    }

    pub fn requirement(&self) -> RoleRequirement {
        self.inner.requirement
    }

    fn set(&self, state: SessionState) {
        self.inner.state.send_replace(state);
    }

    fn start(&self) -> Settle<'_> {
        self.set(SessionState::Loading);
        Settle { holder: self }
    }

    /// Restores any session the auth service already holds.
    pub async fn mount(&self) {
        let _settle = self.start();
        match self.inner.auth.current_session().await {
            Ok(Some(session)) => {
                if let Err(e) = self.adopt(&session).await {
                    if matches!(e, Error::Forbidden(_)) {
                        self.inner
                            .notices
                            .error("Your account does not have access to this area");
                    }
                }
            }
            Ok(None) => {
                debug!("No existing session");
                self.set(SessionState::Unauthenticated);
            }
            Err(e) => {
                error!(error = %e, "Failed to restore session");
                self.set(SessionState::Unauthenticated);
            }
        }
    }

    /// Follows session changes made through the auth service until its channel closes.
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let mut events = self.inner.auth.subscribe();
        let holder = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => holder.on_auth_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed session events, resyncing");
                        holder.mount().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Session listener stopped");
        })
    }

    pub async fn on_auth_event(&self, event: AuthEvent) {
        let current = self.state();
        // An operation in flight resolves the session itself.
        if current == SessionState::Loading {
            debug!("Ignoring session event while an operation is in flight");
            return;
        }
        match event {
            AuthEvent::SignedOut => {
                debug!("Signed out elsewhere");
                self.set(SessionState::Unauthenticated);
            }
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                if current.user().is_some_and(|u| u.id == session.user.id) {
                    return;
                }
                let _settle = self.start();
                let _ = self.adopt(&session).await;
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let _settle = self.start();
        let result = match self.inner.auth.sign_in(email, password).await {
            Ok(session) => self.adopt(&session).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(user) => {
                info!(user_id = %user.id, role = ?user.role, "Logged in");
                self.inner.notices.success("Logged in successfully!");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.inner
                    .notices
                    .error("Failed to log in. Please check your credentials.");
                Err(e)
            }
        }
    }

    /// Registers a new applicant. `None` means the address still has to be confirmed.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<Option<User>> {
        let _settle = self.start();
        let session = match self.inner.auth.sign_up(email, password, name).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Sign-up failed");
                self.inner.notices.error(format!("Failed to sign up: {}", e));
                return Err(e);
            }
        };

        let Some(session) = session else {
            info!("Sign-up pending e-mail confirmation");
            self.inner
                .notices
                .info("Check your e-mail to confirm your account");
            return Ok(None);
        };

        match self.adopt(&session).await {
            Ok(user) => {
                info!(user_id = %user.id, "Signed up");
                self.inner.notices.success("Account created successfully!");
                Ok(Some(user))
            }
            Err(e) => {
                self.inner.notices.error(format!("Failed to sign up: {}", e));
                Err(e)
            }
        }
    }

    /// Always ends `Unauthenticated`, even when the remote sign-out fails.
    pub async fn logout(&self) {
        let _settle = self.start();
        match self.inner.auth.sign_out().await {
            Ok(()) => {
                info!("Logged out");
                self.inner.notices.success("Logged out successfully");
            }
            Err(e) => {
                error!(error = %e, "Remote sign-out failed");
                self.inner.notices.error("Failed to log out");
            }
        }
        self.set(SessionState::Unauthenticated);
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().user().is_some_and(User::is_admin)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Waits out any operation in progress and returns the state it settled on.
    pub async fn settled(&self) -> SessionState {
        let mut changes = self.subscribe();
        let settled = changes
            .wait_for(|state| *state != SessionState::Loading)
            .await
            .map(|state| (*state).clone());
        settled.unwrap_or(SessionState::Unauthenticated)
    }

    /// Resolves `session` into a user and publishes it, or signs out when the role is refused.
    async fn adopt(&self, session: &Session) -> Result<User> {
        match self.resolve_user(session).await {
            Ok(user) => {
                self.set(SessionState::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e @ Error::Forbidden(_)) => {
                warn!(user_id = %session.user.id, error = %e, "Session refused");
                if let Err(sign_out) = self.inner.auth.sign_out().await {
                    error!(error = %sign_out, "Failed to sign out refused session");
                }
                self.set(SessionState::Unauthenticated);
                Err(e)
            }
            Err(e) => {
                error!(user_id = %session.user.id, error = %e, "Failed to resolve profile");
                self.set(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    async fn resolve_user(&self, session: &Session) -> Result<User> {
        let profile = self
            .inner
            .data
            .get_profile(session.user.id)
            .await?
            .ok_or_else(|| Error::Forbidden("No profile for this account".into()))?;

        let role = profile
            .role
            .as_deref()
            .and_then(Role::parse)
            .ok_or_else(|| Error::Forbidden("Unrecognised account role".into()))?;
        if !self.inner.requirement.admits(role) {
            return Err(Error::Forbidden("Account role is not permitted here".into()));
        }

        let email = profile
            .email
            .or_else(|| session.user.email.clone())
            .unwrap_or_default();
        let name = profile
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(User {
            id: session.user.id,
            email,
            name,
            role,
        })
    }
}
