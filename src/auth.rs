use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures_timer::Delay;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::form::SubmitError;
use crate::session::SessionStore;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
}

impl UserRole {
    pub fn dashboard_path(self) -> &'static str {
        match self {
            UserRole::Student => "/student/dashboard",
            UserRole::Instructor => "/instructor/dashboard",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Please fill out all fields")]
    MissingFields,
    #[error("{0}")]
    Backend(String),
    #[error("could not store session: {0}")]
    Session(String),
}

impl From<AuthError> for SubmitError {
    fn from(error: AuthError) -> Self {
        SubmitError::with_source(error.to_string(), error)
    }
}

pub type BoxedAuthFuture<'a> = BoxFuture<'a, Result<AuthSession, AuthError>>;

/// Identity provider reached by the login and signup forms.
pub trait AuthBackend: Send + Sync + 'static {
    fn login<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
        role: UserRole,
    ) -> BoxedAuthFuture<'a>;

    fn signup<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
        role: UserRole,
    ) -> BoxedAuthFuture<'a>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AuthOptions {
    pub latency: Duration,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1000),
        }
    }
}

/// Stand-in identity provider: any non-empty credentials are accepted after
/// the configured latency.
#[derive(Clone, Debug, Default)]
pub struct SimulatedAuthBackend {
    options: AuthOptions,
}

impl SimulatedAuthBackend {
    pub fn new(options: AuthOptions) -> Self {
        Self { options }
    }

    async fn wait(&self) {
        if !self.options.latency.is_zero() {
            Delay::new(self.options.latency).await;
        }
    }

    fn issue(name: &str, email: &str, role: UserRole) -> AuthSession {
        AuthSession {
            user: User {
                id: format!("user-{}", Uuid::new_v4().simple()),
                name: name.to_string(),
                email: email.to_string(),
                role,
            },
            token: Uuid::new_v4().to_string(),
        }
    }
}

impl AuthBackend for SimulatedAuthBackend {
    fn login<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
        role: UserRole,
    ) -> BoxedAuthFuture<'a> {
        async move {
            self.wait().await;
            if email.is_empty() || password.is_empty() {
                return Err(AuthError::InvalidCredentials);
            }
            let name = email.split('@').next().unwrap_or(email);
            Ok(Self::issue(name, email, role))
        }
        .boxed()
    }

    fn signup<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
        role: UserRole,
    ) -> BoxedAuthFuture<'a> {
        async move {
            self.wait().await;
            if name.is_empty() || email.is_empty() || password.is_empty() {
                return Err(AuthError::MissingFields);
            }
            Ok(Self::issue(name, email, role))
        }
        .boxed()
    }
}

#[derive(Clone, Debug, Default)]
struct AuthState {
    user: Option<User>,
    loading: bool,
    error: Option<String>,
}

/// Signed-in user plus the loading and error flags the auth pages render.
pub struct AuthContext<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    state: Arc<RwLock<AuthState>>,
}

impl<B, S> Clone for AuthContext<B, S> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            store: self.store.clone(),
            state: self.state.clone(),
        }
    }
}

impl<B, S> AuthContext<B, S>
where
    B: AuthBackend,
    S: SessionStore,
{
    pub fn new(backend: B, store: S) -> Self {
        Self::with_shared(Arc::new(backend), Arc::new(store))
    }

    pub fn with_shared(backend: Arc<B>, store: Arc<S>) -> Self {
        Self {
            backend,
            store,
            state: Arc::new(RwLock::new(AuthState::default())),
        }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        self.begin();
        let result = self.backend.login(email, password, role).await;
        self.finish(result, "login")
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        self.begin();
        let result = self.backend.signup(name, email, password, role).await;
        self.finish(result, "signup")
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.write_state().user = None;
        self.store
            .clear()
            .map_err(|error| AuthError::Session(error.to_string()))?;
        debug!("session cleared");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.read_state().user
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.read_state().error
    }

    fn begin(&self) {
        let mut state = self.write_state();
        state.loading = true;
        state.error = None;
    }

    fn finish(
        &self,
        result: Result<AuthSession, AuthError>,
        action: &'static str,
    ) -> Result<User, AuthError> {
        let stored = result.and_then(|session| {
            self.store
                .save_token(&session.token)
                .map_err(|error| AuthError::Session(error.to_string()))?;
            Ok(session.user)
        });

        let mut state = self.write_state();
        state.loading = false;
        match &stored {
            Ok(user) => {
                info!(action, user = %user.id, role = ?user.role, "authenticated");
                state.user = Some(user.clone());
            }
            Err(error) => {
                warn!(action, %error, "authentication failed");
                state.error = Some(error.to_string());
            }
        }
        stored
    }

    fn read_state(&self) -> AuthState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AuthState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
