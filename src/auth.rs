//! Admin authentication gate. Everything behind the dashboard requires a
//! signed-in session; sessions expire after a period of inactivity.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};
use tokio::time::Instant;

use crate::observability;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    Provider(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid email or password"),
            AuthError::Provider(msg) => write!(f, "auth provider error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub email: String,
}

/// Credential backend. The production deployment points this at the hosted
/// identity service; tests use [`StaticAuth`].
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError>;
}

/// Single fixed admin credential, checked locally.
pub struct StaticAuth {
    email: String,
    password: String,
}

impl StaticAuth {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        if email == self.email && password == self.password {
            Ok(AdminUser {
                email: email.to_string(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn(AdminUser),
}

struct Session {
    user: AdminUser,
    last_activity: Instant,
}

/// Session holder over an [`AuthProvider`]. `current_user` treats a session
/// idle past the timeout as signed out; `touch` resets the idle clock.
pub struct AuthGate {
    provider: Arc<dyn AuthProvider>,
    session: RwLock<Option<Session>>,
    timeout: Duration,
    state_tx: watch::Sender<AuthState>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn AuthProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            session: RwLock::new(None),
            timeout,
            state_tx: watch::channel(AuthState::SignedOut).0,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let user = match self.provider.sign_in(email, password).await {
            Ok(user) => user,
            Err(e) => {
                metrics::counter!(observability::AUTH_FAILURES_TOTAL).increment(1);
                tracing::warn!(email, "sign-in failed: {e}");
                return Err(e);
            }
        };
        tracing::info!(email = %user.email, "admin signed in");
        *self.session.write().await = Some(Session {
            user: user.clone(),
            last_activity: Instant::now(),
        });
        let _ = self.state_tx.send(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    /// The signed-in admin, or `None` when signed out or idle-expired.
    /// Expiry is lazy: the session is dropped the first time it is observed
    /// past its deadline.
    pub async fn current_user(&self) -> Option<AdminUser> {
        {
            let session = self.session.read().await;
            match session.as_ref() {
                Some(s) if s.last_activity.elapsed() < self.timeout => {
                    return Some(s.user.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Idle past the deadline
        tracing::info!("admin session expired");
        *self.session.write().await = None;
        let _ = self.state_tx.send(AuthState::SignedOut);
        None
    }

    /// Record activity, pushing the expiry deadline forward.
    pub async fn touch(&self) {
        if let Some(session) = self.session.write().await.as_mut() {
            session.last_activity = Instant::now();
        }
    }

    pub async fn sign_out(&self) {
        *self.session.write().await = None;
        let _ = self.state_tx.send(AuthState::SignedOut);
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }
}
