//! Authentication module
//!
//! Sign-in is federated: a provider credential (e.g. a Google ID token) is
//! exchanged for an app identity. [`AuthSession`] holds the signed-in user
//! and publishes every change to subscribers.

mod firebase;
mod jwt;

pub use firebase::FirebaseIdentity;
pub use jwt::{IdTokenClaims, IdTokenDecoder};

use crate::error::{AppError, AppResult};
use crate::repositories::UserScope;
use appfitness_shared::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// Identity provider failures
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Credential rejected: {0}")]
    Rejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed ID token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        AppError::Identity(err.to_string())
    }
}

/// Credential obtained from an external provider's sign-in flow
#[derive(Debug, Clone)]
pub struct Credential {
    pub provider_id: String,
    pub id_token: SecretString,
}

impl Credential {
    pub fn google(id_token: impl Into<String>) -> Self {
        Self {
            provider_id: "google.com".to_string(),
            id_token: SecretString::new(id_token.into()),
        }
    }
}

/// A signed-in user with the tokens the stores need
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub id_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    pub fn scope(&self) -> UserScope {
        UserScope::with_token(self.user.id.clone(), self.id_token.clone())
    }
}

/// What subscribers see of the authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    /// True until the first state is known and while a sign-in runs.
    /// Data queries are suppressed while loading.
    pub loading: bool,
}

/// Exchanges provider credentials for an app identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credential: Credential) -> Result<AuthUser, IdentityError>;

    async fn sign_out(&self, _user: &AuthUser) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// Current authentication state and the provider that changes it
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    session: watch::Sender<Option<AuthUser>>,
    state: watch::Sender<AuthState>,
}

impl AuthSession {
    /// Starts in the loading state until [`restore`](Self::restore) runs
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (session, _) = watch::channel(None);
        let (state, _) = watch::channel(AuthState {
            user: None,
            loading: true,
        });
        Self {
            provider,
            session,
            state,
        }
    }

    /// Finish start-up with whatever session the host persisted, if any
    pub fn restore(&self, user: Option<AuthUser>) {
        self.publish(user, false);
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Scope for data operations; None while loading or signed out
    pub fn scope(&self) -> Option<UserScope> {
        if self.state.borrow().loading {
            return None;
        }
        self.session.borrow().as_ref().map(AuthUser::scope)
    }

    pub async fn sign_in(&self, credential: Credential) -> AppResult<User> {
        let previous = self.session.borrow().clone();
        self.state.send_modify(|s| s.loading = true);

        match self.provider.sign_in(credential).await {
            Ok(signed_in) => {
                let user = signed_in.user.clone();
                self.publish(Some(signed_in), false);
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.publish(previous, false);
                Err(e.into())
            }
        }
    }

    /// Sign out locally even if the provider call fails
    pub async fn sign_out(&self) {
        let current = self.session.borrow().clone();
        if let Some(user) = &current {
            if let Err(e) = self.provider.sign_out(user).await {
                warn!(error = %e, "Provider sign-out failed; clearing local session");
            }
            info!(user_id = %user.user.id, "User signed out");
        }
        self.publish(None, false);
    }

    /// Fails with `AuthRequired` unless a user is signed in
    pub fn require_scope(&self) -> AppResult<UserScope> {
        self.scope().ok_or(AppError::AuthRequired)
    }

    fn publish(&self, user: Option<AuthUser>, loading: bool) {
        let public = user.as_ref().map(|u| u.user.clone());
        self.session.send_replace(user);
        self.state.send_replace(AuthState {
            user: public,
            loading,
        });
    }
}
