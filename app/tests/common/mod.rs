//! Common test utilities for integration tests
//!
//! [`TestApp`] wires a full [`AppState`] over an in-memory SQLite database,
//! a pinned clock, sequential ids and an identity provider that accepts any
//! credential. Tests that pause tokio time use [`TestApp::without_database`]
//! instead: a paused clock auto-advances past the pool's acquire timeout
//! while SQLite opens its connection.

#![allow(dead_code)]

use appfitness_app::auth::{AuthUser, Credential, IdentityError, IdentityProvider};
use appfitness_app::config::AppConfig;
use appfitness_app::db;
use appfitness_app::repositories::{MemoryStore, SqliteStore, WorkoutStore};
use appfitness_app::services::{FixedClock, SequentialIds};
use appfitness_app::state::AppState;
use appfitness_shared::{Catalog, User};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Accepts any credential; the user id is derived from the token text
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, credential: Credential) -> Result<AuthUser, IdentityError> {
        let token = credential.id_token.expose_secret().clone();
        if token.is_empty() {
            return Err(IdentityError::Rejected("MISSING_ID_TOKEN".to_string()));
        }
        Ok(AuthUser {
            user: User {
                id: format!("uid-{}", token),
                email: Some(format!("{}@example.com", token)),
                display_name: Some(token.clone()),
            },
            id_token: SecretString::new(format!("app-token-{}", token)),
            refresh_token: None,
            expires_at: None,
        })
    }
}

/// Wednesday morning
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap()
}

/// Test application wrapper
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<FixedClock>,
    /// None when built over the memory store
    pub pool: Option<SqlitePool>,
}

impl TestApp {
    /// A started engine with nobody signed in
    pub async fn new() -> Self {
        let pool = db::create_pool("sqlite::memory:", 1)
            .await
            .expect("Failed to create test database pool");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let store = Arc::new(SqliteStore::new(pool.clone()));
        Self::build(store, Some(pool)).await
    }

    /// A started engine over the memory store, safe under paused time
    pub async fn without_database() -> Self {
        Self::build(Arc::new(MemoryStore::new()), None).await
    }

    async fn build(store: Arc<dyn WorkoutStore>, pool: Option<SqlitePool>) -> Self {
        let clock = Arc::new(FixedClock::new(start_time()));
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(Catalog::bundled().clone()),
            store,
            Arc::new(FakeIdentity),
            clock.clone(),
            Arc::new(SequentialIds::new()),
        );
        state
            .restore_session(None)
            .await
            .expect("Failed to restore session");

        Self { state, clock, pool }
    }

    /// A started engine with `name` signed in
    pub async fn signed_in(name: &str) -> Self {
        let app = Self::new().await;
        app.sign_in(name).await;
        app
    }

    pub async fn sign_in(&self, name: &str) -> User {
        self.state
            .sign_in(Credential::google(name))
            .await
            .expect("Failed to sign in")
    }

    pub fn pool(&self) -> &SqlitePool {
        self.pool.as_ref().expect("Test app has no database")
    }

    /// Documents stored in the database for one collection, all users
    pub async fn stored_count(&self, collection: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(self.pool())
            .await
            .expect("Failed to count documents")
    }
}
