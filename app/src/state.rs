//! Application state management
//!
//! [`AppState`] owns every long-lived part of the engine: the auth session,
//! the data facade and its snapshots, the active workout session and the
//! rest timer. Hosts create it once at startup and keep it for the life of
//! the process; nothing is torn down, only reset on sign-out.
//!
//! # Design Principles
//!
//! 1. **Explicit lifecycle**: stores are created in [`AppState::bootstrap`]
//!    and handed around by `Arc`, never looked up globally
//! 2. **Injected effects**: clock, id generator, document store and
//!    identity provider are constructor arguments so tests can pin them
//! 3. **Scoped data**: every data operation reads the signed-in user from
//!    the auth session at call time

use crate::auth::{AuthSession, AuthUser, Credential, FirebaseIdentity, IdentityProvider};
use crate::config::{AppConfig, StorageBackend};
use crate::db;
use crate::error::AppResult;
use crate::repositories::{CloudStore, MemoryStore, SqliteStore, UserScope, WorkoutStore};
use crate::services::{
    Clock, Dashboard, DataExport, DataFacade, ExportService, FinishOutcome, IdGenerator,
    PhotoRemoval, ProgressDraft, ProgressService, RestTimerService, SessionEditor, SystemClock,
    UuidGenerator,
};
use appfitness_shared::{Catalog, ProgressEntry, User};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<Catalog>,
    pub auth: Arc<AuthSession>,
    pub data: Arc<DataFacade>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    /// The active workout; one editor per process
    pub session: Mutex<SessionEditor>,
    pub timer: RestTimerService,
    pub progress: ProgressService,
    pub export: ExportService,
}

impl AppState {
    /// Wire the state from its parts. The auth session starts loading;
    /// call [`restore_session`](Self::restore_session) to finish start-up.
    pub fn new(
        config: AppConfig,
        catalog: Arc<Catalog>,
        store: Arc<dyn WorkoutStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let data = Arc::new(DataFacade::new(store));
        let session = SessionEditor::new(
            catalog.clone(),
            ids.clone(),
            clock.clone(),
            config.session.clone(),
        );

        Self {
            timer: RestTimerService::new(&config.timer),
            progress: ProgressService::new(data.clone(), ids.clone(), clock.clone()),
            export: ExportService::new(clock.clone()),
            session: Mutex::new(session),
            auth: Arc::new(AuthSession::new(identity)),
            config: Arc::new(config),
            catalog,
            data,
            clock,
            ids,
        }
    }

    /// Build the production state from configuration: the configured
    /// document store, the hosted identity provider, the system clock and
    /// random ids.
    pub async fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let store: Arc<dyn WorkoutStore> = match config.storage.backend {
            StorageBackend::Memory => {
                warn!("Using in-memory storage; data is lost on exit");
                Arc::new(MemoryStore::new())
            }
            StorageBackend::Sqlite => {
                let pool =
                    db::create_pool(&config.storage.sqlite_url, config.storage.max_connections)
                        .await?;
                db::run_migrations(&pool).await?;
                Arc::new(SqliteStore::new(pool))
            }
            StorageBackend::Cloud => Arc::new(CloudStore::new(&config.cloud)?),
        };

        let project_id = Some(config.cloud.project_id.as_str()).filter(|p| !p.is_empty());
        let identity = Arc::new(FirebaseIdentity::new(&config.identity, project_id)?);

        info!(backend = ?config.storage.backend, "Engine started");

        Ok(Self::new(
            config,
            Arc::new(Catalog::bundled().clone()),
            store,
            identity,
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
        ))
    }

    /// Scope of the signed-in user; None while loading or signed out
    pub fn scope(&self) -> Option<UserScope> {
        self.auth.scope()
    }

    /// Finish start-up with the session the host persisted, if any, and
    /// load that user's data
    pub async fn restore_session(&self, user: Option<AuthUser>) -> AppResult<()> {
        self.auth.restore(user);
        self.data.refresh(self.scope().as_ref()).await
    }

    pub async fn sign_in(&self, credential: Credential) -> AppResult<User> {
        let user = self.auth.sign_in(credential).await?;
        self.data.refresh(self.scope().as_ref()).await?;
        Ok(user)
    }

    /// Sign out and reset everything that belonged to the user
    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
        self.data.clear();
        self.session.lock().await.discard();
        self.timer.restore_default();
    }

    /// Save the active workout for the signed-in user
    pub async fn finish_workout(&self) -> AppResult<FinishOutcome> {
        let scope = self.scope();
        self.session
            .lock()
            .await
            .finish(&self.data, scope.as_ref())
            .await
    }

    pub async fn delete_workout(&self, id: &str) -> AppResult<bool> {
        self.data.delete_workout(self.scope().as_ref(), id).await
    }

    pub async fn save_progress(&self, draft: &mut ProgressDraft) -> AppResult<Option<ProgressEntry>> {
        self.progress.save(self.scope().as_ref(), draft).await
    }

    pub async fn delete_progress(&self, entry_id: &str) -> AppResult<bool> {
        self.progress.delete(self.scope().as_ref(), entry_id).await
    }

    pub async fn remove_photo(&self, entry_id: &str, uri: &str) -> AppResult<PhotoRemoval> {
        self.progress
            .remove_photo(self.scope().as_ref(), entry_id, uri)
            .await
    }

    /// A dashboard following this state's snapshots
    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(
            &self.data,
            self.clock.clone(),
            self.config.session.recent_exercise_limit,
        )
    }

    /// Everything the signed-in user has stored
    pub fn export_data(&self) -> AppResult<DataExport> {
        let scope = self.auth.require_scope()?;
        Ok(self
            .export
            .export_json(&scope.user_id, &self.data.workouts(), &self.data.progress()))
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.data.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::IdentityError;
    use crate::error::AppError;
    use crate::services::{FixedClock, SequentialIds};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct NoIdentity;

    #[async_trait]
    impl IdentityProvider for NoIdentity {
        async fn sign_in(&self, _credential: Credential) -> Result<AuthUser, IdentityError> {
            Err(IdentityError::Rejected("disabled".to_string()))
        }
    }

    fn state() -> AppState {
        AppState::new(
            AppConfig::default(),
            Arc::new(Catalog::bundled().clone()),
            Arc::new(MemoryStore::new()),
            Arc::new(NoIdentity),
            Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap(),
            )),
            Arc::new(SequentialIds::new()),
        )
    }

    #[tokio::test]
    async fn test_signed_out_state_stores_nothing() {
        let state = state();
        state.restore_session(None).await.unwrap();
        assert!(state.scope().is_none());

        state.session.lock().await.start_empty();
        let mut draft = ProgressDraft {
            weight: "80".to_string(),
            ..Default::default()
        };
        assert!(state.save_progress(&mut draft).await.unwrap().is_none());
        assert!(matches!(state.export_data(), Err(AppError::AuthRequired)));
        state.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_resets_session_and_timer() {
        let state = state();
        state.restore_session(None).await.unwrap();
        state.session.lock().await.start_empty();
        state.timer.select_preset(180);

        state.sign_out().await;
        assert!(!state.session.lock().await.is_active());
        assert_eq!(
            state.timer.snapshot().base(),
            state.config.timer.default_seconds
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_finishing_leaves_rest_timer_running() {
        let state = state();
        state.restore_session(None).await.unwrap();
        {
            let mut session = state.session.lock().await;
            session.start_empty();
            let bench = state.catalog.exercises()[0].clone();
            session.add_exercises(1, &[bench]).unwrap();
        }
        state.timer.start();
        tokio::time::sleep(std::time::Duration::from_millis(3500)).await;

        let outcome = state.finish_workout().await.unwrap();
        assert!(matches!(outcome, FinishOutcome::Saved(_)));
        assert!(state.timer.is_ticking());
        assert_eq!(state.timer.snapshot().remaining(), 87);
    }
}
