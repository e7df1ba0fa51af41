use crate::config::WardenConfig;
use crate::db::Database;
use crate::sso::{build_providers, SsoError, SsoProviders};
use crate::tasks::TaskQueue;
use crate::token::{TokenError, TokenIssuer};
use chrono::NaiveDate;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Members whose last seen date was already queued today, keyed by member id and day
pub type SeenCache = Cache<(i64, NaiveDate), ()>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Sso(#[from] SsoError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WardenConfig>,
    pub db: Database,
    pub tokens: Arc<TokenIssuer>,
    pub sso: Arc<SsoProviders>,
    pub tasks: TaskQueue,
    pub seen: SeenCache,
}

impl AppState {
    pub fn new(config: WardenConfig, db: Database, tasks: TaskQueue) -> Result<Self, StateError> {
        let sso = build_providers(&config)?;
        let tokens = TokenIssuer::new(&config.token)?;

        Ok(Self {
            config: Arc::new(config),
            db,
            tokens: Arc::new(tokens),
            sso: Arc::new(sso),
            tasks,
            seen: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(Duration::from_secs(24 * 60 * 60))
                .build(),
        })
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> bool {
        self.db.ping().await
    }

    /// Creates a state backed by an in-memory database
    #[cfg(test)]
    pub async fn for_testing(config: &WardenConfig) -> Self {
        let db = Database::in_memory()
            .await
            .expect("Failed to create in-memory database");
        let (tasks, _worker) = crate::tasks::spawn(
            db.clone(),
            config.task_queue_capacity,
            tokio_util::sync::CancellationToken::new(),
        );

        Self::new(config.clone(), db, tasks).expect("Failed to initialize application state")
    }

    /// Replaces or adds a single sign-on provider
    #[cfg(test)]
    pub fn with_sso_provider(
        mut self,
        name: &'static str,
        provider: Arc<dyn crate::sso::SsoProvider>,
    ) -> Self {
        let mut providers: SsoProviders = (*self.sso).clone();
        providers.insert(name, provider);
        self.sso = Arc::new(providers);
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_clone() {
        let state = AppState::for_testing(&WardenConfig::for_test()).await;
        let state2 = state.clone();

        // After cloning, both instances should point to the same data
        assert_eq!(Arc::as_ptr(&state.config), Arc::as_ptr(&state2.config));
        assert_eq!(Arc::as_ptr(&state.tokens), Arc::as_ptr(&state2.tokens));
        assert!(state.health_check().await);
    }
}
