use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::generator::ContentGenerator;
use crate::utils::locks::KeyedLocks;

/// Serializes progression transitions per (user id, course id): no two
/// submit/select calls interleave against the same stored state.
pub type SessionLocks = Arc<KeyedLocks<(i64, i64)>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub generator: ContentGenerator,
    pub session_locks: SessionLocks,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let generator = ContentGenerator::new(&config);
        Self {
            pool,
            config,
            generator,
            session_locks: Arc::new(KeyedLocks::new()),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for ContentGenerator {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}
