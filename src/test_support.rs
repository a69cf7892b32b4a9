//! Fixtures for tests that need a database or application state.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::{CreateSavedQuery, SavedQuery, SavedQueryRepository, User, UserRepository};
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Single-connection in-memory database with migrations applied.
///
/// One connection only: every new in-memory connection is a separate database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    pool
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.jwt.secret = TEST_JWT_SECRET.to_string();
    config
}

pub async fn test_state() -> Arc<AppState> {
    Arc::new(AppState {
        db: memory_pool().await,
        config: test_config(),
    })
}

pub async fn user(state: &AppState, id: &str, is_admin: bool) -> User {
    UserRepository::create(&state.db, id, id, is_admin)
        .await
        .expect("create user")
}

pub async fn saved_query(state: &AppState, owner: &User) -> SavedQuery {
    SavedQueryRepository::create(
        &state.db,
        &owner.id,
        CreateSavedQuery {
            name: format!("{} query", owner.login),
            query: "MATCH (n:User) RETURN n LIMIT 10".to_string(),
            description: String::new(),
        },
    )
    .await
    .expect("create saved query")
}
