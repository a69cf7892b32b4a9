use std::collections::BTreeSet;

use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// User Repository
// ============================================================================

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, display_name, is_admin, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Return the ids from `ids` that do not belong to any user.
    pub async fn find_missing(
        conn: &mut SqliteConnection,
        ids: &BTreeSet<String>,
    ) -> AppResult<Vec<String>> {
        let mut missing = Vec::new();
        for id in ids {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(AppError::Database)?;

            if exists.is_none() {
                missing.push(id.clone());
            }
        }
        Ok(missing)
    }
}

#[cfg(test)]
impl UserRepository {
    /// Users are provisioned externally; tests seed them directly.
    pub async fn create(
        pool: &SqlitePool,
        id: &str,
        login: &str,
        is_admin: bool,
    ) -> AppResult<User> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, login, display_name, is_admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, login, display_name, is_admin, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(login)
        .bind(login)
        .bind(is_admin)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }
}
