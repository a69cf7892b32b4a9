use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::{CreateSavedQuery, SavedQuery};
use crate::error::{AppError, AppResult};

// ============================================================================
// Saved Query Repository
// ============================================================================

/// Which saved queries a listing should return, relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityFilter {
    Owned,
    SharedWithMe,
    Public,
    All,
}

pub struct SavedQueryRepository;

impl SavedQueryRepository {
    pub async fn create(
        pool: &SqlitePool,
        owner_user_id: &str,
        data: CreateSavedQuery,
    ) -> AppResult<SavedQuery> {
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, SavedQuery>(
            r#"
            INSERT INTO saved_queries (user_id, name, query, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, name, query, description, created_at, updated_at
            "#,
        )
        .bind(owner_user_id)
        .bind(&data.name)
        .bind(&data.query)
        .bind(&data.description)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<SavedQuery>> {
        sqlx::query_as::<_, SavedQuery>(
            r#"
            SELECT id, user_id, name, query, description, created_at, updated_at
            FROM saved_queries
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Take the write lock for a saved query inside the caller's transaction.
    ///
    /// SQLite has no `SELECT ... FOR UPDATE`; a no-op update as the first
    /// statement acquires the database write lock before any grant row is read,
    /// so concurrent transitions queue behind it. Returns false when the saved
    /// query does not exist.
    pub async fn lock_for_update(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let result = sqlx::query("UPDATE saved_queries SET updated_at = updated_at WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn is_owned_by(
        conn: &mut SqliteConnection,
        id: i64,
        user_id: &str,
    ) -> AppResult<bool> {
        let owned: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM saved_queries WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(AppError::Database)?;

        Ok(owned.is_some())
    }

    /// List saved queries visible to `user_id` through ownership, a user grant,
    /// or a public grant.
    pub async fn list_visible(
        pool: &SqlitePool,
        user_id: &str,
        filter: VisibilityFilter,
    ) -> AppResult<Vec<SavedQuery>> {
        let sql = match filter {
            VisibilityFilter::Owned => {
                r#"
                SELECT q.id, q.user_id, q.name, q.query, q.description, q.created_at, q.updated_at
                FROM saved_queries q
                WHERE q.user_id = ?1
                ORDER BY q.id
                "#
            }
            VisibilityFilter::SharedWithMe => {
                r#"
                SELECT q.id, q.user_id, q.name, q.query, q.description, q.created_at, q.updated_at
                FROM saved_queries q
                JOIN saved_queries_permissions p ON p.query_id = q.id
                WHERE p.shared_to_user_id = ?1
                ORDER BY q.id
                "#
            }
            VisibilityFilter::Public => {
                r#"
                SELECT q.id, q.user_id, q.name, q.query, q.description, q.created_at, q.updated_at
                FROM saved_queries q
                JOIN saved_queries_permissions p ON p.query_id = q.id
                WHERE p.public = 1
                ORDER BY q.id
                "#
            }
            VisibilityFilter::All => {
                r#"
                SELECT DISTINCT q.id, q.user_id, q.name, q.query, q.description, q.created_at, q.updated_at
                FROM saved_queries q
                LEFT JOIN saved_queries_permissions p ON p.query_id = q.id
                WHERE q.user_id = ?1 OR p.shared_to_user_id = ?1 OR p.public = 1
                ORDER BY q.id
                "#
            }
        };

        let mut query = sqlx::query_as::<_, SavedQuery>(sql);
        if filter != VisibilityFilter::Public {
            query = query.bind(user_id);
        }

        query.fetch_all(pool).await.map_err(AppError::Database)
    }

    /// Delete a saved query. Its grants go with it.
    pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM saved_queries WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
