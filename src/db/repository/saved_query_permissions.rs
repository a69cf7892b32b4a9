use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::db::models::SavedQueryPermission;
use crate::db::repository::SavedQueryRepository;
use crate::error::{AppError, AppResult};
use crate::sharing::{ScopeProbe, ScopeStore};

// ============================================================================
// Saved Query Permission Repository
// ============================================================================

const SELECT_COLUMNS: &str =
    "id, query_id, shared_to_user_id, public, created_at, updated_at";

pub struct SavedQueryPermissionRepository;

impl SavedQueryPermissionRepository {
    /// Current grants of a saved query, for display. Not part of any transition.
    pub async fn list_for_query(
        pool: &SqlitePool,
        query_id: i64,
    ) -> AppResult<Vec<SavedQueryPermission>> {
        sqlx::query_as::<_, SavedQueryPermission>(&format!(
            "SELECT {} FROM saved_queries_permissions WHERE query_id = ? ORDER BY public DESC, created_at ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(query_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        query_id: i64,
        shared_to_user_id: Option<&str>,
    ) -> AppResult<SavedQueryPermission> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, SavedQueryPermission>(&format!(
            r#"
            INSERT INTO saved_queries_permissions (
                id, query_id, shared_to_user_id, public, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(query_id)
        .bind(shared_to_user_id)
        .bind(shared_to_user_id.is_none())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)
    }
}

#[async_trait]
impl ScopeStore for SqliteConnection {
    async fn resource_belongs_to_actor(
        &mut self,
        actor_id: &str,
        query_id: i64,
    ) -> AppResult<bool> {
        SavedQueryRepository::is_owned_by(self, query_id, actor_id).await
    }

    async fn probe_scope(&mut self, query_id: i64) -> AppResult<ScopeProbe> {
        let (has_public_grant, has_user_grants): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM saved_queries_permissions WHERE query_id = ?1 AND public = 1),
                EXISTS (SELECT 1 FROM saved_queries_permissions WHERE query_id = ?1 AND shared_to_user_id IS NOT NULL)
            "#,
        )
        .bind(query_id)
        .fetch_one(&mut *self)
        .await
        .map_err(AppError::Database)?;

        Ok(ScopeProbe::new(has_public_grant != 0, has_user_grants != 0))
    }

    async fn is_shared_to_user(&mut self, query_id: i64, user_id: &str) -> AppResult<bool> {
        let shared: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM saved_queries_permissions WHERE query_id = ? AND shared_to_user_id = ?",
        )
        .bind(query_id)
        .bind(user_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(AppError::Database)?;

        Ok(shared.is_some())
    }

    async fn insert_public_grant(&mut self, query_id: i64) -> AppResult<SavedQueryPermission> {
        SavedQueryPermissionRepository::insert(self, query_id, None).await
    }

    async fn insert_user_grants(
        &mut self,
        query_id: i64,
        user_ids: &[String],
    ) -> AppResult<Vec<SavedQueryPermission>> {
        let mut out = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            out.push(SavedQueryPermissionRepository::insert(self, query_id, Some(user_id)).await?);
        }
        Ok(out)
    }

    async fn delete_public_grant(&mut self, query_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM saved_queries_permissions WHERE query_id = ? AND public = 1")
            .bind(query_id)
            .execute(&mut *self)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    async fn delete_user_grants(&mut self, query_id: i64, user_ids: &[String]) -> AppResult<()> {
        for user_id in user_ids {
            sqlx::query(
                "DELETE FROM saved_queries_permissions WHERE query_id = ? AND shared_to_user_id = ?",
            )
            .bind(query_id)
            .bind(user_id)
            .execute(&mut *self)
            .await
            .map_err(AppError::Database)?;
        }

        Ok(())
    }

    async fn delete_all_user_grants(&mut self, query_id: i64) -> AppResult<()> {
        sqlx::query(
            "DELETE FROM saved_queries_permissions WHERE query_id = ? AND shared_to_user_id IS NOT NULL",
        )
        .bind(query_id)
        .execute(&mut *self)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn all_grants_for(&mut self, query_id: i64) -> AppResult<Vec<SavedQueryPermission>> {
        sqlx::query_as::<_, SavedQueryPermission>(&format!(
            "SELECT {} FROM saved_queries_permissions WHERE query_id = ? ORDER BY public DESC, created_at ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(query_id)
        .fetch_all(&mut *self)
        .await
        .map_err(AppError::Database)
    }
}
