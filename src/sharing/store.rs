use async_trait::async_trait;

use super::ScopeProbe;
use crate::db::SavedQueryPermission;
use crate::error::AppResult;

/// Grant storage used by the sharing engine.
///
/// Implementations run every call on the caller's transaction; the engine
/// never commits or retries.
#[async_trait]
pub trait ScopeStore: Send {
    async fn resource_belongs_to_actor(&mut self, actor_id: &str, query_id: i64)
        -> AppResult<bool>;

    async fn probe_scope(&mut self, query_id: i64) -> AppResult<ScopeProbe>;

    async fn is_shared_to_user(&mut self, query_id: i64, user_id: &str) -> AppResult<bool>;

    async fn insert_public_grant(&mut self, query_id: i64) -> AppResult<SavedQueryPermission>;

    async fn insert_user_grants(
        &mut self,
        query_id: i64,
        user_ids: &[String],
    ) -> AppResult<Vec<SavedQueryPermission>>;

    async fn delete_public_grant(&mut self, query_id: i64) -> AppResult<()>;

    async fn delete_user_grants(&mut self, query_id: i64, user_ids: &[String]) -> AppResult<()>;

    async fn delete_all_user_grants(&mut self, query_id: i64) -> AppResult<()>;

    async fn all_grants_for(&mut self, query_id: i64) -> AppResult<Vec<SavedQueryPermission>>;
}
