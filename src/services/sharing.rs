use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::{SavedQueryPermissionRepository, SavedQueryRepository, User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::sharing::{
    executor, gate, unshare, ActorContext, ScopeProbe, ScopeState, ScopeStore, TargetScope,
    Transition, TransitionRequest, UnshareRequest,
};
use crate::AppState;

/// Sharing state of a saved query as shown to its owner or an administrator.
#[derive(Debug, Clone, Serialize)]
pub struct SharingSummary {
    pub query_id: i64,
    pub scope: ScopeState,
    pub public: bool,
    pub shared_to_user_ids: Vec<String>,
}

pub struct SharingService;

impl SharingService {
    /// Move a saved query to the scope described by `request`.
    ///
    /// The whole read-decide-write sequence runs in one transaction that holds
    /// the write lock from its first statement; a denial, an error, or the
    /// deadline expiring drops the transaction and rolls it back.
    pub async fn share(
        state: &Arc<AppState>,
        user: &User,
        query_id: i64,
        request: TransitionRequest,
    ) -> AppResult<Transition> {
        with_deadline(
            state,
            query_id,
            Self::share_in_transaction(&state.db, user, query_id, &request),
        )
        .await
    }

    /// Revoke the grants of specific users.
    pub async fn unshare(
        state: &Arc<AppState>,
        user: &User,
        query_id: i64,
        request: UnshareRequest,
    ) -> AppResult<()> {
        with_deadline(
            state,
            query_id,
            Self::unshare_in_transaction(&state.db, user, query_id, &request),
        )
        .await
    }

    /// Current sharing state, readable by the owner and administrators.
    ///
    /// Display only: no lock is taken.
    pub async fn summary(
        state: &Arc<AppState>,
        user: &User,
        query_id: i64,
    ) -> AppResult<SharingSummary> {
        let query = SavedQueryRepository::find_by_id(&state.db, query_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Saved query not found".to_string()))?;

        if query.user_id != user.id && !user.is_admin {
            return Err(AppError::Forbidden);
        }

        let grants = SavedQueryPermissionRepository::list_for_query(&state.db, query_id).await?;
        let public = grants.iter().any(|g| g.public);
        let shared_to_user_ids: Vec<String> = grants
            .into_iter()
            .filter_map(|g| g.shared_to_user_id)
            .collect();

        let scope = ScopeProbe::new(public, !shared_to_user_ids.is_empty()).classify(query_id)?;

        Ok(SharingSummary {
            query_id,
            scope,
            public,
            shared_to_user_ids,
        })
    }

    async fn share_in_transaction(
        pool: &SqlitePool,
        user: &User,
        query_id: i64,
        request: &TransitionRequest,
    ) -> AppResult<Transition> {
        let mut tx = pool.begin().await?;
        let conn: &mut SqliteConnection = &mut tx;

        let actor = resolve_actor(conn, user, query_id).await?;
        let current = conn.probe_scope(query_id).await?.classify(query_id)?;

        if let Err(denial) = gate::can_transition(&actor, current, request) {
            tracing::warn!(
                "Sharing denied: user {} on saved query {} (scope {:?}, target {:?}): {}",
                actor.user_id,
                query_id,
                current,
                request.target(),
                denial
            );
            return Err(denial.into());
        }

        if let TargetScope::Shared(user_ids) = request.target() {
            let missing = UserRepository::find_missing(conn, user_ids).await?;
            if !missing.is_empty() {
                return Err(AppError::NotFound(format!(
                    "User not found: {}",
                    missing.join(", ")
                )));
            }
        }

        let transition = executor::apply(conn, query_id, current, request).await?;
        tx.commit().await?;

        match &transition {
            Transition::Unchanged => tracing::debug!(
                "Saved query {} already {:?}; nothing to do",
                query_id,
                current
            ),
            Transition::Revoked => tracing::info!(
                "User {} made saved query {} private (was {:?})",
                actor.user_id,
                query_id,
                current
            ),
            Transition::Granted(grants) => tracing::info!(
                "User {} updated sharing of saved query {}: {:?} -> {} grant(s)",
                actor.user_id,
                query_id,
                current,
                grants.len()
            ),
        }

        Ok(transition)
    }

    async fn unshare_in_transaction(
        pool: &SqlitePool,
        user: &User,
        query_id: i64,
        request: &UnshareRequest,
    ) -> AppResult<()> {
        let mut tx = pool.begin().await?;
        let conn: &mut SqliteConnection = &mut tx;

        let actor = resolve_actor(conn, user, query_id).await?;

        let shared_to_actor = if unshare::needs_grant_probe(&actor, request) {
            conn.is_shared_to_user(query_id, &actor.user_id).await?
        } else {
            false
        };

        if let Err(denial) = unshare::can_unshare(&actor, request, shared_to_actor) {
            tracing::warn!(
                "Unshare denied: user {} on saved query {}: {}",
                actor.user_id,
                query_id,
                denial
            );
            return Err(denial.into());
        }

        unshare::unshare(conn, query_id, request).await?;
        tx.commit().await?;

        tracing::info!(
            "User {} revoked access to saved query {} for {} user(s)",
            actor.user_id,
            query_id,
            request.user_ids().len()
        );

        Ok(())
    }
}

/// Lock the saved query and work out how `user` relates to it.
async fn resolve_actor(
    conn: &mut SqliteConnection,
    user: &User,
    query_id: i64,
) -> AppResult<ActorContext> {
    if !SavedQueryRepository::lock_for_update(conn, query_id).await? {
        return Err(AppError::NotFound("Saved query not found".to_string()));
    }

    let is_owner = conn.resource_belongs_to_actor(&user.id, query_id).await?;
    Ok(ActorContext::new(user.id.clone(), user.is_admin, is_owner))
}

async fn with_deadline<T, F>(state: &AppState, query_id: i64, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let deadline = state.config.sharing.transition_timeout();
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                "Sharing update of saved query {} exceeded {}ms; rolled back",
                query_id,
                deadline.as_millis()
            );
            Err(AppError::ServiceUnavailable(
                "Sharing update timed out, please retry".to_string(),
            ))
        }
    }
}
