use std::collections::HashSet;

use super::{ScopeState, ScopeStore, TargetScope, TransitionRequest};
use crate::db::SavedQueryPermission;
use crate::error::{AppError, AppResult};

/// Result of applying an authorized transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current scope; nothing was written.
    Unchanged,
    /// The query was made private.
    Revoked,
    /// Scope was created or expanded; carries every grant the query now has.
    Granted(Vec<SavedQueryPermission>),
}

/// Apply a transition the gate has already allowed.
///
/// Issues the minimal set of grant writes to move `query_id` from `current`
/// to the requested scope. Must run inside the transaction that produced
/// `current`; storage errors are returned as-is.
pub async fn apply<S>(
    store: &mut S,
    query_id: i64,
    current: ScopeState,
    request: &TransitionRequest,
) -> AppResult<Transition>
where
    S: ScopeStore + ?Sized,
{
    match (request.target(), current) {
        (TargetScope::Private, ScopeState::Private) | (TargetScope::Public, ScopeState::Public) => {
            Ok(Transition::Unchanged)
        }

        (TargetScope::Public, _) => {
            if current == ScopeState::Shared {
                store.delete_all_user_grants(query_id).await?;
            }
            store.insert_public_grant(query_id).await?;
            Ok(Transition::Granted(store.all_grants_for(query_id).await?))
        }

        (TargetScope::Private, ScopeState::Public) => {
            store.delete_public_grant(query_id).await?;
            Ok(Transition::Revoked)
        }

        (TargetScope::Private, ScopeState::Shared) => {
            store.delete_all_user_grants(query_id).await?;
            Ok(Transition::Revoked)
        }

        (TargetScope::Shared(_), ScopeState::Public) => Err(AppError::Internal(anyhow::anyhow!(
            "refusing to add user grants to public saved query {}",
            query_id
        ))),

        (TargetScope::Shared(user_ids), _) => {
            let existing: HashSet<String> = store
                .all_grants_for(query_id)
                .await?
                .into_iter()
                .filter_map(|g| g.shared_to_user_id)
                .collect();

            // Sharing is additive: grantees missing from the request keep their access.
            let new_ids: Vec<String> = user_ids
                .iter()
                .filter(|id| !existing.contains(*id))
                .cloned()
                .collect();

            if !new_ids.is_empty() {
                store.insert_user_grants(query_id, &new_ids).await?;
            }

            Ok(Transition::Granted(store.all_grants_for(query_id).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing::store::memory::MemoryScopeStore;

    const QUERY: i64 = 7;
    const OWNER: &str = "owner";

    fn share_to(ids: &[&str]) -> TransitionRequest {
        TransitionRequest::new(ids.iter().map(|s| s.to_string()).collect(), false).unwrap()
    }

    async fn current(store: &mut MemoryScopeStore) -> ScopeState {
        store.probe_scope(QUERY).await.unwrap().classify(QUERY).unwrap()
    }

    async fn step(store: &mut MemoryScopeStore, request: &TransitionRequest) -> Transition {
        let scope = current(store).await;
        apply(store, QUERY, scope, request).await.unwrap()
    }

    #[tokio::test]
    async fn same_scope_is_a_no_op() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);
        assert_eq!(
            step(&mut store, &TransitionRequest::private()).await,
            Transition::Unchanged
        );

        step(&mut store, &TransitionRequest::public()).await;
        let writes = store.writes;
        assert_eq!(
            step(&mut store, &TransitionRequest::public()).await,
            Transition::Unchanged
        );
        assert_eq!(store.writes, writes);
        assert_eq!(store.count(QUERY), 1);
    }

    #[tokio::test]
    async fn sharing_is_additive() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);

        step(&mut store, &share_to(&["a"])).await;
        let result = step(&mut store, &share_to(&["b"])).await;

        match result {
            Transition::Granted(grants) => assert_eq!(grants.len(), 2),
            other => panic!("expected Granted, got: {:?}", other),
        }
        assert_eq!(store.grantees(QUERY), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn resharing_existing_grantee_writes_nothing() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);
        step(&mut store, &share_to(&["a", "b"])).await;
        let writes = store.writes;

        let result = step(&mut store, &share_to(&["a"])).await;
        assert!(matches!(result, Transition::Granted(ref g) if g.len() == 2));
        assert_eq!(store.writes, writes);
    }

    #[tokio::test]
    async fn going_public_replaces_user_grants() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);
        step(&mut store, &share_to(&["a", "b"])).await;

        let result = step(&mut store, &TransitionRequest::public()).await;

        match result {
            Transition::Granted(grants) => {
                assert_eq!(grants.len(), 1);
                assert!(grants[0].public);
                assert_eq!(grants[0].shared_to_user_id, None);
            }
            other => panic!("expected Granted, got: {:?}", other),
        }
        assert_eq!(current(&mut store).await, ScopeState::Public);
    }

    #[tokio::test]
    async fn going_private_removes_every_grant() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);

        step(&mut store, &TransitionRequest::public()).await;
        assert_eq!(
            step(&mut store, &TransitionRequest::private()).await,
            Transition::Revoked
        );
        assert_eq!(store.count(QUERY), 0);

        step(&mut store, &share_to(&["a", "b"])).await;
        assert_eq!(
            step(&mut store, &TransitionRequest::private()).await,
            Transition::Revoked
        );
        assert_eq!(store.count(QUERY), 0);
    }

    #[tokio::test]
    async fn scope_shapes_never_mix() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);
        let sequence = [
            share_to(&["a"]),
            TransitionRequest::public(),
            TransitionRequest::private(),
            share_to(&["b", "c"]),
            share_to(&["a"]),
            TransitionRequest::public(),
            TransitionRequest::public(),
            TransitionRequest::private(),
        ];

        for request in &sequence {
            step(&mut store, request).await;
            let probe = store.probe_scope(QUERY).await.unwrap();
            assert!(probe.classify(QUERY).is_ok(), "mixed grants after {:?}", request);
        }
    }

    #[tokio::test]
    async fn sharing_a_public_query_is_refused() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);
        step(&mut store, &TransitionRequest::public()).await;

        let res = apply(&mut store, QUERY, ScopeState::Public, &share_to(&["a"])).await;
        assert!(matches!(res, Err(AppError::Internal(_))));
        assert_eq!(store.count(QUERY), 1);
    }

    #[tokio::test]
    async fn storage_failure_is_passed_through() {
        let mut store = MemoryScopeStore::with_query(QUERY, OWNER);
        store.fail_writes = true;

        let res = apply(&mut store, QUERY, ScopeState::Private, &share_to(&["a"])).await;
        assert!(matches!(res, Err(AppError::Database(_))));
    }
}
