use super::{ActorContext, Denial, ScopeStore, UnshareRequest};
use crate::error::AppResult;

/// Whether [`can_unshare`] needs to know if the query is shared to the actor.
///
/// Only a non-privileged actor revoking their own grant needs the probe.
pub fn needs_grant_probe(actor: &ActorContext, request: &UnshareRequest) -> bool {
    !actor.is_admin && !actor.is_owner && request.is_only(&actor.user_id)
}

/// Decide whether `actor` may revoke the grants named in `request`.
///
/// `shared_to_actor` is the result of the grant probe and only matters when
/// [`needs_grant_probe`] returns true.
pub fn can_unshare(
    actor: &ActorContext,
    request: &UnshareRequest,
    shared_to_actor: bool,
) -> Result<(), Denial> {
    if actor.is_admin || actor.is_owner {
        return Ok(());
    }

    if !request.is_only(&actor.user_id) {
        return Err(Denial::Forbidden);
    }

    if !shared_to_actor {
        return Err(Denial::NothingToUnshare);
    }

    Ok(())
}

/// Delete the user grants named in `request`. Missing grants are ignored.
pub async fn unshare<S>(store: &mut S, query_id: i64, request: &UnshareRequest) -> AppResult<()>
where
    S: ScopeStore + ?Sized,
{
    let user_ids: Vec<String> = request.user_ids().iter().cloned().collect();
    store.delete_user_grants(query_id, &user_ids).await
}
