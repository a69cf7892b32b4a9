//! Authorization of scope transitions.
//!
//! Pure decision function: no storage access, no side effects. The rules, in
//! priority order after the self-share check:
//!
//! | actor               | current scope   | target  | result               |
//! |---------------------|-----------------|---------|----------------------|
//! | not owner, no admin | any             | any     | `Forbidden`          |
//! | owner, no admin     | Public          | any     | `Forbidden`          |
//! | owner, no admin     | Private, Shared | any     | allow                |
//! | admin, not owner    | Private, Shared | any     | `Forbidden`          |
//! | admin               | Public          | Shared  | `InvalidPublicShare` |
//! | admin               | any other       | any     | allow                |

use super::{ActorContext, Denial, ScopeState, TargetScope, TransitionRequest};

pub fn can_transition(
    actor: &ActorContext,
    current: ScopeState,
    request: &TransitionRequest,
) -> Result<(), Denial> {
    if request.names_user(&actor.user_id) {
        return Err(Denial::InvalidSelfShare);
    }

    let target_is_shared = matches!(request.target(), TargetScope::Shared(_));

    match (actor.is_admin, actor.is_owner, current) {
        (false, false, _) => Err(Denial::Forbidden),
        // A public query is locked for its owner; only an administrator may change it.
        (false, true, ScopeState::Public) => Err(Denial::Forbidden),
        (false, true, _) => Ok(()),
        (true, false, ScopeState::Private | ScopeState::Shared) => Err(Denial::Forbidden),
        (true, _, ScopeState::Public) if target_is_shared => Err(Denial::InvalidPublicShare),
        (true, _, _) => Ok(()),
    }
}
