//! Saved query sharing engine.
//!
//! The engine is split along the read-decide-write sequence of a sharing
//! request:
//! - [`scope`] derives the current sharing scope from the grant rows
//! - [`gate`] decides whether an actor may move a query to a target scope
//! - [`executor`] performs the minimal grant mutations for an allowed transition
//! - [`unshare`] decides and performs the revocation of individual grantees
//!
//! Every storage access goes through the [`ScopeStore`] trait so that the
//! service can run the whole sequence on a single transaction.

pub mod executor;
pub mod gate;
pub mod request;
pub mod scope;
pub mod store;
pub mod unshare;

pub use executor::Transition;
pub use request::{TargetScope, TransitionRequest, UnshareRequest};
pub use scope::{ScopeConsistencyError, ScopeProbe, ScopeState};
pub use store::ScopeStore;

/// The resolved identity of the caller relative to one saved query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: String,
    pub is_admin: bool,
    pub is_owner: bool,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, is_admin: bool, is_owner: bool) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin,
            is_owner,
        }
    }
}

/// Reason a sharing request was refused before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Cannot share a saved query with yourself")]
    InvalidSelfShare,

    #[error("Access denied")]
    Forbidden,

    #[error("Public saved queries cannot be shared with individual users")]
    InvalidPublicShare,

    #[error("Saved query is not shared with you")]
    NothingToUnshare,
}
