use serde::Serialize;

/// Sharing scope of a saved query, derived from its grant rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeState {
    Private,
    Public,
    Shared,
}

/// Grant existence flags read from storage for one saved query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeProbe {
    pub has_public_grant: bool,
    pub has_user_grants: bool,
}

/// Storage holds a public grant and user grants for the same query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("saved query {query_id} has both a public grant and user grants")]
pub struct ScopeConsistencyError {
    pub query_id: i64,
}

impl ScopeProbe {
    pub fn new(has_public_grant: bool, has_user_grants: bool) -> Self {
        Self {
            has_public_grant,
            has_user_grants,
        }
    }

    pub fn classify(self, query_id: i64) -> Result<ScopeState, ScopeConsistencyError> {
        match (self.has_public_grant, self.has_user_grants) {
            (false, false) => Ok(ScopeState::Private),
            (true, false) => Ok(ScopeState::Public),
            (false, true) => Ok(ScopeState::Shared),
            (true, true) => {
                tracing::error!(
                    "Sharing invariant violated: saved query {} is both public and shared to users",
                    query_id
                );
                Err(ScopeConsistencyError { query_id })
            }
        }
    }
}
