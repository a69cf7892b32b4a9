use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Saved Query Permission Models
// ============================================================================

/// One sharing edge of a saved query: either the single public grant
/// (`public = true`, no grantee) or a grant to one user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SavedQueryPermission {
    pub id: String,
    pub query_id: i64,
    pub shared_to_user_id: Option<String>,
    pub public: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
