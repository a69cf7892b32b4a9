use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Saved Query Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: i64,
    /// Owner of the saved query.
    pub user_id: String,
    pub name: String,
    pub query: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateSavedQuery {
    pub name: String,
    pub query: String,
    pub description: String,
}
