use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    pub display_name: String,

    // Role resolved by the identity provider; administrators get the elevated sharing rules
    pub is_admin: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
