//! Database models, one file per table.
//! Re-exported so callers can use `crate::db::models::*` or `crate::db::*`.

pub mod saved_query;
pub mod saved_query_permission;
pub mod user;

pub use self::saved_query::*;
pub use self::saved_query_permission::*;
pub use self::user::*;
