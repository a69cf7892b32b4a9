pub mod saved_queries;
pub mod saved_query_permissions;
pub mod user;

pub use saved_queries::{SavedQueryRepository, VisibilityFilter};
pub use saved_query_permissions::SavedQueryPermissionRepository;
pub use user::UserRepository;
