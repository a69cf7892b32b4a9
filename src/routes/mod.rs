pub mod auth;
pub mod health;
pub mod saved_queries;
