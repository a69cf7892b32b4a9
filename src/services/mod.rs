pub mod init;
pub mod saved_queries;
pub mod sharing;
