pub mod blog;
pub mod comments;
pub mod error;
pub mod newsletter;
pub mod render;
pub mod repos;
pub mod session;
