//! Domain layer types and invariants.

pub mod comments;
pub mod error;
pub mod newsletter;
pub mod posts;
pub mod viewer;
