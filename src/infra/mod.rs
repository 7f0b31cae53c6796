//! Infrastructure adapters and runtime bootstrap.

pub mod assets;
pub mod error;
pub mod http;
pub mod images;
pub mod relay;
pub mod store;
pub mod telemetry;
