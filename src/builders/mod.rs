//! Builders
//!
//! Fluent builder for session configuration.

pub mod session;

pub use session::{session_config, SessionConfigBuilder, DEFAULT_CLIENT_NAME, DEFAULT_CLIENT_URI};
