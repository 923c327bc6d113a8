//! Core Components
//!
//! HTTP transport, metadata discovery, state handling and PKCE.

pub mod discovery;
pub mod pkce;
pub mod state;
pub mod transport;

pub use discovery::*;
pub use pkce::*;
pub use state::*;
pub use transport::*;
