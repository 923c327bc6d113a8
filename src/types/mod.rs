//! Types
//!
//! Data structures exchanged with `mod_http_oauth2` and `mod_rest`.

pub mod auth;
pub mod callback;
pub mod config;
pub mod metadata;
pub mod registration;
pub mod token;
pub mod userinfo;

pub use auth::*;
pub use callback::*;
pub use config::*;
pub use metadata::*;
pub use registration::*;
pub use token::*;
pub use userinfo::*;
