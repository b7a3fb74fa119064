//! HTTP inbound adapter exposing the foundation REST endpoints.

pub mod api_keys;
pub mod auth;
pub mod bind;
pub mod error;
pub mod health;
pub mod routes;
pub mod spaces;
pub mod sse;
pub mod state;
pub mod users;

pub use error::ApiResult;
