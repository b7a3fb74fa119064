//! Foundation tier: request pipeline, sessions, personal access tokens and
//! workspace permissions.
//!
//! The crate follows a hexagonal layout. [`domain`] holds types, services
//! and ports; [`inbound`] and [`middleware`] adapt HTTP onto the ports;
//! [`rpc`] binds services behind the interceptor chain; [`outbound`] holds
//! the storage, translation and id adapters; [`server`] composes them.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod rpc;
pub mod server;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
