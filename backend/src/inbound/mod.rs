//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! HTTP handlers live under [`http`]; the identity gates and envelope they
//! rely on live in [`crate::middleware`].

pub mod http;
