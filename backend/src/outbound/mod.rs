//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: a single-process store implementing the same repository ports
//! - **i18n**: the built-in error message catalogues
//! - **id_generator**: clock-seeded 64-bit identifiers
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod i18n;
pub mod id_generator;
pub mod memory;
pub mod persistence;
