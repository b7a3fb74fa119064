//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin translators between Diesel rows and domain types.
//! Row structs and the schema stay private to this module; every database
//! failure is mapped onto the owning port's error enum.
//!
//! ```ignore
//! use foundation::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/foundation")).await?;
//! let users = DieselUserRepository::new(pool.clone());
//! ```

mod diesel_api_key_repository;
mod diesel_error_mapping;
mod diesel_space_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_api_key_repository::DieselApiKeyRepository;
pub use diesel_space_repository::DieselSpaceRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
