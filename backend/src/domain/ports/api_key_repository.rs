//! Port abstraction for personal access token storage.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{ApiKey, ApiKeyId, COMMON_DB_ERROR, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised when persisting or loading API keys.
    pub enum ApiKeyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "api key repository connection failed: {message}"; COMMON_DB_ERROR,
        /// Query or mutation failed during execution.
        Query { message: String } => "api key repository query failed: {message}"; COMMON_DB_ERROR,
    }
}

/// Port for API key persistence.
///
/// Reads only return keys whose status is normal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Insert a new key.
    async fn insert(&self, key: &ApiKey) -> Result<(), ApiKeyRepositoryError>;

    /// Fetch a live key by id.
    async fn find_by_id(&self, id: ApiKeyId) -> Result<Option<ApiKey>, ApiKeyRepositoryError>;

    /// Fetch a live key by its key material.
    async fn find_by_key(&self, key: &str) -> Result<Option<ApiKey>, ApiKeyRepositoryError>;

    /// Live keys owned by `user`, newest first.
    async fn list_by_user(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<ApiKey>, ApiKeyRepositoryError>;

    /// Rename a key.
    async fn rename(&self, id: ApiKeyId, name: &str, now: i64) -> Result<(), ApiKeyRepositoryError>;

    /// Mark a key deleted at `now`.
    async fn soft_delete(&self, id: ApiKeyId, now: i64) -> Result<(), ApiKeyRepositoryError>;

    /// Record a successful verification at `now_ms`, in unix milliseconds.
    /// Earlier timestamps never overwrite later ones.
    async fn touch_last_used(&self, id: ApiKeyId, now_ms: i64) -> Result<(), ApiKeyRepositoryError>;
}
