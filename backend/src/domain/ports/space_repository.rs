//! Port abstraction for spaces and their membership.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{COMMON_DB_ERROR, Space, SpaceId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised when persisting or loading spaces.
    pub enum SpaceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "space repository connection failed: {message}"; COMMON_DB_ERROR,
        /// Query or mutation failed during execution.
        Query { message: String } => "space repository query failed: {message}"; COMMON_DB_ERROR,
    }
}

/// Port for reading spaces and membership.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpaceRepository: Send + Sync {
    /// Fetch a space by id.
    async fn find_by_id(&self, id: SpaceId) -> Result<Option<Space>, SpaceRepositoryError>;

    /// Spaces `user` belongs to, oldest first.
    async fn list_by_member(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Space>, SpaceRepositoryError>;

    /// Whether `user` owns `space`. Admin and member roles do not count.
    async fn is_owner(&self, space: SpaceId, user: UserId) -> Result<bool, SpaceRepositoryError>;

    /// Insert a team space and its owner membership atomically.
    async fn create_team_space(&self, space: &Space) -> Result<(), SpaceRepositoryError>;
}
