//! Port abstraction for persisting user accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    COMMON_DB_ERROR, NewUser, ProfileUpdate, Space, USER_EMAIL_EXIST, USER_UNIQUE_NAME_EXIST, User,
    UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised when persisting or loading users.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}"; COMMON_DB_ERROR,
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}"; COMMON_DB_ERROR,
        /// Another live account already uses the email.
        DuplicateEmail => "email already registered"; USER_EMAIL_EXIST,
        /// Another live account already uses the unique name.
        DuplicateUniqueName => "unique name already taken"; USER_UNIQUE_NAME_EXIST,
    }
}

/// Port for reading and writing user accounts.
///
/// Lookups ignore soft-deleted accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user, its personal space and the owner membership in one
    /// transaction. Nothing is written when any step fails.
    async fn create_with_personal_space(
        &self,
        user: &NewUser,
        space: &Space,
    ) -> Result<User, UserRepositoryError>;

    /// Fetch a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by email, compared case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch every user in `ids`; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserRepositoryError>;

    /// Whether a live account other than `except` holds `unique_name`.
    async fn unique_name_taken(
        &self,
        unique_name: &str,
        except: Option<UserId>,
    ) -> Result<bool, UserRepositoryError>;

    /// Apply a profile update and return the stored user.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Replace the cached session key; `None` clears it.
    async fn update_session_key(
        &self,
        id: UserId,
        session_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError>;

    /// Replace the password record.
    async fn update_password(
        &self,
        id: UserId,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError>;
}
