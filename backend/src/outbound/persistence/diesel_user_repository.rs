//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Registration writes the user, its personal space and the owner membership
//! in one transaction. Uniqueness of live emails and unique names is enforced
//! by partial unique indexes whose names identify the conflicting field.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{NewUser, ProfileUpdate, Space, User, UserId, UserStatus};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{NewSpaceRow, NewSpaceUserRow, NewUserRow, ProfileChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{space_users, spaces, users};

/// Partial unique index over live emails.
pub(crate) const EMAIL_INDEX: &str = "users_email_active_idx";
/// Partial unique index over live unique names.
pub(crate) const UNIQUE_NAME_INDEX: &str = "users_unique_name_active_idx";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { constraint } => match constraint.as_deref() {
            Some(EMAIL_INDEX) => UserRepositoryError::duplicate_email(),
            Some(UNIQUE_NAME_INDEX) => UserRepositoryError::duplicate_unique_name(),
            _ => UserRepositoryError::query("unique constraint violated"),
        },
        DieselFailure::Connection(message) => UserRepositoryError::connection(message),
        DieselFailure::Query(message) => UserRepositoryError::query(message),
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_with_personal_space(
        &self,
        user: &NewUser,
        space: &Space,
    ) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_row = NewUserRow::from_domain(user);
        let space_row = NewSpaceRow::from_domain(space);
        let member_row = NewSpaceUserRow::owner_of(space);

        let row = conn
            .transaction(|conn| {
                async move {
                    let row: UserRow = diesel::insert_into(users::table)
                        .values(&user_row)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;
                    diesel::insert_into(spaces::table)
                        .values(&space_row)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(space_users::table)
                        .values(&member_row)
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.get()))
            .filter(users::status.eq(UserStatus::Active.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.to_lowercase()))
            .filter(users::status.eq(UserStatus::Active.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(User::from))
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(raw))
            .filter(users::status.eq(UserStatus::Active.as_str()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn unique_name_taken(
        &self,
        unique_name: &str,
        except: Option<UserId>,
    ) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let except = except.map_or(0, UserId::get);
        let holder: Option<i64> = users::table
            .filter(users::unique_name.eq(unique_name))
            .filter(users::status.eq(UserStatus::Active.as_str()))
            .filter(users::id.ne(except))
            .select(users::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(holder.is_some())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = ProfileChangeset {
            unique_name: update.unique_name.as_deref(),
            nick_name: update.nick_name.as_deref(),
            description: update.description.as_deref(),
            avatar_uri: update.avatar_uri.as_deref(),
            updated_at: now,
        };
        let row: Option<UserRow> = diesel::update(users::table)
            .filter(users::id.eq(id.get()))
            .filter(users::status.eq(UserStatus::Active.as_str()))
            .set(&changes)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(User::from))
    }

    async fn update_session_key(
        &self,
        id: UserId,
        session_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table)
            .filter(users::id.eq(id.get()))
            .set((users::session_key.eq(session_key), users::updated_at.eq(now)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_password(
        &self,
        id: UserId,
        hashed_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table)
            .filter(users::id.eq(id.get()))
            .set((
                users::hashed_password.eq(hashed_password),
                users::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping coverage; queries run against PostgreSQL elsewhere.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PoolError::checkout("timeout"))]
    #[case(PoolError::build("bad url"))]
    fn pool_failures_are_connection_errors(#[case] error: PoolError) {
        assert!(matches!(
            map_pool_error(error),
            UserRepositoryError::Connection { .. }
        ));
    }

    #[rstest]
    fn missing_rows_are_query_errors() {
        assert_eq!(
            map_diesel_error(diesel::result::Error::NotFound),
            UserRepositoryError::query("record not found")
        );
    }
}
