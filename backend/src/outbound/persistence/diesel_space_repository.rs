//! PostgreSQL-backed `SpaceRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::{Page, PageRequest};

use crate::domain::ports::{SpaceRepository, SpaceRepositoryError};
use crate::domain::{Space, SpaceId, SpaceRole, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{NewSpaceRow, NewSpaceUserRow, SpaceRow};
use super::pool::{DbPool, PoolError};
use super::schema::{space_users, spaces};

/// Diesel-backed implementation of the `SpaceRepository` port.
#[derive(Clone)]
pub struct DieselSpaceRepository {
    pool: DbPool,
}

impl DieselSpaceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SpaceRepositoryError {
    SpaceRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> SpaceRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => SpaceRepositoryError::connection(message),
        DieselFailure::Query(message) => SpaceRepositoryError::query(message),
        DieselFailure::UniqueViolation { .. } => SpaceRepositoryError::query("space already exists"),
    }
}

#[async_trait]
impl SpaceRepository for DieselSpaceRepository {
    async fn find_by_id(&self, id: SpaceId) -> Result<Option<Space>, SpaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SpaceRow> = spaces::table
            .filter(spaces::id.eq(id.get()))
            .select(SpaceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Space::from))
    }

    async fn list_by_member(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Space>, SpaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = space_users::table
            .filter(space_users::user_id.eq(user.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<SpaceRow> = spaces::table
            .inner_join(space_users::table)
            .filter(space_users::user_id.eq(user.get()))
            .order((spaces::created_at.asc(), spaces::id.asc()))
            .offset(page.offset())
            .limit(page.limit())
            .select(SpaceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Page::new(
            rows.into_iter().map(Space::from).collect(),
            total,
            page,
        ))
    }

    async fn is_owner(&self, space: SpaceId, user: UserId) -> Result<bool, SpaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            space_users::table
                .filter(space_users::space_id.eq(space.get()))
                .filter(space_users::user_id.eq(user.get()))
                .filter(space_users::role.eq(SpaceRole::Owner.as_str())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn create_team_space(&self, space: &Space) -> Result<(), SpaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let space_row = NewSpaceRow::from_domain(space);
        let member_row = NewSpaceUserRow::owner_of(space);
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(spaces::table)
                    .values(&space_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(space_users::table)
                    .values(&member_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn duplicate_spaces_surface_as_query_errors() {
        assert_eq!(
            map_diesel_error(diesel::result::Error::NotFound),
            SpaceRepositoryError::query("record not found")
        );
        assert!(matches!(
            map_pool_error(PoolError::checkout("timeout")),
            SpaceRepositoryError::Connection { .. }
        ));
    }
}
