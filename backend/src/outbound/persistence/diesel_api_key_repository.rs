//! PostgreSQL-backed `ApiKeyRepository` implementation using Diesel ORM.
//!
//! Soft-deleted keys keep their row with `status = 'deleted'` and a non-zero
//! `deleted_at`; reads only consider normal keys.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{ApiKeyRepository, ApiKeyRepositoryError};
use crate::domain::{ApiKey, ApiKeyId, ApiKeyStatus, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::ApiKeyRow;
use super::pool::{DbPool, PoolError};
use super::schema::api_keys;

/// Diesel-backed implementation of the `ApiKeyRepository` port.
#[derive(Clone)]
pub struct DieselApiKeyRepository {
    pool: DbPool,
}

impl DieselApiKeyRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ApiKeyRepositoryError {
    ApiKeyRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> ApiKeyRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => ApiKeyRepositoryError::connection(message),
        DieselFailure::Query(message) => ApiKeyRepositoryError::query(message),
        DieselFailure::UniqueViolation { .. } => ApiKeyRepositoryError::query("api key already exists"),
    }
}

const LIVE: &str = ApiKeyStatus::Normal.as_str();

#[async_trait]
impl ApiKeyRepository for DieselApiKeyRepository {
    async fn insert(&self, key: &ApiKey) -> Result<(), ApiKeyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(api_keys::table)
            .values(ApiKeyRow::from(key))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: ApiKeyId) -> Result<Option<ApiKey>, ApiKeyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ApiKeyRow> = api_keys::table
            .filter(api_keys::id.eq(id.get()))
            .filter(api_keys::status.eq(LIVE))
            .select(ApiKeyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(ApiKey::from))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ApiKey>, ApiKeyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ApiKeyRow> = api_keys::table
            .filter(api_keys::key.eq(key))
            .filter(api_keys::status.eq(LIVE))
            .select(ApiKeyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(ApiKey::from))
    }

    async fn list_by_user(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<ApiKey>, ApiKeyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = api_keys::table
            .filter(api_keys::user_id.eq(user.get()))
            .filter(api_keys::status.eq(LIVE))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<ApiKeyRow> = api_keys::table
            .filter(api_keys::user_id.eq(user.get()))
            .filter(api_keys::status.eq(LIVE))
            .order((api_keys::created_at.desc(), api_keys::id.desc()))
            .offset(page.offset())
            .limit(page.limit())
            .select(ApiKeyRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Page::new(
            rows.into_iter().map(ApiKey::from).collect(),
            total,
            page,
        ))
    }

    async fn rename(&self, id: ApiKeyId, name: &str, now: i64) -> Result<(), ApiKeyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(api_keys::table)
            .filter(api_keys::id.eq(id.get()))
            .filter(api_keys::status.eq(LIVE))
            .set((api_keys::name.eq(name), api_keys::updated_at.eq(now)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn soft_delete(&self, id: ApiKeyId, now: i64) -> Result<(), ApiKeyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(api_keys::table)
            .filter(api_keys::id.eq(id.get()))
            .filter(api_keys::status.eq(LIVE))
            .set((
                api_keys::status.eq(ApiKeyStatus::Deleted.as_str()),
                api_keys::deleted_at.eq(now),
                api_keys::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn touch_last_used(&self, id: ApiKeyId, now_ms: i64) -> Result<(), ApiKeyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(api_keys::table)
            .filter(api_keys::id.eq(id.get()))
            .filter(
                api_keys::last_used_at
                    .is_null()
                    .or(api_keys::last_used_at.lt(now_ms)),
            )
            .set(api_keys::last_used_at.eq(Some(now_ms)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
