//! Personal access token service.
//!
//! Tokens are addressed by a generated id and authenticated by key material
//! derived from that id with [`derive_key`]. Only the owner may read, rename
//! or revoke a token.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::PageRequest;
use tracing::{info, warn};

use crate::domain::ports::{
    ApiKeyByIdRequest, ApiKeyRepository, ApiKeyService,
    CreateApiKeyRequest, CreateApiKeyResponse, EmptyResponse, GetApiKeyResponse, IdGenerator,
    ListApiKeysRequest, ListApiKeysResponse, UpdateApiKeyRequest, VerifyTokenRequest,
    VerifyTokenResponse,
};
use crate::domain::{
    ApiKey, ApiKeyId, ApiKeyLifetime, ApiKeyStatus, Error, RequestContext,
    UserId, derive_key,
};

/// Token service implementing the [`ApiKeyService`] driving port.
#[derive(Clone)]
pub struct PersonalAccessTokenService<K> {
    keys: Arc<K>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<K> PersonalAccessTokenService<K> {
    /// Create a new service.
    pub fn new(keys: Arc<K>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { keys, ids, clock }
    }

    fn now(&self) -> i64 {
        self.clock.utc().timestamp()
    }
}

impl<K> PersonalAccessTokenService<K>
where
    K: ApiKeyRepository,
{
    /// Load a live key and check the caller owns it.
    async fn load_owned(&self, id: ApiKeyId, caller: UserId) -> Result<ApiKey, Error> {
        let key = self
            .keys
            .find_by_id(id)
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::not_found(format!("api key {id}")))?;
        if key.user_id == caller {
            Ok(key)
        } else {
            Err(Error::no_permission(""))
        }
    }
}

#[async_trait]
impl<K> ApiKeyService for PersonalAccessTokenService<K>
where
    K: ApiKeyRepository + 'static,
{
    async fn create_api_key(
        &self,
        ctx: &RequestContext,
        req: &CreateApiKeyRequest,
    ) -> Result<CreateApiKeyResponse, Error> {
        let user_id = ctx.require_user_id()?;
        let now = self.now();
        let expire_at = ApiKeyLifetime::from_request(req.duration_day.as_deref(), req.expire_at)
            .and_then(|lifetime| lifetime.expire_at(now))
            .map_err(|err| Error::invalid_param(err.to_string()))?;
        let id = ApiKeyId::new(self.ids.next_id());
        let key = ApiKey {
            id,
            key: derive_key(id),
            name: req.name.trim().to_owned(),
            status: ApiKeyStatus::Normal,
            user_id,
            expire_at,
            created_at: now,
            updated_at: now,
            last_used_at: None,
            deleted_at: None,
        };
        self.keys
            .insert(&key)
            .await
            .map_err(Error::from)?;
        info!(api_key_id = %id, user_id = %user_id, expire_at, "issued api key");
        Ok(CreateApiKeyResponse {
            api_key: key.info(),
            token: key.key,
        })
    }

    async fn list_api_keys(
        &self,
        ctx: &RequestContext,
        req: &ListApiKeysRequest,
    ) -> Result<ListApiKeysResponse, Error> {
        let user_id = ctx.require_user_id()?;
        let page = PageRequest::from_parts(req.page_number, req.page_size)
            .map_err(|err| Error::invalid_param(err.to_string()))?;
        let page = self
            .keys
            .list_by_user(user_id, page)
            .await
            .map_err(Error::from)?;
        Ok(ListApiKeysResponse {
            total: page.total,
            api_keys: page.items.iter().map(ApiKey::info).collect(),
        })
    }

    async fn get_api_key(
        &self,
        ctx: &RequestContext,
        req: &ApiKeyByIdRequest,
    ) -> Result<GetApiKeyResponse, Error> {
        let key = self
            .load_owned(req.api_key_id, ctx.require_user_id()?)
            .await?;
        Ok(GetApiKeyResponse {
            api_key: key.info(),
        })
    }

    async fn update_api_key(
        &self,
        ctx: &RequestContext,
        req: &UpdateApiKeyRequest,
    ) -> Result<EmptyResponse, Error> {
        let key = self
            .load_owned(req.api_key_id, ctx.require_user_id()?)
            .await?;
        self.keys
            .rename(key.id, req.name.trim(), self.now())
            .await
            .map_err(Error::from)?;
        Ok(EmptyResponse {})
    }

    async fn delete_api_key(
        &self,
        ctx: &RequestContext,
        req: &ApiKeyByIdRequest,
    ) -> Result<EmptyResponse, Error> {
        let key = self
            .load_owned(req.api_key_id, ctx.require_user_id()?)
            .await?;
        self.keys
            .soft_delete(key.id, self.now())
            .await
            .map_err(Error::from)?;
        info!(api_key_id = %key.id, "revoked api key");
        Ok(EmptyResponse {})
    }

    async fn verify_token(
        &self,
        _ctx: &RequestContext,
        req: &VerifyTokenRequest,
    ) -> Result<VerifyTokenResponse, Error> {
        let Some(key) = self
            .keys
            .find_by_key(req.token.trim())
            .await
            .map_err(Error::from)?
        else {
            return Ok(VerifyTokenResponse::rejected(&Error::no_permission(
                "unknown api key",
            )));
        };
        let instant = self.clock.utc();
        if !key.is_usable_at(instant.timestamp()) {
            return Ok(VerifyTokenResponse::rejected(&Error::no_permission(
                "api key expired",
            )));
        }
        if let Err(err) = self
            .keys
            .touch_last_used(key.id, instant.timestamp_millis())
            .await
        {
            warn!(api_key_id = %key.id, error = %err, "failed to record api key use");
        }
        Ok(VerifyTokenResponse::accepted(key.user_id))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{ApiKeyRepositoryError, MockApiKeyRepository};
    use crate::domain::{
        AuthenticatedUser, COMMON_INVALID_PARAM, COMMON_NO_PERMISSION, COMMON_UNAUTHORIZED,
        LogId, PERMANENT_DAYS, SECONDS_PER_DAY,
    };
    use crate::test_support::{MutableClock, SequenceIds};
    use chrono::{TimeZone, Utc};
    use pagination::Page;
    use rstest::{fixture, rstest};

    const OWNER: i64 = 7;

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        Arc::new(MutableClock::new(start))
    }

    fn service(
        repo: MockApiKeyRepository,
        clock: &Arc<MutableClock>,
    ) -> PersonalAccessTokenService<MockApiKeyRepository> {
        PersonalAccessTokenService::new(
            Arc::new(repo),
            Arc::new(SequenceIds::starting_at(1)),
            clock.clone(),
        )
    }

    fn caller(id: i64) -> RequestContext {
        RequestContext::new(LogId::from("log")).with_user(AuthenticatedUser {
            id: UserId::new(id),
            name: String::new(),
            email: "a@x.io".to_owned(),
            app_id: None,
        })
    }

    fn stored(clock: &MutableClock, owner: i64, expire_in: i64) -> ApiKey {
        let now = clock.utc().timestamp();
        ApiKey {
            id: ApiKeyId::new(1),
            key: derive_key(ApiKeyId::new(1)),
            name: "ci".to_owned(),
            status: ApiKeyStatus::Normal,
            user_id: UserId::new(owner),
            expire_at: now + expire_in,
            created_at: now,
            updated_at: now,
            last_used_at: None,
            deleted_at: None,
        }
    }

    fn create_request(duration_day: Option<&str>, expire_at: Option<i64>) -> CreateApiKeyRequest {
        CreateApiKeyRequest {
            name: "ci".to_owned(),
            duration_day: duration_day.map(str::to_owned),
            expire_at,
        }
    }

    #[rstest]
    #[case::one_day(Some("1"), None, SECONDS_PER_DAY)]
    #[case::permanent(Some("permanent"), None, PERMANENT_DAYS * SECONDS_PER_DAY)]
    #[case::explicit_wins(Some("1"), Some(1_735_689_600 + 60), 60)]
    #[tokio::test]
    async fn create_derives_key_and_expiry(
        clock: Arc<MutableClock>,
        #[case] duration_day: Option<&'static str>,
        #[case] expire_at: Option<i64>,
        #[case] lifetime: i64,
    ) {
        let now = clock.utc().timestamp();
        let mut repo = MockApiKeyRepository::new();
        repo.expect_insert()
            .withf(move |key| {
                key.key == derive_key(key.id)
                    && key.expire_at == now + lifetime
                    && key.status == ApiKeyStatus::Normal
                    && key.last_used_at.is_none()
            })
            .times(1)
            .return_once(|_| Ok(()));

        let response = service(repo, &clock)
            .create_api_key(&caller(OWNER), &create_request(duration_day, expire_at))
            .await
            .expect("create succeeds");
        assert_eq!(response.token, derive_key(response.api_key.id));
        assert_eq!(response.api_key.user_id, UserId::new(OWNER));
    }

    #[rstest]
    #[tokio::test]
    async fn create_requires_lifetime(clock: Arc<MutableClock>) {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_insert().never();
        let error = service(repo, &clock)
            .create_api_key(&caller(OWNER), &create_request(None, None))
            .await
            .expect_err("missing lifetime");
        assert_eq!(error.code(), COMMON_INVALID_PARAM);
    }

    #[rstest]
    #[tokio::test]
    async fn create_requires_caller(clock: Arc<MutableClock>) {
        let error = service(MockApiKeyRepository::new(), &clock)
            .create_api_key(
                &RequestContext::new(LogId::from("log")),
                &create_request(Some("1"), None),
            )
            .await
            .expect_err("anonymous");
        assert_eq!(error.code(), COMMON_UNAUTHORIZED);
    }

    #[rstest]
    #[tokio::test]
    async fn verify_accepts_live_key_and_records_use(clock: Arc<MutableClock>) {
        let key = stored(&clock, OWNER, SECONDS_PER_DAY);
        let now_ms = clock.utc().timestamp_millis();
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_key().return_once(move |_| Ok(Some(key)));
        repo.expect_touch_last_used()
            .withf(move |id, at| *id == ApiKeyId::new(1) && *at == now_ms)
            .times(1)
            .return_once(|_, _| Ok(()));

        let response = service(repo, &clock)
            .verify_token(
                &RequestContext::new(LogId::from("log")),
                &VerifyTokenRequest {
                    token: derive_key(ApiKeyId::new(1)),
                },
            )
            .await
            .expect("verify runs");
        assert_eq!(response, VerifyTokenResponse::accepted(UserId::new(OWNER)));
    }

    #[rstest]
    #[tokio::test]
    async fn verify_rejects_key_past_expiry(clock: Arc<MutableClock>) {
        let key = stored(&clock, OWNER, SECONDS_PER_DAY);
        clock.advance_seconds(SECONDS_PER_DAY + 1);
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_key().return_once(move |_| Ok(Some(key)));
        repo.expect_touch_last_used().never();

        let response = service(repo, &clock)
            .verify_token(
                &RequestContext::new(LogId::from("log")),
                &VerifyTokenRequest {
                    token: derive_key(ApiKeyId::new(1)),
                },
            )
            .await
            .expect("verify runs");
        assert!(!response.valid);
        let base = response.base_resp.expect("rejection reason");
        assert_eq!(base.status_code, COMMON_NO_PERMISSION);
    }

    #[rstest]
    #[tokio::test]
    async fn verify_survives_touch_failure(clock: Arc<MutableClock>) {
        let key = stored(&clock, OWNER, SECONDS_PER_DAY);
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_key().return_once(move |_| Ok(Some(key)));
        repo.expect_touch_last_used()
            .return_once(|_, _| Err(ApiKeyRepositoryError::query("deadlock")));

        let response = service(repo, &clock)
            .verify_token(
                &RequestContext::new(LogId::from("log")),
                &VerifyTokenRequest {
                    token: derive_key(ApiKeyId::new(1)),
                },
            )
            .await
            .expect("verify runs");
        assert!(response.valid);
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_keys_cannot_be_renamed(clock: Arc<MutableClock>) {
        let key = stored(&clock, OWNER, SECONDS_PER_DAY);
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_id().return_once(move |_| Ok(Some(key)));
        repo.expect_rename().never();

        let error = service(repo, &clock)
            .update_api_key(
                &caller(OWNER + 1),
                &UpdateApiKeyRequest {
                    api_key_id: ApiKeyId::new(1),
                    name: "renamed".to_owned(),
                },
            )
            .await
            .expect_err("not the owner");
        assert_eq!(error.code(), COMMON_NO_PERMISSION);
    }

    #[rstest]
    #[tokio::test]
    async fn owner_revokes_key(clock: Arc<MutableClock>) {
        let key = stored(&clock, OWNER, SECONDS_PER_DAY);
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_id().return_once(move |_| Ok(Some(key)));
        repo.expect_soft_delete()
            .withf(|id, _| *id == ApiKeyId::new(1))
            .times(1)
            .return_once(|_, _| Ok(()));

        service(repo, &clock)
            .delete_api_key(
                &caller(OWNER),
                &ApiKeyByIdRequest {
                    api_key_id: ApiKeyId::new(1),
                },
            )
            .await
            .expect("revoke succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn list_uses_default_paging(clock: Arc<MutableClock>) {
        let key = stored(&clock, OWNER, SECONDS_PER_DAY);
        let mut repo = MockApiKeyRepository::new();
        repo.expect_list_by_user()
            .withf(|user, page| {
                *user == UserId::new(OWNER) && page.page_number() == 1 && page.page_size() == 10
            })
            .return_once(move |_, page| Ok(Page::new(vec![key], 1, page)));

        let response = service(repo, &clock)
            .list_api_keys(&caller(OWNER), &ListApiKeysRequest::default())
            .await
            .expect("list succeeds");
        assert_eq!(response.total, 1);
        assert_eq!(response.api_keys.len(), 1);
    }
}
