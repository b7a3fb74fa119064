//! Account domain service.
//!
//! Implements [`UserService`]: registration with an atomic personal space,
//! password sign-in, session issue and profile management. Password hashing
//! runs on the blocking pool because Argon2id is deliberately expensive.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{
    EmptyResponse, GetUserInfoRequest, IdGenerator, LoginByPasswordRequest, LogoutRequest,
    MGetUserInfoRequest, MGetUserInfoResponse, ModifyUserProfileRequest, RegisterRequest,
    ResetPasswordRequest, UserInfoResponse, UserRepository, UserRepositoryError, UserService,
    UserSessionResponse,
};
use crate::domain::{
    COMMON_INTERNAL_ERROR, CacheKey, Error, NewUser, PasswordHasher, RequestContext, SessionCodec,
    Space, SpaceId, USER_EMAIL_EXIST, USER_PASSWORD_WRONG, USER_REGISTRATION_BLOCKED,
    USER_UNIQUE_NAME_EXIST, User, UserId, UserInfo, default_nick_name, session_expires_nanos,
};

/// Profile of the authenticated caller, cached by the first lookup in a request.
pub const CALLER_INFO: CacheKey<UserInfo> = CacheKey::new("foundation.caller_info");

/// Account service implementing the [`UserService`] driving port.
#[derive(Clone)]
pub struct UserAccountService<U> {
    users: Arc<U>,
    ids: Arc<dyn IdGenerator>,
    sessions: Arc<SessionCodec>,
    clock: Arc<dyn Clock>,
    hasher: PasswordHasher,
    registration_enabled: bool,
}

impl<U> UserAccountService<U> {
    /// Create a service with default Argon2id parameters and open registration.
    pub fn new(
        users: Arc<U>,
        ids: Arc<dyn IdGenerator>,
        sessions: Arc<SessionCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            ids,
            sessions,
            clock,
            hasher: PasswordHasher::default(),
            registration_enabled: true,
        }
    }

    /// Replace the password hasher.
    #[must_use]
    pub fn with_password_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Open or close self-service registration.
    #[must_use]
    pub fn with_registration_enabled(mut self, enabled: bool) -> Self {
        self.registration_enabled = enabled;
        self
    }
}

fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::DuplicateEmail => Error::by_code(USER_EMAIL_EXIST),
        UserRepositoryError::DuplicateUniqueName => Error::by_code(USER_UNIQUE_NAME_EXIST),
        other => Error::from(other),
    }
}

fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::wrap_by_code(err, COMMON_INTERNAL_ERROR)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl<U> UserAccountService<U>
where
    U: UserRepository,
{
    async fn hash_password(&self, password: &str) -> Result<String, Error> {
        let hasher = self.hasher;
        let password = Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(internal)?
            .map_err(internal)
    }

    async fn password_matches(&self, password: &str, record: &str) -> Result<bool, Error> {
        let password = Zeroizing::new(password.to_owned());
        let record = record.to_owned();
        tokio::task::spawn_blocking(move || PasswordHasher::verify(&password, &record))
            .await
            .map_err(internal)?
            .map_err(internal)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, Error> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::by_code(USER_PASSWORD_WRONG))?;
        if self.password_matches(password, &user.hashed_password).await? {
            Ok(user)
        } else {
            Err(Error::by_code(USER_PASSWORD_WRONG))
        }
    }

    async fn start_session(&self, user: &User) -> Result<UserSessionResponse, Error> {
        let issued = self
            .sessions
            .generate_session_key(&user.id.to_string(), self.ids.next_id())
            .map_err(internal)?;
        self.users
            .update_session_key(user.id, Some(issued.token.clone()), self.clock.utc())
            .await
            .map_err(map_user_repository_error)?;
        Ok(UserSessionResponse {
            user_info: user.info(),
            token: issued.token,
            expire_time: session_expires_nanos(),
        })
    }

    async fn load_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found(format!("user {id}")))
    }

    async fn ensure_unique_name_free(
        &self,
        unique_name: &str,
        except: Option<UserId>,
    ) -> Result<(), Error> {
        let taken = self
            .users
            .unique_name_taken(unique_name, except)
            .await
            .map_err(map_user_repository_error)?;
        if taken {
            Err(Error::by_code(USER_UNIQUE_NAME_EXIST))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<U> UserService for UserAccountService<U>
where
    U: UserRepository + 'static,
{
    async fn register(
        &self,
        _ctx: &RequestContext,
        req: &RegisterRequest,
    ) -> Result<UserSessionResponse, Error> {
        if !self.registration_enabled {
            return Err(Error::by_code(USER_REGISTRATION_BLOCKED));
        }
        let email = normalize_email(&req.email);
        let existing = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_repository_error)?;
        if existing.is_some() {
            return Err(Error::by_code(USER_EMAIL_EXIST));
        }
        let unique_name = req.name.clone().filter(|name| !name.is_empty());
        if let Some(name) = &unique_name {
            self.ensure_unique_name_free(name, None).await?;
        }

        let hashed_password = self.hash_password(&req.password).await?;
        let now = self.clock.utc();
        let user_id = UserId::new(self.ids.next_id());
        let new_user = NewUser {
            id: user_id,
            unique_name,
            nick_name: req
                .nick_name
                .clone()
                .filter(|nick| !nick.trim().is_empty())
                .unwrap_or_else(|| default_nick_name(&email)),
            email,
            hashed_password,
            created_at: now,
        };
        let space = Space::personal(SpaceId::new(self.ids.next_id()), user_id, now);
        let user = self
            .users
            .create_with_personal_space(&new_user, &space)
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %user.id, space_id = %space.id, "registered user");
        self.start_session(&user).await
    }

    async fn login_by_password(
        &self,
        _ctx: &RequestContext,
        req: &LoginByPasswordRequest,
    ) -> Result<UserSessionResponse, Error> {
        let user = self.authenticate(&req.email, &req.password).await?;
        debug!(user_id = %user.id, "password sign-in");
        self.start_session(&user).await
    }

    async fn logout(
        &self,
        ctx: &RequestContext,
        _req: &LogoutRequest,
    ) -> Result<EmptyResponse, Error> {
        let user_id = ctx.require_user_id()?;
        self.users
            .update_session_key(user_id, None, self.clock.utc())
            .await
            .map_err(map_user_repository_error)?;
        Ok(EmptyResponse {})
    }

    async fn reset_password(
        &self,
        _ctx: &RequestContext,
        req: &ResetPasswordRequest,
    ) -> Result<EmptyResponse, Error> {
        let user = self.authenticate(&req.email, &req.old_password).await?;
        let hashed_password = self.hash_password(&req.password).await?;
        let now = self.clock.utc();
        self.users
            .update_password(user.id, &hashed_password, now)
            .await
            .map_err(map_user_repository_error)?;
        self.users
            .update_session_key(user.id, None, now)
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %user.id, "password reset");
        Ok(EmptyResponse {})
    }

    async fn get_user_info(
        &self,
        ctx: &RequestContext,
        req: &GetUserInfoRequest,
    ) -> Result<UserInfoResponse, Error> {
        if let Some(cached) = ctx
            .cache_get(&CALLER_INFO)
            .filter(|info| info.user_id == req.user_id)
        {
            return Ok(UserInfoResponse {
                user_info: UserInfo::clone(&cached),
            });
        }
        let user_info = self.load_user(req.user_id).await?.info();
        if ctx.user().is_some_and(|caller| caller.id == req.user_id) {
            ctx.cache_store(&CALLER_INFO, user_info.clone());
        }
        Ok(UserInfoResponse { user_info })
    }

    async fn mget_user_info(
        &self,
        _ctx: &RequestContext,
        req: &MGetUserInfoRequest,
    ) -> Result<MGetUserInfoResponse, Error> {
        let ids: Vec<UserId> = req.user_ids.iter().copied().map(UserId::new).collect();
        let mut found: HashMap<UserId, User> = self
            .users
            .find_by_ids(&ids)
            .await
            .map_err(map_user_repository_error)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();
        let user_infos = ids
            .iter()
            .filter_map(|id| found.remove(id))
            .map(|user| user.info())
            .collect();
        Ok(MGetUserInfoResponse { user_infos })
    }

    async fn modify_user_profile(
        &self,
        ctx: &RequestContext,
        req: &ModifyUserProfileRequest,
    ) -> Result<UserInfoResponse, Error> {
        let user_id = ctx.require_user_id()?;
        let update = req.to_update();
        if let Some(name) = update.unique_name.as_deref().filter(|name| !name.is_empty()) {
            self.ensure_unique_name_free(name, Some(user_id)).await?;
        }
        let user = self
            .users
            .update_profile(user_id, &update, self.clock.utc())
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id}")))?;
        let user_info = user.info();
        ctx.cache_store(&CALLER_INFO, user_info.clone());
        Ok(UserInfoResponse { user_info })
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
