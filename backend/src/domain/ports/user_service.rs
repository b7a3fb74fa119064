//! Driving port for account use-cases.
//!
//! Inbound adapters call this port to register, sign in and manage profiles
//! without knowing the backing infrastructure.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::json_numbers::{i64_string, vec_i64_string};
use crate::domain::validate::{ValidationError, require_max_chars, require_non_blank};
use super::EmptyResponse;
use crate::domain::{
    Error, NICK_NAME_MAX, ProfileUpdate, RequestContext, UserId, UserInfo, Validate,
    validate_email, validate_password, validate_profile, validate_unique_name,
};

/// Most ids accepted by one batch lookup.
pub const MGET_USERS_MAX: usize = 100;

/// Account creation request.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Optional unique name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("nick_name", &self.nick_name)
            .finish()
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
            validate_unique_name(name)?;
        }
        if let Some(nick) = &self.nick_name {
            require_max_chars("nick_name", nick, NICK_NAME_MAX)?;
        }
        Ok(())
    }
}

/// Password sign-in request.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginByPasswordRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginByPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginByPasswordRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Validate for LoginByPasswordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("email", &self.email)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

/// Issued session returned by registration and sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSessionResponse {
    pub user_info: UserInfo,
    pub token: String,
    /// Session lifetime in nanoseconds.
    #[serde(with = "i64_string")]
    pub expire_time: i64,
}

/// Sign-out request for the calling user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutRequest {}

impl Validate for LogoutRequest {}

/// Password change request proven by the current password.
#[derive(Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub old_password: String,
    pub password: String,
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("email", &self.email)?;
        validate_password(&self.old_password)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

/// Single profile lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserInfoRequest {
    pub user_id: UserId,
}

impl Validate for GetUserInfoRequest {}

/// Single profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoResponse {
    pub user_info: UserInfo,
}

/// Batch profile lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MGetUserInfoRequest {
    #[serde(with = "vec_i64_string")]
    pub user_ids: Vec<i64>,
}

impl Validate for MGetUserInfoRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.user_ids.is_empty() {
            return Err(ValidationError::new("user_ids must not be empty"));
        }
        if self.user_ids.len() > MGET_USERS_MAX {
            return Err(ValidationError::new(format!(
                "user_ids accepts at most {MGET_USERS_MAX} ids"
            )));
        }
        Ok(())
    }
}

/// Batch of profiles in request order; unknown ids are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MGetUserInfoResponse {
    pub user_infos: Vec<UserInfo>,
}

/// Profile change for the calling user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifyUserProfileRequest {
    /// New unique name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_uri: Option<String>,
}

impl ModifyUserProfileRequest {
    /// Domain form of the change.
    #[must_use]
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            unique_name: self.name.clone(),
            nick_name: self.nick_name.clone(),
            description: self.description.clone(),
            avatar_uri: self.avatar_uri.clone(),
        }
    }
}

impl Validate for ModifyUserProfileRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let update = self.to_update();
        if update.is_empty() {
            return Err(ValidationError::new("at least one profile field is required"));
        }
        validate_profile(&update)?;
        Ok(())
    }
}

/// Domain use-case port for accounts.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create an account with its personal space and sign it in.
    async fn register(
        &self,
        ctx: &RequestContext,
        req: &RegisterRequest,
    ) -> Result<UserSessionResponse, Error>;

    /// Sign in with email and password.
    async fn login_by_password(
        &self,
        ctx: &RequestContext,
        req: &LoginByPasswordRequest,
    ) -> Result<UserSessionResponse, Error>;

    /// Clear the caller's cached session key.
    async fn logout(&self, ctx: &RequestContext, req: &LogoutRequest)
    -> Result<EmptyResponse, Error>;

    /// Replace a password after checking the current one.
    async fn reset_password(
        &self,
        ctx: &RequestContext,
        req: &ResetPasswordRequest,
    ) -> Result<EmptyResponse, Error>;

    /// Load one profile.
    async fn get_user_info(
        &self,
        ctx: &RequestContext,
        req: &GetUserInfoRequest,
    ) -> Result<UserInfoResponse, Error>;

    /// Load several profiles.
    async fn mget_user_info(
        &self,
        ctx: &RequestContext,
        req: &MGetUserInfoRequest,
    ) -> Result<MGetUserInfoResponse, Error>;

    /// Update the caller's profile.
    async fn modify_user_profile(
        &self,
        ctx: &RequestContext,
        req: &ModifyUserProfileRequest,
    ) -> Result<UserInfoResponse, Error>;
}
