//! Driving port for personal access token use-cases.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::json_numbers::{i64_string, option_i64_string};
use crate::domain::validate::{ValidationError, require_max_chars, require_non_blank};
use super::EmptyResponse;
use crate::domain::{
    API_KEY_NAME_MAX, ApiKeyId, ApiKeyInfo, ApiKeyLifetime, BaseResp, Error, RequestContext,
    UserId, Validate,
};

/// Token creation request; one of `duration_day` and `expire_at` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    /// Whole days, or `"permanent"`.
    #[serde(default)]
    pub duration_day: Option<String>,
    /// Explicit unix expiry; wins over `duration_day`.
    #[serde(default, with = "option_i64_string")]
    pub expire_at: Option<i64>,
}

impl Validate for CreateApiKeyRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_max_chars("name", &self.name, API_KEY_NAME_MAX)?;
        ApiKeyLifetime::from_request(self.duration_day.as_deref(), self.expire_at)
            .map_err(|err| ValidationError::new(err.to_string()))?;
        Ok(())
    }
}

/// Created token. `token` is only ever returned here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateApiKeyResponse {
    pub api_key: ApiKeyInfo,
    pub token: String,
}

/// Page of the caller's tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListApiKeysRequest {
    #[serde(default, with = "option_i64_string")]
    pub page_number: Option<i64>,
    #[serde(default, with = "option_i64_string")]
    pub page_size: Option<i64>,
}

impl Validate for ListApiKeysRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        pagination::PageRequest::from_parts(self.page_number, self.page_size)
            .map(|_| ())
            .map_err(|err| ValidationError::new(err.to_string()))
    }
}

/// Listed tokens without key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListApiKeysResponse {
    pub api_keys: Vec<ApiKeyInfo>,
    #[serde(with = "i64_string")]
    pub total: i64,
}

/// Addresses one of the caller's tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyByIdRequest {
    pub api_key_id: ApiKeyId,
}

impl Validate for ApiKeyByIdRequest {}

/// One token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetApiKeyResponse {
    pub api_key: ApiKeyInfo,
}

/// Rename request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateApiKeyRequest {
    pub api_key_id: ApiKeyId,
    pub name: String,
}

impl Validate for UpdateApiKeyRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_max_chars("name", &self.name, API_KEY_NAME_MAX)
    }
}

/// Token presented by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

impl Validate for VerifyTokenRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("token", &self.token)
    }
}

/// Verification outcome. Rejections carry the reason in `BaseResp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(rename = "BaseResp", default, skip_serializing_if = "Option::is_none")]
    pub base_resp: Option<BaseResp>,
}

impl VerifyTokenResponse {
    /// Accepted token owned by `user_id`.
    #[must_use]
    pub fn accepted(user_id: UserId) -> Self {
        Self {
            valid: true,
            user_id: Some(user_id),
            base_resp: None,
        }
    }

    /// Rejected token.
    #[must_use]
    pub fn rejected(reason: &Error) -> Self {
        Self {
            valid: false,
            user_id: None,
            base_resp: Some(BaseResp::from_error(reason)),
        }
    }
}

/// Domain use-case port for personal access tokens.
#[async_trait]
pub trait ApiKeyService: Send + Sync {
    /// Issue a token for the caller.
    async fn create_api_key(
        &self,
        ctx: &RequestContext,
        req: &CreateApiKeyRequest,
    ) -> Result<CreateApiKeyResponse, Error>;

    /// List the caller's live tokens.
    async fn list_api_keys(
        &self,
        ctx: &RequestContext,
        req: &ListApiKeysRequest,
    ) -> Result<ListApiKeysResponse, Error>;

    /// Load one of the caller's tokens.
    async fn get_api_key(
        &self,
        ctx: &RequestContext,
        req: &ApiKeyByIdRequest,
    ) -> Result<GetApiKeyResponse, Error>;

    /// Rename one of the caller's tokens.
    async fn update_api_key(
        &self,
        ctx: &RequestContext,
        req: &UpdateApiKeyRequest,
    ) -> Result<EmptyResponse, Error>;

    /// Revoke one of the caller's tokens.
    async fn delete_api_key(
        &self,
        ctx: &RequestContext,
        req: &ApiKeyByIdRequest,
    ) -> Result<EmptyResponse, Error>;

    /// Check a presented token and record its use.
    async fn verify_token(
        &self,
        ctx: &RequestContext,
        req: &VerifyTokenRequest,
    ) -> Result<VerifyTokenResponse, Error>;
}
