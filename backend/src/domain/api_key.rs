//! Personal access tokens.
//!
//! The key handed to the client is `hex(sha256(decimal(id)))`. It is
//! deterministic in the id, which is the contract existing clients rely on.
//! Times are unix seconds, except `last_used_at` which is unix milliseconds
//! and `None` until the first successful verification. `deleted_at` is
//! `None` while the key is live.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ids::{ApiKeyId, UserId};
use super::json_numbers::{i64_string, option_i64_string};

/// `duration_day` value that requests a non-expiring key.
pub const PERMANENT_DURATION: &str = "permanent";
/// Days granted to a "permanent" key.
pub const PERMANENT_DAYS: i64 = 99 * 365;
/// Seconds in a day.
pub const SECONDS_PER_DAY: i64 = 86_400;
/// Longest accepted key name.
pub const API_KEY_NAME_MAX: usize = 64;

/// Lifecycle state of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Normal,
    Deleted,
}

impl ApiKeyStatus {
    /// Storage spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Deleted => "deleted",
        }
    }

    /// Parse the storage spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Self::Normal),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Persisted personal access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub key: String,
    pub name: String,
    pub status: ApiKeyStatus,
    pub user_id: UserId,
    pub expire_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_used_at: Option<i64>,
    pub deleted_at: Option<i64>,
}

impl ApiKey {
    /// Whether the key may authenticate a request at `now`.
    #[must_use]
    pub fn is_usable_at(&self, now: i64) -> bool {
        self.status == ApiKeyStatus::Normal && now <= self.expire_at
    }

    /// Client-facing projection without the key material.
    #[must_use]
    pub fn info(&self) -> ApiKeyInfo {
        ApiKeyInfo {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            user_id: self.user_id,
            expire_at: self.expire_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_used_at: self.last_used_at,
        }
    }
}

/// Client-facing key metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    pub id: ApiKeyId,
    pub name: String,
    pub status: ApiKeyStatus,
    pub user_id: UserId,
    #[serde(with = "i64_string")]
    pub expire_at: i64,
    #[serde(with = "i64_string")]
    pub created_at: i64,
    #[serde(with = "i64_string")]
    pub updated_at: i64,
    #[serde(
        with = "option_i64_string",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_used_at: Option<i64>,
}

/// Derive the key material for an id.
///
/// # Examples
/// ```
/// use foundation::domain::{derive_key, ApiKeyId};
///
/// let key = derive_key(ApiKeyId::new(1));
/// assert_eq!(key.len(), 64);
/// assert_eq!(key, derive_key(ApiKeyId::new(1)));
/// ```
#[must_use]
pub fn derive_key(id: ApiKeyId) -> String {
    hex::encode(Sha256::digest(id.get().to_string().as_bytes()))
}

/// How long a new key stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLifetime {
    /// Expires this many days after creation.
    Days(i64),
    /// Expires after [`PERMANENT_DAYS`].
    Permanent,
    /// Expires at an explicit unix timestamp.
    ExpiresAt(i64),
}

/// Rejected lifetime parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiKeyLifetimeError {
    #[error("either duration_day or expire_at is required")]
    Missing,
    #[error("duration_day must be a positive number of days or \"permanent\", got {0:?}")]
    InvalidDuration(String),
    #[error("expire_at must be in the future")]
    ExpiryInPast,
}

impl ApiKeyLifetime {
    /// Interpret the create-request parameters. An explicit `expire_at` wins.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeyLifetimeError`] when neither parameter is usable.
    pub fn from_request(
        duration_day: Option<&str>,
        expire_at: Option<i64>,
    ) -> Result<Self, ApiKeyLifetimeError> {
        if let Some(at) = expire_at.filter(|at| *at > 0) {
            return Ok(Self::ExpiresAt(at));
        }
        let Some(raw) = duration_day.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Err(ApiKeyLifetimeError::Missing);
        };
        if raw.eq_ignore_ascii_case(PERMANENT_DURATION) {
            return Ok(Self::Permanent);
        }
        raw.parse::<i64>()
            .ok()
            .filter(|days| *days > 0 && *days <= PERMANENT_DAYS)
            .map(Self::Days)
            .ok_or_else(|| ApiKeyLifetimeError::InvalidDuration(raw.to_owned()))
    }

    /// Absolute expiry for a key created at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeyLifetimeError::ExpiryInPast`] for explicit expiries at
    /// or before `now`.
    pub fn expire_at(self, now: i64) -> Result<i64, ApiKeyLifetimeError> {
        match self {
            Self::Days(days) => Ok(now.saturating_add(days.saturating_mul(SECONDS_PER_DAY))),
            Self::Permanent => Ok(now.saturating_add(PERMANENT_DAYS * SECONDS_PER_DAY)),
            Self::ExpiresAt(at) if at > now => Ok(at),
            Self::ExpiresAt(_) => Err(ApiKeyLifetimeError::ExpiryInPast),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    const NOW: i64 = 1_700_000_000;

    #[rstest]
    fn derive_key_hashes_decimal_id() {
        // sha256("1")
        assert_eq!(
            derive_key(ApiKeyId::new(1)),
            "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b"
        );
    }

    #[rstest]
    #[case(Some("1"), None, Ok(ApiKeyLifetime::Days(1)))]
    #[case(Some(" 30 "), None, Ok(ApiKeyLifetime::Days(30)))]
    #[case(Some("permanent"), None, Ok(ApiKeyLifetime::Permanent))]
    #[case(Some("1"), Some(NOW + 5), Ok(ApiKeyLifetime::ExpiresAt(NOW + 5)))]
    #[case(None, Some(0), Err(ApiKeyLifetimeError::Missing))]
    #[case(None, None, Err(ApiKeyLifetimeError::Missing))]
    #[case(Some("0"), None, Err(ApiKeyLifetimeError::InvalidDuration("0".to_owned())))]
    #[case(Some("soon"), None, Err(ApiKeyLifetimeError::InvalidDuration("soon".to_owned())))]
    fn parses_lifetime(
        #[case] duration: Option<&str>,
        #[case] expire_at: Option<i64>,
        #[case] expected: Result<ApiKeyLifetime, ApiKeyLifetimeError>,
    ) {
        assert_eq!(ApiKeyLifetime::from_request(duration, expire_at), expected);
    }

    #[rstest]
    #[case(ApiKeyLifetime::Days(1), Ok(NOW + SECONDS_PER_DAY))]
    #[case(ApiKeyLifetime::Permanent, Ok(NOW + 99 * 365 * SECONDS_PER_DAY))]
    #[case(ApiKeyLifetime::ExpiresAt(NOW + 1), Ok(NOW + 1))]
    #[case(ApiKeyLifetime::ExpiresAt(NOW), Err(ApiKeyLifetimeError::ExpiryInPast))]
    fn computes_expiry(
        #[case] lifetime: ApiKeyLifetime,
        #[case] expected: Result<i64, ApiKeyLifetimeError>,
    ) {
        assert_eq!(lifetime.expire_at(NOW), expected);
    }

    fn key(status: ApiKeyStatus) -> ApiKey {
        ApiKey {
            id: ApiKeyId::new(1),
            key: derive_key(ApiKeyId::new(1)),
            name: "ci".to_owned(),
            status,
            user_id: UserId::new(2),
            expire_at: NOW,
            created_at: NOW - 10,
            updated_at: NOW - 10,
            last_used_at: None,
            deleted_at: None,
        }
    }

    #[rstest]
    #[case(ApiKeyStatus::Normal, NOW, true)]
    #[case(ApiKeyStatus::Normal, NOW + 1, false)]
    #[case(ApiKeyStatus::Deleted, NOW - 1, false)]
    fn usability_requires_normal_and_unexpired(
        #[case] status: ApiKeyStatus,
        #[case] at: i64,
        #[case] usable: bool,
    ) {
        assert_eq!(key(status).is_usable_at(at), usable);
    }

    #[rstest]
    fn info_omits_unused_timestamp() {
        let value = serde_json::to_value(key(ApiKeyStatus::Normal).info()).expect("encode");
        assert!(value.get("last_used_at").is_none());
        assert_eq!(value["expire_at"], serde_json::json!(NOW.to_string()));
    }
}
