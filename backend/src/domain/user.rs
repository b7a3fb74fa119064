//! User accounts and their public projection.
//!
//! Passwords are only ever held as Argon2id records; the clear text never
//! leaves the request DTOs. Accounts are soft-deleted through
//! [`UserStatus::Deleted`] and every lookup ignores deleted rows.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::json_numbers::i64_string;

/// Longest accepted unique name.
pub const UNIQUE_NAME_MAX: usize = 20;
/// Longest accepted nick name.
pub const NICK_NAME_MAX: usize = 64;
/// Longest accepted profile description.
pub const DESCRIPTION_MAX: usize = 512;

/// Lifecycle state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Usable account.
    Active,
    /// Soft-deleted account.
    Deleted,
}

impl UserStatus {
    /// Storage spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }

    /// Parse the storage spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Persisted user account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub unique_name: Option<String>,
    pub nick_name: String,
    pub email: String,
    pub hashed_password: String,
    pub avatar_uri: Option<String>,
    pub user_verified: bool,
    pub country_code: String,
    /// Most recently issued session token, cleared on logout.
    pub session_key: Option<String>,
    pub description: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public projection returned to clients.
    #[must_use]
    pub fn info(&self) -> UserInfo {
        UserInfo {
            user_id: self.id,
            name: self.unique_name.clone().unwrap_or_default(),
            nick_name: self.nick_name.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_uri.clone().unwrap_or_default(),
            description: self.description.clone(),
            user_verified: self.user_verified,
            country_code: self.country_code.clone(),
            created_at: self.created_at.timestamp(),
            updated_at: self.updated_at.timestamp(),
        }
    }
}

/// Client-facing user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: UserId,
    /// Unique name, empty when unset.
    pub name: String,
    pub nick_name: String,
    pub email: String,
    pub avatar_url: String,
    pub description: String,
    pub user_verified: bool,
    pub country_code: String,
    /// Unix seconds.
    #[serde(with = "i64_string")]
    pub created_at: i64,
    /// Unix seconds.
    #[serde(with = "i64_string")]
    pub updated_at: i64,
}

/// Fields a new account is created from.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: UserId,
    pub unique_name: Option<String>,
    pub nick_name: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

/// Profile fields an owner may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub unique_name: Option<String>,
    pub nick_name: Option<String>,
    pub description: Option<String>,
    pub avatar_uri: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unique_name.is_none()
            && self.nick_name.is_none()
            && self.description.is_none()
            && self.avatar_uri.is_none()
    }
}

/// Validation errors for account fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email address is malformed")]
    MalformedEmail,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("unique name must be 1 to {max} letters, digits or underscores")]
    InvalidUniqueName { max: usize },
    #[error("nick name must be at most {max} characters")]
    NickNameTooLong { max: usize },
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static UNIQUE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn unique_name_regex() -> &'static Regex {
    UNIQUE_NAME_RE.get_or_init(|| {
        // Length is enforced separately.
        Regex::new(r"^[A-Za-z0-9_]+$")
            .unwrap_or_else(|error| panic!("unique name regex failed to compile: {error}"))
    })
}

/// Check an email address shape.
///
/// # Examples
/// ```
/// use foundation::domain::validate_email;
///
/// assert!(validate_email("a@x.com").is_ok());
/// assert!(validate_email("a@x").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.trim().is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }
    if !email_regex().is_match(email) {
        return Err(UserValidationError::MalformedEmail);
    }
    Ok(())
}

/// Check a clear-text password before hashing.
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        Err(UserValidationError::EmptyPassword)
    } else {
        Ok(())
    }
}

/// Check a unique name.
pub fn validate_unique_name(name: &str) -> Result<(), UserValidationError> {
    let valid = name.chars().count() <= UNIQUE_NAME_MAX && unique_name_regex().is_match(name);
    if valid {
        Ok(())
    } else {
        Err(UserValidationError::InvalidUniqueName {
            max: UNIQUE_NAME_MAX,
        })
    }
}

/// Check the free-text profile fields of an update.
pub fn validate_profile(update: &ProfileUpdate) -> Result<(), UserValidationError> {
    if let Some(name) = &update.unique_name {
        validate_unique_name(name)?;
    }
    if update
        .nick_name
        .as_ref()
        .is_some_and(|nick| nick.chars().count() > NICK_NAME_MAX)
    {
        return Err(UserValidationError::NickNameTooLong { max: NICK_NAME_MAX });
    }
    if update
        .description
        .as_ref()
        .is_some_and(|text| text.chars().count() > DESCRIPTION_MAX)
    {
        return Err(UserValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX,
        });
    }
    Ok(())
}

/// Nick name derived from an email when the client supplies none.
#[must_use]
pub fn default_nick_name(email: &str) -> String {
    email
        .split_once('@')
        .map_or(email, |(local, _)| local)
        .chars()
        .take(NICK_NAME_MAX)
        .collect()
}
