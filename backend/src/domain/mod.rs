//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities of the identity substrate
//! (users, spaces, personal access tokens, sessions), the coded error
//! taxonomy shared by every layer, request-scoped context, and the services
//! implementing the driving ports in [`ports`].
//!
//! Public surface:
//! - [`Error`] coded error carrying a registry message and wire extras.
//! - [`RequestContext`] log id, locale, cache and caller of one request.
//! - [`SessionCodec`], [`PasswordHasher`] and [`derive_key`] credential
//!   primitives.
//! - `*Service` types implementing the driving ports.

pub mod error;
pub mod json_numbers;
pub mod ports;
pub mod validate;

mod api_key;
mod api_key_service;
mod auth_service;
mod base_resp;
mod context;
mod ids;
mod locale;
mod log_id;
mod password;
mod session;
mod space;
mod space_service;
mod user;
mod user_service;

pub use self::api_key::{
    API_KEY_NAME_MAX, ApiKey, ApiKeyInfo, ApiKeyLifetime, ApiKeyLifetimeError, ApiKeyStatus,
    PERMANENT_DAYS, PERMANENT_DURATION, SECONDS_PER_DAY, derive_key,
};
pub use self::api_key_service::PersonalAccessTokenService;
pub use self::auth_service::{ACTION_READ, WorkspaceAuthService, WorkspacePermissionProbe};
pub use self::base_resp::{BASE_RESP_KEY, BaseResp};
pub use self::context::{AuthenticatedUser, CacheKey, ContextCache, RequestContext};
pub use self::error::*;
pub use self::ids::{ApiKeyId, SpaceId, UserId};
pub use self::locale::{DEFAULT_LOCALE, LOCALE_COOKIE, Locale, SUPPORTED_LOCALES};
pub use self::log_id::LogId;
pub use self::password::{PasswordError, PasswordHasher, PasswordParams, SALT_LEN};
pub use self::session::{
    DEFAULT_SESSION_SECRET, IssuedSession, SESSION_COOKIE, SESSION_TTL_DAYS, SIGNATURE_LEN,
    Session, SessionCodec, SessionError, session_expires_nanos,
};
pub use self::space::{
    PERSONAL_SPACE_NAME, SPACE_NAME_MAX, Space, SpaceInfo, SpaceMember, SpaceRole, SpaceType,
};
pub use self::space_service::SpaceQueryService;
pub use self::user::{
    DESCRIPTION_MAX, NICK_NAME_MAX, NewUser, ProfileUpdate, UNIQUE_NAME_MAX, User, UserInfo,
    UserStatus, UserValidationError, default_nick_name, validate_email, validate_password,
    validate_profile, validate_unique_name,
};
pub use self::user_service::{CALLER_INFO, UserAccountService};
pub use self::validate::{Validate, ValidationError};
