//! Numeric codes registered by the foundation tier.
//!
//! Codes are grouped as `6RR_SSS_NNN`: the leading block identifies the
//! owning module, the middle block mirrors the closest HTTP status.

/// Unexpected failure inside the service. Also the default code.
pub const COMMON_INTERNAL_ERROR: i32 = 600_500_000;
/// The request could not be bound or is structurally malformed.
pub const COMMON_BAD_REQUEST: i32 = 600_400_000;
/// A request field failed validation.
pub const COMMON_INVALID_PARAM: i32 = 600_400_001;
/// The caller is not authenticated.
pub const COMMON_UNAUTHORIZED: i32 = 600_401_000;
/// The caller may not perform the operation.
pub const COMMON_NO_PERMISSION: i32 = 600_403_000;
/// The addressed resource does not exist.
pub const COMMON_RESOURCE_NOT_FOUND: i32 = 600_404_000;
/// The resource already exists.
pub const COMMON_DUPLICATE: i32 = 600_409_000;
/// The upload exceeds the configured size limit.
pub const COMMON_FILE_SIZE_EXCEED_LIMIT: i32 = 600_413_000;
/// The caller exceeded a rate limit.
pub const COMMON_RATE_LIMITED: i32 = 600_429_000;
/// The database failed or is unreachable.
pub const COMMON_DB_ERROR: i32 = 600_503_001;
/// The cache failed or is unreachable.
pub const COMMON_CACHE_ERROR: i32 = 600_503_002;
/// A downstream RPC failed.
pub const COMMON_RPC_ERROR: i32 = 600_503_003;
/// Object storage failed or is unreachable.
pub const COMMON_OBJECT_STORAGE_ERROR: i32 = 600_503_004;

/// Registration is disabled for this deployment.
pub const USER_REGISTRATION_BLOCKED: i32 = 601_000_001;
/// Another account already uses the email.
pub const USER_EMAIL_EXIST: i32 = 601_000_002;
/// Another account already uses the unique name.
pub const USER_UNIQUE_NAME_EXIST: i32 = 601_000_003;
/// The email and password do not match.
pub const USER_PASSWORD_WRONG: i32 = 601_000_004;

/// Message used when a code has no registration.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Service Internal Error";
