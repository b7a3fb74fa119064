//! Process-wide error code registry.
//!
//! The registry is assembled with [`ErrorRegistryBuilder`] during startup and
//! frozen with [`ErrorRegistry::install`]. Lookups before installation fall
//! back to [`ErrorRegistry::foundation`].

use std::collections::HashMap;
use std::sync::OnceLock;

use super::codes::*;

static REGISTRY: OnceLock<ErrorRegistry> = OnceLock::new();

/// Message and stability flag registered for one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDefinition {
    /// Default message template; may contain `{name}` placeholders.
    pub message: String,
    /// Whether errors with this code count against stability.
    pub affects_stability: bool,
}

/// Immutable code table plus the fallback code for uncoded errors.
#[derive(Debug, Clone)]
pub struct ErrorRegistry {
    definitions: HashMap<i32, ErrorDefinition>,
    default_code: i32,
}

/// Mutable registry under construction.
#[derive(Debug, Clone)]
pub struct ErrorRegistryBuilder {
    definitions: HashMap<i32, ErrorDefinition>,
    default_code: i32,
}

impl Default for ErrorRegistryBuilder {
    fn default() -> Self {
        Self {
            definitions: HashMap::new(),
            default_code: COMMON_INTERNAL_ERROR,
        }
    }
}

impl ErrorRegistryBuilder {
    /// Register or replace the definition for `code`.
    #[must_use]
    pub fn register(
        mut self,
        code: i32,
        message: impl Into<String>,
        affects_stability: bool,
    ) -> Self {
        self.definitions.insert(
            code,
            ErrorDefinition {
                message: message.into(),
                affects_stability,
            },
        );
        self
    }

    /// Replace the code used when promoting uncoded errors.
    #[must_use]
    pub fn set_default_error_code(mut self, code: i32) -> Self {
        self.default_code = code;
        self
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> ErrorRegistry {
        ErrorRegistry {
            definitions: self.definitions,
            default_code: self.default_code,
        }
    }
}

impl ErrorRegistry {
    /// Empty builder with [`COMMON_INTERNAL_ERROR`] as the default code.
    #[must_use]
    pub fn builder() -> ErrorRegistryBuilder {
        ErrorRegistryBuilder::default()
    }

    /// Builder seeded with every code this crate raises.
    #[must_use]
    pub fn foundation() -> ErrorRegistryBuilder {
        Self::builder()
            .register(COMMON_INTERNAL_ERROR, UNKNOWN_ERROR_MESSAGE, true)
            .register(COMMON_BAD_REQUEST, "Bad request", false)
            .register(COMMON_INVALID_PARAM, "Invalid parameter", false)
            .register(COMMON_UNAUTHORIZED, "Unauthorized", false)
            .register(COMMON_NO_PERMISSION, "No permission", false)
            .register(COMMON_RESOURCE_NOT_FOUND, "Resource not found", false)
            .register(COMMON_DUPLICATE, "Resource already exists", false)
            .register(COMMON_FILE_SIZE_EXCEED_LIMIT, "File size exceeds the limit", false)
            .register(COMMON_RATE_LIMITED, "Too many requests", false)
            .register(COMMON_DB_ERROR, "Database error", true)
            .register(COMMON_CACHE_ERROR, "Cache error", true)
            .register(COMMON_RPC_ERROR, "RPC error", true)
            .register(COMMON_OBJECT_STORAGE_ERROR, "Object storage error", true)
            .register(USER_REGISTRATION_BLOCKED, "Registration is disabled", false)
            .register(USER_EMAIL_EXIST, "Email already registered", false)
            .register(USER_UNIQUE_NAME_EXIST, "Unique name already taken", false)
            .register(USER_PASSWORD_WRONG, "Email or password is incorrect", false)
    }

    /// Install this registry process-wide.
    ///
    /// # Errors
    ///
    /// Returns the registry back when one is already installed.
    pub fn install(self) -> Result<(), Self> {
        REGISTRY.set(self)
    }

    /// The installed registry, or the foundation defaults.
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(|| Self::foundation().build())
    }

    /// Definition registered for `code`.
    #[must_use]
    pub fn lookup(&self, code: i32) -> Option<&ErrorDefinition> {
        self.definitions.get(&code)
    }

    /// Code used when promoting uncoded errors.
    #[must_use]
    pub fn default_code(&self) -> i32 {
        self.default_code
    }

    /// Iterate over every registered code.
    pub fn codes(&self) -> impl Iterator<Item = (i32, &ErrorDefinition)> {
        self.definitions.iter().map(|(code, def)| (*code, def))
    }

    pub(super) fn describe(&self, code: i32) -> (String, bool) {
        self.lookup(code).map_or_else(
            || (UNKNOWN_ERROR_MESSAGE.to_owned(), true),
            |def| (def.message.clone(), def.affects_stability),
        )
    }
}
