//! Coded errors shared by every layer of the service.
//!
//! An [`Error`] carries a stable numeric code, a message template resolved
//! from the [`ErrorRegistry`], free-form string extras and the stability flag
//! used by alerting. The backtrace is captured once when the first coded
//! error in a chain is created; wrapping an existing [`Error`] reuses it.
//!
//! Across service boundaries errors travel as a [`WireError`] triple. The
//! stability flag and the custom extras are folded into the wire `extra`
//! map under [`EXTRA_AFFECT_STABILITY`] and [`EXTRA_CUSTOM`].

use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

mod codes;
mod registry;

pub use codes::*;
pub use registry::{ErrorDefinition, ErrorRegistry, ErrorRegistryBuilder};

/// Wire key holding the stability flag (`"0"` or `"1"`).
pub const EXTRA_AFFECT_STABILITY: &str = "biz_err_affect_stability";
/// Wire key holding the JSON-encoded custom extras.
pub const EXTRA_CUSTOM: &str = "biz_err_custom_extra";

type Source = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Coded error propagated through services, interceptors and the envelope.
///
/// # Examples
/// ```
/// use foundation::domain::{Error, COMMON_INVALID_PARAM};
///
/// let err = Error::by_code(COMMON_INVALID_PARAM).with_extra_msg("email is empty");
/// assert_eq!(err.code(), COMMON_INVALID_PARAM);
/// assert!(err.message().ends_with(", email is empty"));
/// ```
#[derive(Debug, Clone)]
pub struct Error {
    code: i32,
    message: String,
    extra: BTreeMap<String, String>,
    affects_stability: bool,
    backtrace: Arc<Backtrace>,
    source: Option<Source>,
}

impl Error {
    /// Create an error for `code` using the registered message and flag.
    ///
    /// Unregistered codes keep the code, use the registry's fallback message
    /// and count against stability.
    #[must_use]
    pub fn by_code(code: i32) -> Self {
        let (message, affects_stability) = ErrorRegistry::global().describe(code);
        Self {
            code,
            message,
            extra: BTreeMap::new(),
            affects_stability,
            backtrace: Arc::new(Backtrace::capture()),
            source: None,
        }
    }

    /// Promote any error to a coded error.
    ///
    /// When `err` is itself an [`Error`] its backtrace is reused so the
    /// earliest capture survives the wrap; `err` becomes the source.
    #[must_use]
    pub fn wrap_by_code<E>(err: E, code: i32) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = err.into();
        let (message, affects_stability) = ErrorRegistry::global().describe(code);
        let backtrace = boxed
            .downcast_ref::<Self>()
            .map_or_else(|| Arc::new(Backtrace::capture()), |inner| Arc::clone(&inner.backtrace));
        Self {
            code,
            message,
            extra: BTreeMap::new(),
            affects_stability,
            backtrace,
            source: Some(Arc::from(boxed)),
        }
    }

    /// Promote an error using the registry's default code.
    ///
    /// Coded errors pass through untouched.
    #[must_use]
    pub fn wrap<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = err.into();
        match boxed.downcast::<Self>() {
            Ok(coded) => *coded,
            Err(other) => Self::wrap_by_code(other, ErrorRegistry::global().default_code()),
        }
    }

    /// Append `extra` to the message as `"{base}, {extra}"`.
    #[must_use]
    pub fn with_extra_msg(mut self, extra: impl AsRef<str>) -> Self {
        self.message = format!("{}, {}", self.message, extra.as_ref());
        self
    }

    /// Substitute every `{name}` placeholder in the message with `value`.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl AsRef<str>) -> Self {
        let placeholder = format!("{{{name}}}");
        self.message = self.message.replace(&placeholder, value.as_ref());
        self
    }

    /// Attach a custom string extra.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Override the registered stability flag.
    #[must_use]
    pub fn with_stability(mut self, affects_stability: bool) -> Self {
        self.affects_stability = affects_stability;
        self
    }

    /// Stable numeric code.
    #[must_use]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Resolved message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Custom extras attached by the producer.
    #[must_use]
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Whether this error counts against service stability.
    #[must_use]
    pub fn affects_stability(&self) -> bool {
        self.affects_stability
    }

    /// Backtrace captured by the first coded error in the chain.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Encode as the cross-service triple.
    #[must_use]
    pub fn to_wire(&self) -> WireError {
        let mut extra = BTreeMap::new();
        extra.insert(
            EXTRA_AFFECT_STABILITY.to_owned(),
            if self.affects_stability { "1" } else { "0" }.to_owned(),
        );
        if !self.extra.is_empty() {
            match serde_json::to_string(&self.extra) {
                Ok(blob) => {
                    extra.insert(EXTRA_CUSTOM.to_owned(), blob);
                }
                Err(error) => warn!(%error, code = self.code, "failed to encode error extras"),
            }
        }
        WireError {
            code: self.code,
            message: self.message.clone(),
            extra,
        }
    }

    /// Rebuild a coded error from the cross-service triple.
    ///
    /// A missing stability flag is read as `true`; an undecodable custom
    /// blob is dropped.
    #[must_use]
    pub fn from_wire(wire: WireError) -> Self {
        let WireError {
            code,
            message,
            extra,
        } = wire;
        let affects_stability = extra
            .get(EXTRA_AFFECT_STABILITY)
            .is_none_or(|flag| flag != "0");
        let custom = extra
            .get(EXTRA_CUSTOM)
            .and_then(|blob| serde_json::from_str::<BTreeMap<String, String>>(blob).ok())
            .unwrap_or_default();
        Self {
            code,
            message,
            extra: custom,
            affects_stability,
            backtrace: Arc::new(Backtrace::capture()),
            source: None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.message == other.message
            && self.extra == other.extra
            && self.affects_stability == other.affects_stability
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "code={} message={}", self.code, self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}

/// Cross-service error representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    /// Stable numeric code.
    pub code: i32,
    /// Resolved message.
    pub message: String,
    /// Stability flag plus the JSON-encoded custom extras.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl From<WireError> for Error {
    fn from(value: WireError) -> Self {
        Self::from_wire(value)
    }
}

impl From<&Error> for WireError {
    fn from(value: &Error) -> Self {
        value.to_wire()
    }
}

macro_rules! coded_constructors {
    ($($(#[$meta:meta])* $name:ident => $code:ident),* $(,)?) => {
        impl Error {
            $(
                $(#[$meta])*
                #[must_use]
                pub fn $name(detail: impl AsRef<str>) -> Self {
                    let detail = detail.as_ref();
                    let err = Self::by_code($code);
                    if detail.is_empty() { err } else { err.with_extra_msg(detail) }
                }
            )*
        }
    };
}

coded_constructors! {
    /// [`COMMON_INVALID_PARAM`] with a detail suffix.
    invalid_param => COMMON_INVALID_PARAM,
    /// [`COMMON_BAD_REQUEST`] with a detail suffix.
    bad_request => COMMON_BAD_REQUEST,
    /// [`COMMON_UNAUTHORIZED`] with a detail suffix.
    unauthorized => COMMON_UNAUTHORIZED,
    /// [`COMMON_NO_PERMISSION`] with a detail suffix.
    no_permission => COMMON_NO_PERMISSION,
    /// [`COMMON_RESOURCE_NOT_FOUND`] with a detail suffix.
    not_found => COMMON_RESOURCE_NOT_FOUND,
    /// [`COMMON_INTERNAL_ERROR`] with a detail suffix.
    internal => COMMON_INTERNAL_ERROR,
    /// [`COMMON_DB_ERROR`] with a detail suffix.
    database => COMMON_DB_ERROR,
}

#[cfg(test)]
mod tests;
