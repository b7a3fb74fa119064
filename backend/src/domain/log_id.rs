//! Request-scoped log identifier for correlating log lines and responses.
//!
//! `LogId` follows a request from ingress to the response header. It uses
//! task-local storage so log statements deep in the call graph can read it
//! without explicit threading.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`LogId::scope`] when spawning new tasks to keep the identifier in scope.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::task_local;

task_local! {
    /// Task-local storage for the current log identifier.
    pub(crate) static LOG_ID: LogId;
}

/// Short per-request token echoed in the `X-Log-ID` header.
///
/// The token is the UTC timestamp to the second followed by twelve random
/// hex digits, so identifiers sort roughly by arrival time.
///
/// # Examples
/// ```
/// use foundation::domain::LogId;
///
/// async fn handler() {
///     if let Some(id) = LogId::current() {
///         tracing::info!(log_id = %id, "handling request");
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogId(Arc<str>);

impl LogId {
    /// Generate a fresh identifier stamped with `now`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: u64 = rand::thread_rng().r#gen::<u64>() & 0xffff_ffff_ffff;
        Self(format!("{}{suffix:012x}", now.format("%Y%m%d%H%M%S")).into())
    }

    /// Returns the current log identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        LOG_ID.try_with(Clone::clone).ok()
    }

    /// Borrow the token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Execute the provided future with the supplied log identifier in scope.
    pub async fn scope<Fut>(log_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        LOG_ID.scope(log_id, fut).await
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}
