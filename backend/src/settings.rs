//! Service configuration loaded via OrthoConfig.
//!
//! Values merge from `FOUNDATION_*` environment variables, the optional
//! configuration file and command-line flags. Accessors supply the
//! fallbacks so the composition root never reads the environment itself.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_SESSION_SECRET;

/// Listener address used when none is configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Pool size used when none is configured.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Configuration values for the foundation service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FOUNDATION")]
pub struct FoundationSettings {
    /// Socket address the HTTP listener binds.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; without one the service runs on the in-memory store.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// HMAC secret signing session tokens.
    pub session_secret: Option<String>,
    /// Mark the session cookie `Secure`.
    #[ortho_config(default = false)]
    pub cookie_secure: bool,
    /// Allow self-service registration.
    #[ortho_config(default = true)]
    pub registration_enabled: bool,
}

impl FoundationSettings {
    /// Parsed listener address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the configured value is not a
    /// socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .max(1)
    }

    /// Session signing secret, falling back to the built-in literal.
    pub fn session_secret(&self) -> &str {
        self.session_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .unwrap_or(DEFAULT_SESSION_SECRET)
    }

    /// Whether a session secret was configured explicitly.
    pub fn has_session_secret(&self) -> bool {
        self.session_secret
            .as_deref()
            .is_some_and(|secret| !secret.is_empty())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 6] = [
        "FOUNDATION_BIND_ADDR",
        "FOUNDATION_DATABASE_URL",
        "FOUNDATION_DB_MAX_CONNECTIONS",
        "FOUNDATION_SESSION_SECRET",
        "FOUNDATION_COOKIE_SECURE",
        "FOUNDATION_REGISTRATION_ENABLED",
    ];

    fn load_from_empty_args() -> FoundationSettings {
        FoundationSettings::load_from_iter([OsString::from("foundation")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default address"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("literal")
        );
        assert!(settings.database_url().is_none());
        assert_eq!(settings.db_max_connections(), DEFAULT_DB_MAX_CONNECTIONS);
        assert_eq!(settings.session_secret(), DEFAULT_SESSION_SECRET);
        assert!(!settings.has_session_secret());
        assert!(!settings.cookie_secure);
        assert!(settings.registration_enabled);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("FOUNDATION_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "FOUNDATION_DATABASE_URL",
                Some("postgres://localhost/foundation".to_owned()),
            ),
            ("FOUNDATION_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("FOUNDATION_SESSION_SECRET", Some("s3cret".to_owned())),
            ("FOUNDATION_COOKIE_SECURE", Some("true".to_owned())),
            ("FOUNDATION_REGISTRATION_ENABLED", Some("false".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("address").to_string(),
            "127.0.0.1:9000"
        );
        assert_eq!(
            settings.database_url(),
            Some("postgres://localhost/foundation")
        );
        assert_eq!(settings.db_max_connections(), 4);
        assert_eq!(settings.session_secret(), "s3cret");
        assert!(settings.cookie_secure);
        assert!(!settings.registration_enabled);
    }

    #[rstest]
    fn malformed_bind_address_is_reported() {
        let _guard = lock_env([("FOUNDATION_BIND_ADDR", Some("not-an-address".to_owned()))]);

        let err = load_from_empty_args()
            .bind_addr()
            .expect_err("address must be rejected");
        assert!(matches!(err, SettingsError::BindAddr { .. }));
    }
}
