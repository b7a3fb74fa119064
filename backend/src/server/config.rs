//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use zeroize::Zeroizing;

use crate::domain::DEFAULT_SESSION_SECRET;
use crate::outbound::persistence::DbPool;
use crate::settings::{FoundationSettings, SettingsError};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) cookie_secure: bool,
    pub(crate) registration_enabled: bool,
    pub(crate) session_secret: Zeroizing<String>,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Configuration binding `bind_addr` with open registration, insecure
    /// cookies and the built-in session secret.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            cookie_secure: false,
            registration_enabled: true,
            session_secret: Zeroizing::new(DEFAULT_SESSION_SECRET.to_owned()),
            db_pool: None,
        }
    }

    /// Configuration derived from loaded settings, without a pool.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the bind address is malformed.
    pub fn from_settings(settings: &FoundationSettings) -> Result<Self, SettingsError> {
        Ok(Self::new(settings.bind_addr()?)
            .with_cookie_secure(settings.cookie_secure)
            .with_registration_enabled(settings.registration_enabled)
            .with_session_secret(settings.session_secret()))
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_registration_enabled(mut self, enabled: bool) -> Self {
        self.registration_enabled = enabled;
        self
    }

    /// Replace the HMAC secret signing session tokens.
    #[must_use]
    pub fn with_session_secret(mut self, secret: &str) -> Self {
        self.session_secret = Zeroizing::new(secret.to_owned());
        self
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without one the server runs on the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
