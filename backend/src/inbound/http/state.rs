//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O. In
//! the assembled server every port is a local RPC client, so handler calls
//! pass through the interceptor chain.

use std::sync::Arc;

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};

use crate::domain::ports::{ApiKeyService, AuthService, SpaceService, UserService};
use crate::domain::{SESSION_COOKIE, SESSION_TTL_DAYS};

/// Attributes of the `session_key` cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCookiePolicy {
    /// Whether the cookie is marked `Secure`.
    pub secure: bool,
}

impl SessionCookiePolicy {
    /// Cookie carrying a freshly issued session token.
    #[must_use]
    pub fn issue(self, token: &str) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token.to_owned())
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::days(SESSION_TTL_DAYS))
            .finish()
    }

    /// Cookie instructing the client to drop its session.
    #[must_use]
    pub fn removal(self) -> Cookie<'static> {
        let mut cookie = self.issue("");
        cookie.make_removal();
        cookie
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserService>,
    pub api_keys: Arc<dyn ApiKeyService>,
    pub spaces: Arc<dyn SpaceService>,
    pub auth: Arc<dyn AuthService>,
    pub cookies: SessionCookiePolicy,
}

/// Parameter object bundling the port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserService>,
    pub api_keys: Arc<dyn ApiKeyService>,
    pub spaces: Arc<dyn SpaceService>,
    pub auth: Arc<dyn AuthService>,
}

impl HttpState {
    /// Construct state from port implementations and the cookie policy.
    pub fn new(ports: HttpStatePorts, cookies: SessionCookiePolicy) -> Self {
        let HttpStatePorts {
            users,
            api_keys,
            spaces,
            auth,
        } = ports;
        Self {
            users,
            api_keys,
            spaces,
            auth,
            cookies,
        }
    }
}
