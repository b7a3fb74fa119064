//! Stateless signed sessions.
//!
//! A session token is `base64url-nopad(JSON(session) || HMAC-SHA256(JSON))`.
//! Nothing is stored server-side, so validation only needs the process-wide
//! secret and a clock. Tokens expire seven days after issue.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::ids::UserId;
use super::json_numbers::i64_string;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_key";
/// Days a session stays valid.
pub const SESSION_TTL_DAYS: i64 = 7;
/// Secret used when the deployment does not configure one.
pub const DEFAULT_SESSION_SECRET: &str = "foundation-session-hmac-secret";
/// Length of the trailing signature.
pub const SIGNATURE_LEN: usize = 32;

/// Session lifetime in nanoseconds, as reported to clients.
#[must_use]
pub const fn session_expires_nanos() -> i64 {
    SESSION_TTL_DAYS * 24 * 60 * 60 * 1_000_000_000
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(with = "i64_string")]
    pub session_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Parse the user id claim.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidData`] when the claim is not numeric.
    pub fn user_id(&self) -> Result<UserId, SessionError> {
        self.user_id.parse().map_err(|_| SessionError::InvalidData)
    }
}

/// Reasons a token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session token is not valid base64url")]
    InvalidFormat,
    #[error("session token is too short")]
    TooShort,
    #[error("session token signature does not match")]
    InvalidSignature,
    #[error("session token payload is malformed")]
    InvalidData,
    #[error("session has expired")]
    Expired,
    #[error("session secret was rejected by the signer")]
    Key,
}

/// A freshly issued token together with its claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// Issues and validates session tokens with one process-wide secret.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use foundation::domain::{SessionCodec, DEFAULT_SESSION_SECRET};
///
/// let codec = SessionCodec::new(DEFAULT_SESSION_SECRET, Arc::new(mockable::DefaultClock));
/// let issued = codec.generate_session_key("42", 7).expect("sign session");
/// let session = codec.validate_session(&issued.token).expect("valid token");
/// assert_eq!(session.user_id, "42");
/// ```
pub struct SessionCodec {
    secret: Zeroizing<Vec<u8>>,
    clock: Arc<dyn Clock>,
}

impl SessionCodec {
    /// Build a codec over `secret`.
    pub fn new(secret: impl AsRef<[u8]>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: Zeroizing::new(secret.as_ref().to_vec()),
            clock,
        }
    }

    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| SessionError::Key)
    }

    /// Sign a new session for `user_id` valid from now for seven days.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the claims cannot be encoded or signed.
    pub fn generate_session_key(
        &self,
        user_id: &str,
        session_id: i64,
    ) -> Result<IssuedSession, SessionError> {
        let now = self.clock.utc();
        let session = Session {
            user_id: user_id.to_owned(),
            session_id,
            created_at: now,
            expires_at: now + TimeDelta::days(SESSION_TTL_DAYS),
        };
        let mut buffer = serde_json::to_vec(&session).map_err(|_| SessionError::InvalidData)?;
        let mut mac = self.mac()?;
        mac.update(&buffer);
        buffer.extend_from_slice(&mac.finalize().into_bytes());
        Ok(IssuedSession {
            token: URL_SAFE_NO_PAD.encode(buffer),
            session,
        })
    }

    /// Check a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] describing the first failed check.
    pub fn validate_session(&self, token: &str) -> Result<Session, SessionError> {
        let buffer = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| SessionError::InvalidFormat)?;
        let Some(split) = buffer.len().checked_sub(SIGNATURE_LEN) else {
            return Err(SessionError::TooShort);
        };
        let (payload, signature) = buffer.split_at(split);
        let mut mac = self.mac()?;
        mac.update(payload);
        mac.verify_slice(signature)
            .map_err(|_| SessionError::InvalidSignature)?;
        let session: Session =
            serde_json::from_slice(payload).map_err(|_| SessionError::InvalidData)?;
        if self.clock.utc() > session.expires_at {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }
}
