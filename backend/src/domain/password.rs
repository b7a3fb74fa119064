//! Argon2id password records.
//!
//! Records use the PHC-style layout
//! `$argon2id$v=19$m=<m>,t=<t>,p=<p>$<salt>$<hash>` with unpadded standard
//! base64. Verification reads the cost parameters back from the record, so
//! records written with other parameters keep verifying after a change.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

const VERSION_TAG: &str = "v=19";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    /// Memory in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub key_len: usize,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
            key_len: 32,
        }
    }
}

/// Failures while hashing or reading a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password record is malformed: {0}")]
    MalformedRecord(&'static str),
    #[error("argon2 rejected the parameters: {0}")]
    Argon2(String),
}

impl From<argon2::Error> for PasswordError {
    fn from(value: argon2::Error) -> Self {
        Self::Argon2(value.to_string())
    }
}

/// Hashes and verifies passwords with fixed Argon2id parameters.
///
/// # Examples
/// ```
/// use foundation::domain::{PasswordHasher, PasswordParams};
///
/// let hasher = PasswordHasher::new(PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1, key_len: 32 });
/// let record = hasher.hash("p1").expect("hash");
/// assert!(record.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
/// assert!(PasswordHasher::verify("p1", &record).expect("verify"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    params: PasswordParams,
}

impl PasswordHasher {
    /// Hasher writing records with `params`.
    #[must_use]
    pub const fn new(params: PasswordParams) -> Self {
        Self { params }
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Argon2`] when the parameters are rejected.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0_u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let key = derive(password, &salt, self.params)?;
        Ok(format!(
            "$argon2id${VERSION_TAG}$m={},t={},p={}${}${}",
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(key.as_slice()),
        ))
    }

    /// Check `password` against a stored record in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError`] when the record cannot be parsed.
    pub fn verify(password: &str, record: &str) -> Result<bool, PasswordError> {
        let parsed = ParsedRecord::parse(record)?;
        let candidate = derive(password, &parsed.salt, parsed.params)?;
        Ok(candidate.as_slice().ct_eq(&parsed.hash).into())
    }
}

fn derive(
    password: &str,
    salt: &[u8],
    params: PasswordParams,
) -> Result<Zeroizing<Vec<u8>>, PasswordError> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(params.key_len),
    )?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut out = Zeroizing::new(vec![0_u8; params.key_len]);
    argon.hash_password_into(password.as_bytes(), salt, &mut out)?;
    Ok(out)
}

struct ParsedRecord {
    params: PasswordParams,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl ParsedRecord {
    fn parse(record: &str) -> Result<Self, PasswordError> {
        let mut parts = record.split('$');
        let (Some(""), Some(algorithm), Some(version), Some(costs), Some(salt), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(PasswordError::MalformedRecord("expected six $-separated fields"));
        };
        if algorithm != "argon2id" {
            return Err(PasswordError::MalformedRecord("unsupported algorithm"));
        }
        if version != VERSION_TAG {
            return Err(PasswordError::MalformedRecord("unsupported version"));
        }
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| PasswordError::MalformedRecord("salt is not base64"))?;
        let hash = STANDARD_NO_PAD
            .decode(hash)
            .map_err(|_| PasswordError::MalformedRecord("hash is not base64"))?;
        let params = parse_costs(costs, hash.len())?;
        Ok(Self { params, salt, hash })
    }
}

fn parse_costs(costs: &str, key_len: usize) -> Result<PasswordParams, PasswordError> {
    let mut memory = None;
    let mut iterations = None;
    let mut parallelism = None;
    for pair in costs.split(',') {
        let (name, value) = pair
            .split_once('=')
            .ok_or(PasswordError::MalformedRecord("cost is not name=value"))?;
        let value: u32 = value
            .parse()
            .map_err(|_| PasswordError::MalformedRecord("cost is not an integer"))?;
        match name {
            "m" => memory = Some(value),
            "t" => iterations = Some(value),
            "p" => parallelism = Some(value),
            _ => return Err(PasswordError::MalformedRecord("unknown cost parameter")),
        }
    }
    match (memory, iterations, parallelism) {
        (Some(memory_kib), Some(iterations), Some(parallelism)) => Ok(PasswordParams {
            memory_kib,
            iterations,
            parallelism,
            key_len,
        }),
        _ => Err(PasswordError::MalformedRecord("missing cost parameter")),
    }
}
