//! Request-scoped state threaded through handlers, interceptors and services.
//!
//! [`RequestContext`] is cheap to clone: clones share the same
//! [`ContextCache`], so values stored by one layer are visible to every other
//! layer handling the same logical request.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::error::Error;
use super::ids::UserId;
use super::locale::Locale;
use super::log_id::LogId;

/// Typed key into a [`ContextCache`].
///
/// Two keys with the same name but different value types address the same
/// slot; reading through the wrong type yields `None`.
///
/// # Examples
/// ```
/// use foundation::domain::{CacheKey, ContextCache};
///
/// const ATTEMPTS: CacheKey<u32> = CacheKey::new("attempts");
/// let cache = ContextCache::default();
/// cache.store(&ATTEMPTS, 3);
/// assert_eq!(cache.get(&ATTEMPTS).as_deref(), Some(&3));
/// ```
pub struct CacheKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CacheKey<T> {
    /// Declare a key.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Slot name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Thread-safe per-request scratch map.
#[derive(Clone, Default)]
pub struct ContextCache {
    entries: Arc<DashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

impl ContextCache {
    /// Store `value`, replacing any previous value in the slot.
    pub fn store<T>(&self, key: &CacheKey<T>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.entries.insert(key.name, Arc::new(value));
    }

    /// Read the slot if it holds a `T`.
    #[must_use]
    pub fn get<T>(&self, key: &CacheKey<T>) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self.entries.get(key.name)?;
        Arc::clone(entry.value()).downcast::<T>().ok()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Identity attached by the session or access-token gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i32>,
}

/// Values carried by one logical request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    log_id: LogId,
    locale: Locale,
    cache: Option<ContextCache>,
    user: Option<Arc<AuthenticatedUser>>,
}

impl RequestContext {
    /// Context for a request that has just entered the service.
    #[must_use]
    pub fn new(log_id: LogId) -> Self {
        Self {
            log_id,
            locale: Locale::default(),
            cache: None,
            user: None,
        }
    }

    /// Context for work started outside the HTTP pipeline.
    ///
    /// Reuses the task-local log id when one is in scope.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(LogId::current().unwrap_or_else(|| LogId::generate(chrono::Utc::now())))
    }

    /// Log identifier of the request.
    #[must_use]
    pub fn log_id(&self) -> &LogId {
        &self.log_id
    }

    /// Locale selected for the request.
    #[must_use]
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Replace the locale.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Builder form of [`Self::set_locale`].
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Install an empty cache unless one is already present.
    pub fn ensure_cache(&mut self) -> &ContextCache {
        self.cache.get_or_insert_with(ContextCache::default)
    }

    /// The installed cache, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&ContextCache> {
        self.cache.as_ref()
    }

    /// Store into the cache; a no-op when no cache is installed.
    pub fn cache_store<T>(&self, key: &CacheKey<T>, value: T)
    where
        T: Any + Send + Sync,
    {
        if let Some(cache) = &self.cache {
            cache.store(key, value);
        }
    }

    /// Read from the cache; `None` when no cache is installed.
    #[must_use]
    pub fn cache_get<T>(&self, key: &CacheKey<T>) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.cache.as_ref().and_then(|cache| cache.get(key))
    }

    /// Attach the authenticated caller.
    #[must_use]
    pub fn with_user(mut self, user: AuthenticatedUser) -> Self {
        self.set_user(user);
        self
    }

    /// In-place form of [`Self::with_user`].
    pub fn set_user(&mut self, user: AuthenticatedUser) {
        self.user = Some(Arc::new(user));
    }

    /// Authenticated caller, if a gate admitted one.
    #[must_use]
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_deref()
    }

    /// Caller id, required by operations acting on the caller's behalf.
    ///
    /// # Errors
    ///
    /// Returns an unauthorized error when no caller is attached.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user
            .as_ref()
            .map(|user| user.id)
            .ok_or_else(|| Error::unauthorized("no authenticated user in request context"))
    }
}
