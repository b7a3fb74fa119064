//! Test utilities for the foundation crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

use std::sync::atomic::{AtomicI64, Ordering};
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use actix_web::web;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tracing::subscriber::DefaultGuard;

use crate::domain::ports::IdGenerator;
use crate::domain::{DEFAULT_SESSION_SECRET, PasswordHasher, PasswordParams, SessionCodec};
use crate::inbound::http::health::{HealthState, StartupStep};
use crate::inbound::http::state::{HttpState, SessionCookiePolicy};
use crate::outbound::i18n::StaticTranslator;
use crate::outbound::memory::InMemoryStore;
use crate::server::{AppDependencies, Repositories, ServiceDeps, build_ports};

/// Clock whose current instant is set by the test.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use foundation::test_support::MutableClock;
/// use mockable::Clock;
///
/// let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let clock = MutableClock::new(start);
/// clock.advance_seconds(60);
/// assert_eq!(clock.utc().timestamp(), start.timestamp() + 60);
/// ```
#[derive(Debug)]
pub struct MutableClock {
    now: Mutex<DateTime<Utc>>,
}

impl MutableClock {
    /// Clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Id generator handing out consecutive integers.
#[derive(Debug)]
pub struct SequenceIds {
    next: AtomicI64,
}

impl SequenceIds {
    /// Generator whose first id is `first`.
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Log lines written while a [`CapturedLogs::install`] guard is alive.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Send this thread's events, down to `debug`, into a fresh buffer until
    /// the guard drops.
    pub fn install() -> (Self, DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    /// Everything captured so far.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Captured lines containing `needle`.
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Argon2id hasher with parameters small enough for test suites.
pub fn fast_password_hasher() -> PasswordHasher {
    PasswordHasher::new(PasswordParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        key_len: 32,
    })
}

/// Fully wired services over an in-memory store.
pub struct TestServices {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<MutableClock>,
    pub deps: AppDependencies,
}

impl TestServices {
    /// Services starting at 2025-01-01T00:00:00Z with open registration.
    pub fn new() -> Self {
        Self::with_registration(true)
    }

    /// Services with registration opened or closed.
    pub fn with_registration(registration_enabled: bool) -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let clock = Arc::new(MutableClock::new(start));
        let store = Arc::new(InMemoryStore::new());
        let shared_clock: Arc<dyn Clock> = clock.clone();
        let sessions = Arc::new(SessionCodec::new(
            DEFAULT_SESSION_SECRET,
            Arc::clone(&shared_clock),
        ));
        let ports = build_ports(
            Repositories::in_memory(&store),
            ServiceDeps {
                clock: shared_clock,
                ids: Arc::new(SequenceIds::starting_at(1_000)),
                sessions: Arc::clone(&sessions),
                hasher: fast_password_hasher(),
                registration_enabled,
            },
        );
        let health_state = web::Data::new(HealthState::new());
        health_state.complete(StartupStep::Store);
        let deps = AppDependencies {
            health_state,
            http_state: web::Data::new(HttpState::new(ports, SessionCookiePolicy::default())),
            sessions,
            translator: Arc::new(StaticTranslator::new()),
        };
        Self { store, clock, deps }
    }
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}
