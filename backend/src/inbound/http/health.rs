//! Liveness and readiness probes.
//!
//! Readiness follows the startup sequence: the service reports ready only
//! once every [`StartupStep`] has completed and it is not draining. Probes
//! sit outside the identity gates and answer with an empty body and
//! `Cache-Control: no-store`.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use tracing::debug;

/// Startup work that must finish before the service takes traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    /// Error codes installed process-wide.
    ErrorRegistry,
    /// Account store opened, either the database pool or the in-memory store.
    Store,
    /// Listener bound.
    Listener,
}

impl StartupStep {
    pub const ALL: [Self; 3] = [Self::ErrorRegistry, Self::Store, Self::Listener];

    const fn bit(self) -> u8 {
        match self {
            Self::ErrorRegistry => 0b001,
            Self::Store => 0b010,
            Self::Listener => 0b100,
        }
    }
}

const ALL_STEPS: u8 = 0b111;

/// Startup progress and drain flag shared with the server lifecycle.
#[derive(Debug, Default)]
pub struct HealthState {
    completed: AtomicU8,
    draining: AtomicBool,
}

impl HealthState {
    /// Nothing started yet, but alive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `step` as done.
    pub fn complete(&self, step: StartupStep) {
        self.completed.fetch_or(step.bit(), Ordering::AcqRel);
    }

    /// Steps still outstanding.
    pub fn pending(&self) -> Vec<StartupStep> {
        let completed = self.completed.load(Ordering::Acquire);
        StartupStep::ALL
            .into_iter()
            .filter(|step| completed & step.bit() == 0)
            .collect()
    }

    /// Fail both probes while draining for shutdown.
    pub fn mark_unhealthy(&self) {
        self.draining.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        !self.draining.load(Ordering::Acquire)
            && self.completed.load(Ordering::Acquire) == ALL_STEPS
    }

    pub fn is_alive(&self) -> bool {
        !self.draining.load(Ordering::Acquire)
    }
}

fn probe_response(probe_ok: bool) -> HttpResponse {
    let mut response = if probe_ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// 200 once startup has finished, 503 before that and while draining.
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let ready = state.is_ready();
    if !ready {
        debug!(pending = ?state.pending(), "readiness probe failed");
    }
    probe_response(ready)
}

/// 200 until draining starts.
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_alive())
}
