//! Ingress middleware.
//!
//! Registration order, outermost first: [`AssignLogId`], [`select_locale`],
//! [`AccessLog`], [`Envelope`], [`install_context_cache`], then an optional
//! [`IdentityGate`]. Each stage reads and updates the
//! [`RequestContext`] stored in the request extensions.

mod access_log;
mod body;
mod context_cache;
mod envelope;
mod identity;
mod locale;
mod log_id;

use actix_web::dev::ServiceRequest;
use actix_web::HttpMessage;

use crate::domain::RequestContext;

pub use access_log::{AccessLog, AccessLogMiddleware, MAX_LOGGED_BODY};
pub use context_cache::install_context_cache;
pub use envelope::{Envelope, EnvelopeMiddleware};
pub use identity::{
    AccessTokenAuthenticator, Authenticator, IdentityGate, IdentityGateMiddleware, PUBLIC_PATHS,
    SessionAuthenticator,
};
pub use locale::select_locale;
pub use log_id::{AssignLogId, LOG_ID_HEADER, LogIdMiddleware};

pub(crate) use body::{EVENT_STREAM_MEDIA, is_event_stream};

/// Snapshot of the request context, or a detached one outside the pipeline.
pub(crate) fn current_context(req: &ServiceRequest) -> RequestContext {
    req.extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(RequestContext::detached)
}

/// Apply `change` to the stored request context, creating it if missing.
pub(crate) fn update_context(req: &ServiceRequest, change: impl FnOnce(&mut RequestContext)) {
    let mut extensions = req.extensions_mut();
    if let Some(ctx) = extensions.get_mut::<RequestContext>() {
        change(ctx);
        return;
    }
    let mut ctx = RequestContext::detached();
    change(&mut ctx);
    extensions.insert(ctx);
}
