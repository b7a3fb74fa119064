//! Installs the per-request context cache before any gate or handler runs.

use actix_web::Error;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;

use super::update_context;

/// Ensure the request context carries a cache. Idempotent.
pub async fn install_context_cache(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    update_context(&req, |ctx| {
        ctx.ensure_cache();
    });
    next.call(req).await
}
