//! Locale selection from the `i18next` cookie.

use actix_web::Error;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;

use crate::domain::{LOCALE_COOKIE, Locale};

use super::update_context;

/// Resolve the request locale and store it on the [`crate::domain::RequestContext`].
///
/// Unsupported or missing hints fall back to the default locale.
pub async fn select_locale(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let hint = req.cookie(LOCALE_COOKIE);
    let locale = Locale::resolve(hint.as_ref().map(|cookie| cookie.value()));
    update_context(&req, |ctx| ctx.set_locale(locale));
    next.call(req).await
}
