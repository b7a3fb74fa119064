//! Ingress middleware assigning every request a [`LogId`].
//!
//! The id is stored in a fresh [`RequestContext`] in the request extensions,
//! scoped into task-local storage for the rest of the pipeline and echoed in
//! the `X-Log-ID` response header. Work spawned onto other tasks must
//! re-enter [`LogId::scope`] to keep the id.

use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage};
use chrono::Utc;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info_span};

use crate::domain::{LogId, RequestContext};

/// Response header carrying the log id.
pub const LOG_ID_HEADER: &str = "x-log-id";

/// Middleware factory for [`LogIdMiddleware`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use foundation::middleware::AssignLogId;
///
/// let _app = App::new().wrap(AssignLogId);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignLogId;

impl<S, B> Transform<S, ServiceRequest> for AssignLogId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LogIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LogIdMiddleware { service }))
    }
}

/// Service wrapper produced by [`AssignLogId`].
pub struct LogIdMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LogIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let log_id = LogId::generate(Utc::now());
        req.extensions_mut()
            .insert(RequestContext::new(log_id.clone()));
        let span = info_span!("request", log_id = %log_id);
        let fut = self.service.call(req);
        Box::pin(
            LogId::scope(log_id.clone(), async move {
                let mut res = fut.await?;
                match HeaderValue::from_str(log_id.as_str()) {
                    Ok(value) => {
                        res.headers_mut()
                            .insert(HeaderName::from_static(LOG_ID_HEADER), value);
                    }
                    Err(error) => {
                        error!(%error, log_id = %log_id, "failed to encode log id header");
                    }
                }
                Ok(res)
            })
            .instrument(span),
        )
    }
}
