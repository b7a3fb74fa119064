//! Access log emitted once per request after the envelope is final.
//!
//! The level follows the outcome: server errors and non-zero envelope codes
//! log at `error`, client errors at `warn`, everything else at `debug`.
//! Only the first [`MAX_LOGGED_BODY`] bytes of a JSON request body are read
//! ahead for the log; the rest of the stream reaches the handler untouched.
//! Other request content types and event-stream responses are never buffered.

use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_http::BoxedPayloadStream;
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::PayloadError;
use actix_web::web::{Bytes, BytesMut};
use actix_web::{Error, HttpMessage};
use futures_util::future::{self, LocalBoxFuture, Ready, ready};
use futures_util::{StreamExt as _, stream};
use tracing::{debug, error, warn};

use super::body::{buffer_json, envelope_code};

/// Middleware factory for [`AccessLogMiddleware`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Service wrapper produced by [`AccessLog`].
pub struct AccessLogMiddleware<S> {
    service: Rc<S>,
}

struct RequestLine {
    method: String,
    path: String,
    query: String,
    client_ip: String,
}

impl RequestLine {
    fn of(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.path().to_owned(),
            query: req.query_string().to_owned(),
            client_ip: req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("-")
                .to_owned(),
        }
    }
}

/// Longest request body prefix copied into the access log.
pub const MAX_LOGGED_BODY: usize = 4 * 1024;

/// Request body prefix kept for the log line.
#[derive(Debug, Default, PartialEq, Eq)]
struct LoggedBody {
    bytes: Bytes,
    truncated: bool,
}

fn is_json(req: &ServiceRequest) -> bool {
    let content_type = req.content_type();
    content_type.eq_ignore_ascii_case("application/json")
        || content_type.to_ascii_lowercase().ends_with("+json")
}

/// Read at most one chunk past [`MAX_LOGGED_BODY`], then hand the handler the
/// bytes already read followed by the unread remainder of the stream.
async fn capture_request_body(req: &mut ServiceRequest) -> Result<LoggedBody, Error> {
    if !is_json(req) {
        return Ok(LoggedBody::default());
    }
    let mut payload = req.take_payload();
    let mut head = BytesMut::new();
    while head.len() <= MAX_LOGGED_BODY {
        let Some(chunk) = payload.next().await else {
            break;
        };
        head.extend_from_slice(&chunk?);
    }
    let head = head.freeze();
    let truncated = head.len() > MAX_LOGGED_BODY;
    let logged = head.slice(..head.len().min(MAX_LOGGED_BODY));

    let replay: BoxedPayloadStream =
        Box::pin(stream::once(future::ready(Ok::<_, PayloadError>(head))).chain(payload));
    req.set_payload(Payload::from(replay));
    Ok(LoggedBody {
        bytes: logged,
        truncated,
    })
}

fn lossy(bytes: Option<&Bytes>) -> String {
    bytes.map_or_else(String::new, |bytes| String::from_utf8_lossy(bytes).into_owned())
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let started = Instant::now();
            let line = RequestLine::of(&req);
            let request_body = capture_request_body(&mut req).await?;

            let res = service.call(req).await?;
            let (res, response_body) = buffer_json(res).await?;

            let status = res.status();
            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let code = response_body.as_deref().map_or(0, envelope_code);
            let truncated = request_body.truncated;
            let request_body = lossy(Some(&request_body.bytes));
            let response_body = lossy(response_body.as_ref());
            let RequestLine {
                method,
                path,
                query,
                client_ip,
            } = line;

            if status.is_server_error() || code != 0 {
                error!(
                    status = status.as_u16(),
                    code,
                    latency_ms,
                    %client_ip,
                    %method,
                    %path,
                    %request_body,
                    truncated,
                    %response_body,
                    "request failed"
                );
            } else if status.is_client_error() {
                warn!(
                    status = status.as_u16(),
                    latency_ms,
                    %client_ip,
                    %method,
                    %path,
                    %request_body,
                    truncated,
                    %response_body,
                    "request rejected"
                );
            } else {
                debug!(
                    status = status.as_u16(),
                    latency_ms,
                    %client_ip,
                    %method,
                    %path,
                    %query,
                    %request_body,
                    truncated,
                    %response_body,
                    "request served"
                );
            }
            Ok(res)
        })
    }
}
