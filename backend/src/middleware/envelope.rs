//! Response envelope adapter.
//!
//! Every JSON response leaves the service as an object carrying `code` and
//! `msg`. Errors raised anywhere inside the wrapped services, including the
//! identity gates, are rendered as `200 OK` with `{code, msg}` and the
//! message translated for the request locale.
//!
//! Successful JSON bodies are rewritten as follows:
//! - a body that already has a top-level `code` is left as is;
//! - a `BaseResp` block reporting success is stripped and `code: 0` added;
//! - a `BaseResp` block reporting failure replaces the whole body;
//! - any other object gains `code: 0, msg: ""`.
//!
//! Event streams and non-object JSON pass through untouched.

use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::web::Bytes;
use actix_web::{Error as ActixError, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::domain::ports::Translator;
use crate::domain::{
    BASE_RESP_KEY, BaseResp, COMMON_INTERNAL_ERROR, Error, Locale, RequestContext,
    UNKNOWN_ERROR_MESSAGE,
};

use super::body::buffer_json;

/// Middleware factory for [`EnvelopeMiddleware`].
#[derive(Clone)]
pub struct Envelope {
    translator: Arc<dyn Translator>,
}

impl Envelope {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Envelope
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = ActixError;
    type InitError = ();
    type Transform = EnvelopeMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(EnvelopeMiddleware {
            service,
            translator: Arc::clone(&self.translator),
        }))
    }
}

/// Service wrapper produced by [`Envelope`].
pub struct EnvelopeMiddleware<S> {
    service: S,
    translator: Arc<dyn Translator>,
}

fn request_locale(req: &HttpRequest) -> Locale {
    req.extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.locale().clone())
        .unwrap_or_default()
}

fn localize(translator: &dyn Translator, code: i32, message: &str, locale: &Locale) -> String {
    translator
        .translate(&code.to_string(), locale)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| message.to_owned())
}

fn error_body(code: i32, msg: String) -> Value {
    let mut body = Map::new();
    body.insert("code".to_owned(), Value::from(code));
    body.insert("msg".to_owned(), Value::String(msg));
    Value::Object(body)
}

fn render_error(
    req: HttpRequest,
    err: &ActixError,
    translator: &dyn Translator,
) -> ServiceResponse<BoxBody> {
    let (code, message) = err.as_error::<Error>().map_or_else(
        || {
            error!(error = %err, "uncoded error reached the envelope");
            (COMMON_INTERNAL_ERROR, UNKNOWN_ERROR_MESSAGE.to_owned())
        },
        |coded| (coded.code(), coded.message().to_owned()),
    );
    let msg = localize(translator, code, &message, &request_locale(&req));
    let res = HttpResponse::Ok().json(error_body(code, msg));
    ServiceResponse::new(req, res)
}

/// Rewrite a successful JSON body; `None` leaves it untouched.
fn wrap_success(
    body: &[u8],
    translator: &dyn Translator,
    locale: &Locale,
) -> Option<Value> {
    let Ok(Value::Object(mut object)) = serde_json::from_slice::<Value>(body) else {
        return None;
    };
    if object.contains_key("code") {
        return None;
    }
    let base_resp = object.remove(BASE_RESP_KEY).and_then(|block| {
        serde_json::from_value::<BaseResp>(block)
            .inspect_err(|err| warn!(error = %err, "dropping unreadable BaseResp block"))
            .ok()
    });
    if let Some(block) = base_resp.filter(|block| !block.is_success()) {
        let msg = localize(translator, block.status_code, &block.status_message, locale);
        return Some(error_body(block.status_code, msg));
    }
    object.insert("code".to_owned(), Value::from(0));
    object.insert("msg".to_owned(), Value::String(String::new()));
    Some(Value::Object(object))
}

impl<S, B> Service<ServiceRequest> for EnvelopeMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let http_req = req.request().clone();
        let translator = Arc::clone(&self.translator);
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = match fut.await {
                Ok(res) => res,
                Err(err) => return Ok(render_error(http_req, &err, translator.as_ref())),
            };
            if let Some(err) = res.response().error() {
                return Ok(render_error(res.request().clone(), err, translator.as_ref()));
            }
            let (res, body) = buffer_json(res).await?;
            let Some(body) = body else {
                return Ok(res);
            };
            let locale = request_locale(res.request());
            let Some(wrapped) = wrap_success(&body, translator.as_ref(), &locale) else {
                return Ok(res);
            };
            let encoded = serde_json::to_vec(&wrapped)
                .map(Bytes::from)
                .map_err(actix_web::error::ErrorInternalServerError)?;
            Ok(res.map_body(|_, _| BoxBody::new(encoded)))
        })
    }
}
