//! Request binding and handler invocation.
//!
//! [`Bound`] assembles a request value from the query string, the JSON body
//! and the matched path parameters, later sources overriding earlier ones.
//! [`invoke`] runs a handler body with panic recovery so a panicking handler
//! answers with an internal error rather than tearing down the worker.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::ops::Deref;
use std::panic::AssertUnwindSafe;

use actix_web::dev::Payload;
use actix_web::web::{Bytes, Query};
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::error;

use crate::domain::{Error, RequestContext};

use super::ApiResult;

/// Request value bound from query, body and path.
#[derive(Debug, Clone)]
pub struct Bound<T>(pub T);

impl<T> Bound<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Bound<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

fn merge_sources(req: &HttpRequest, body: &[u8]) -> Result<Map<String, Value>, Error> {
    let mut merged = Map::new();
    let query = Query::<HashMap<String, String>>::from_query(req.query_string())
        .map_err(|err| Error::bad_request(format!("query: {err}")))?;
    for (key, value) in query.into_inner() {
        merged.insert(key, Value::String(value));
    }
    if !body.iter().all(u8::is_ascii_whitespace) {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => merged.extend(fields),
            Ok(_) => return Err(Error::bad_request("body must be a JSON object")),
            Err(err) => return Err(Error::bad_request(format!("body: {err}"))),
        }
    }
    for (key, value) in req.match_info().iter() {
        merged.insert(key.to_owned(), Value::String(value.to_owned()));
    }
    Ok(merged)
}

/// Bind `T` from the parts of `req`.
///
/// # Errors
///
/// Returns a bad-request error when a source is malformed or the merged
/// fields do not decode into `T`.
pub fn bind<T: DeserializeOwned>(req: &HttpRequest, body: &[u8]) -> Result<T, Error> {
    let merged = merge_sources(req, body)?;
    serde_json::from_value(Value::Object(merged))
        .map_err(|err| Error::bad_request(format!("bind request: {err}")))
}

impl<T> FromRequest for Bound<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let body = Bytes::from_request(&req, payload);
        Box::pin(async move {
            let body = body
                .await
                .map_err(|err| Error::bad_request(format!("read body: {err}")))?;
            bind(&req, &body).map(Bound)
        })
    }
}

impl FromRequest for RequestContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::detached);
        ready(Ok(ctx))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Run `handler` on the bound request, converting a panic into an internal
/// error.
///
/// # Errors
///
/// Returns the handler's error, or an internal error when it panicked.
pub async fn invoke<Req, Resp, F, Fut>(ctx: RequestContext, req: Req, handler: F) -> ApiResult<Resp>
where
    F: FnOnce(RequestContext, Req) -> Fut,
    Fut: Future<Output = Result<Resp, Error>>,
{
    match AssertUnwindSafe(handler(ctx, req)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic = message, "handler panicked");
            Err(Error::internal(format!("handler panicked: {message}")))
        }
    }
}

/// [`invoke`] and render the success value as a JSON body.
///
/// # Errors
///
/// Returns the handler's error for the envelope to render.
pub async fn invoke_and_render<Req, Resp, F, Fut>(
    ctx: RequestContext,
    req: Req,
    handler: F,
) -> ApiResult<HttpResponse>
where
    F: FnOnce(RequestContext, Req) -> Fut,
    Fut: Future<Output = Result<Resp, Error>>,
    Resp: Serialize,
{
    let resp = invoke(ctx, req, handler).await?;
    Ok(HttpResponse::Ok().json(resp))
}
