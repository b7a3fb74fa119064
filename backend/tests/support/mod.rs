//! Shared helpers for the HTTP integration suites.
//!
//! Each suite builds the full application from
//! [`foundation::server::build_app`] over an in-memory store and drives it
//! with `actix_web::test`.

#![allow(dead_code, reason = "each suite uses a different subset of helpers")]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::HeaderMap;
use actix_web::test::{self, TestRequest};
use actix_web::web::Bytes;
use foundation::domain::SESSION_COOKIE;
use serde_json::{Value, json};

pub const API: &str = "/api/foundation/v1";
pub const OPEN_API: &str = "/open-api/foundation/v1";
pub const PASSWORD: &str = "correct-horse";

/// Buffered response.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub cookies: Vec<Cookie<'static>>,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn code(&self) -> i64 {
        self.json()["code"].as_i64().expect("envelope code")
    }

    pub fn session_cookie(&self) -> Option<Cookie<'static>> {
        self.cookies
            .iter()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .cloned()
    }
}

/// Send `req` and buffer the whole response.
pub async fn send<S, B>(app: &S, req: TestRequest) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let cookies = res
        .response()
        .cookies()
        .map(Cookie::into_owned)
        .collect();
    let body = test::read_body(res).await;
    Reply {
        status,
        headers,
        cookies,
        body,
    }
}

/// Register `email` and return the reply carrying the session cookie.
pub async fn register<S, B>(app: &S, email: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(
        app,
        TestRequest::post()
            .uri(&format!("{API}/users/register"))
            .set_json(json!({ "email": email, "password": PASSWORD })),
    )
    .await
}

/// Register `email` and return its session cookie.
pub async fn signed_in<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let reply = register(app, email).await;
    assert_eq!(reply.code(), 0, "registration failed: {:?}", reply.json());
    reply.session_cookie().expect("session cookie")
}
