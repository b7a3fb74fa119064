//! Identity gates attaching the caller to the request context.
//!
//! [`IdentityGate`] is generic over an [`Authenticator`] that knows where the
//! credential lives and how to turn it into an [`AuthenticatedUser`]. Two
//! authenticators are provided: [`SessionAuthenticator`] reads the
//! `session_key` cookie and [`AccessTokenAuthenticator`] reads a bearer
//! personal access token. A rejected request never reaches the wrapped
//! service; the coded error is rendered by the envelope adapter.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::Error as ActixError;
use async_trait::async_trait;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

use crate::domain::ports::{
    ApiKeyService, GetUserInfoRequest, UserService, VerifyTokenRequest,
};
use crate::domain::{
    AuthenticatedUser, COMMON_RESOURCE_NOT_FOUND, Error, RequestContext, SESSION_COOKIE,
    SessionCodec, UserId, WireError,
};

use super::{current_context, update_context};

/// Paths reachable without a session.
pub const PUBLIC_PATHS: [&str; 3] = [
    "/api/foundation/v1/users/login_by_password",
    "/api/foundation/v1/users/register",
    "/api/foundation/v1/users/reset_password",
];

/// Turns a request credential into an authenticated caller.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Credential carried by the request, if any.
    fn credential(&self, req: &ServiceRequest) -> Option<String>;

    /// Whether `path` bypasses this gate.
    fn is_public(&self, _path: &str) -> bool {
        false
    }

    /// Resolve the caller behind `credential`.
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        credential: &str,
    ) -> Result<AuthenticatedUser, Error>;
}

async fn resolve_user(
    users: &dyn UserService,
    ctx: &RequestContext,
    user_id: UserId,
) -> Result<AuthenticatedUser, Error> {
    let info = users
        .get_user_info(ctx, &GetUserInfoRequest { user_id })
        .await
        .map_err(|err| {
            if err.code() == COMMON_RESOURCE_NOT_FOUND {
                Error::no_permission("account no longer exists")
            } else {
                err
            }
        })?
        .user_info;
    let name = if info.name.is_empty() {
        info.nick_name
    } else {
        info.name
    };
    Ok(AuthenticatedUser {
        id: info.user_id,
        name,
        email: info.email,
        app_id: None,
    })
}

/// Cookie session authenticator.
pub struct SessionAuthenticator {
    sessions: Arc<SessionCodec>,
    users: Arc<dyn UserService>,
}

impl SessionAuthenticator {
    pub fn new(sessions: Arc<SessionCodec>, users: Arc<dyn UserService>) -> Self {
        Self { sessions, users }
    }
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    fn credential(&self, req: &ServiceRequest) -> Option<String> {
        req.cookie(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn is_public(&self, path: &str) -> bool {
        PUBLIC_PATHS.contains(&path)
    }

    async fn authenticate(
        &self,
        ctx: &RequestContext,
        credential: &str,
    ) -> Result<AuthenticatedUser, Error> {
        let session = self
            .sessions
            .validate_session(credential)
            .and_then(|session| session.user_id())
            .map_err(|err| Error::no_permission(format!("session rejected: {err}")))?;
        resolve_user(self.users.as_ref(), ctx, session).await
    }
}

/// Bearer personal access token authenticator.
pub struct AccessTokenAuthenticator {
    api_keys: Arc<dyn ApiKeyService>,
    users: Arc<dyn UserService>,
}

impl AccessTokenAuthenticator {
    pub fn new(api_keys: Arc<dyn ApiKeyService>, users: Arc<dyn UserService>) -> Self {
        Self { api_keys, users }
    }
}

/// Token from an `Authorization` value; the `Bearer` scheme is optional.
fn bearer_token(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = value
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map_or(value, |(_, token)| token.trim());
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl Authenticator for AccessTokenAuthenticator {
    fn credential(&self, req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_owned)
    }

    async fn authenticate(
        &self,
        ctx: &RequestContext,
        credential: &str,
    ) -> Result<AuthenticatedUser, Error> {
        let verdict = self
            .api_keys
            .verify_token(
                ctx,
                &VerifyTokenRequest {
                    token: credential.to_owned(),
                },
            )
            .await?;
        match (verdict.valid, verdict.user_id) {
            (true, Some(user_id)) => resolve_user(self.users.as_ref(), ctx, user_id).await,
            _ => Err(verdict.base_resp.map_or_else(
                || Error::no_permission("access token rejected"),
                |block| {
                    Error::from_wire(WireError {
                        code: block.status_code,
                        message: block.status_message,
                        extra: block.extra,
                    })
                },
            )),
        }
    }
}

/// Middleware factory gating requests behind an [`Authenticator`].
pub struct IdentityGate<A> {
    authenticator: Arc<A>,
}

impl<A> IdentityGate<A> {
    pub fn new(authenticator: A) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
        }
    }
}

impl<A> Clone for IdentityGate<A> {
    fn clone(&self) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

impl<S, B, A> Transform<S, ServiceRequest> for IdentityGate<A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
    A: Authenticator,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type InitError = ();
    type Transform = IdentityGateMiddleware<S, A>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityGateMiddleware {
            service: Rc::new(service),
            authenticator: Arc::clone(&self.authenticator),
        }))
    }
}

/// Service wrapper produced by [`IdentityGate`].
pub struct IdentityGateMiddleware<S, A> {
    service: Rc<S>,
    authenticator: Arc<A>,
}

impl<S, B, A> Service<ServiceRequest> for IdentityGateMiddleware<S, A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
    A: Authenticator,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let authenticator = Arc::clone(&self.authenticator);
        Box::pin(async move {
            if authenticator.is_public(req.path()) {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            }
            let Some(credential) = authenticator.credential(&req) else {
                debug!(path = req.path(), "request carries no credential");
                let err = Error::no_permission("missing credential");
                return Ok(req.error_response(err).map_into_right_body());
            };
            let ctx = current_context(&req);
            match authenticator.authenticate(&ctx, &credential).await {
                Ok(user) => {
                    update_context(&req, |ctx| ctx.set_user(user));
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    debug!(code = err.code(), path = req.path(), "credential rejected");
                    Ok(req.error_response(err).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
