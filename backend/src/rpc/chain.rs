//! Interceptor chain and the call envelope it threads.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::domain::{Error, RequestContext, Validate};

use super::interceptors::{ContextCacheInterceptor, TrafficLog, Validator};

/// Type-erased service reply travelling back through the chain.
pub type Reply = Box<dyn Any + Send>;

type Endpoint<'a> =
    Box<dyn FnOnce(RequestContext) -> BoxFuture<'a, Result<Reply, Error>> + Send + 'a>;

/// Service and method names of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInfo {
    pub service: &'static str,
    pub method: &'static str,
}

impl MethodInfo {
    /// Name a method.
    #[must_use]
    pub const fn new(service: &'static str, method: &'static str) -> Self {
        Self { service, method }
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.method)
    }
}

/// What an interceptor sees of a call.
#[derive(Clone, Copy)]
pub struct CallInfo<'a> {
    pub method: MethodInfo,
    pub request: &'a (dyn Validate + Sync),
}

/// One stage wrapped around a service call.
///
/// Implementations either short-circuit with an error or pass the (possibly
/// adjusted) context on through [`Next::run`].
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Handle one call.
    async fn intercept<'a>(
        &'a self,
        ctx: RequestContext,
        call: CallInfo<'a>,
        next: Next<'a>,
    ) -> Result<Reply, Error>;
}

/// Remainder of the chain after the current interceptor.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Interceptor>],
    endpoint: Endpoint<'a>,
}

impl<'a> Next<'a> {
    /// Continue with the next interceptor, or the service when none is left.
    pub fn run(
        self,
        ctx: RequestContext,
        call: CallInfo<'a>,
    ) -> BoxFuture<'a, Result<Reply, Error>> {
        match self.remaining.split_first() {
            Some((first, rest)) => first.intercept(
                ctx,
                call,
                Next {
                    remaining: rest,
                    endpoint: self.endpoint,
                },
            ),
            None => (self.endpoint)(ctx),
        }
    }
}

/// Ordered interceptors shared by the local clients.
#[derive(Clone)]
pub struct InterceptorChain {
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl InterceptorChain {
    /// Chain running `interceptors` in order.
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            interceptors: interceptors.into(),
        }
    }

    /// The `[traffic-log, validator, ctx-cache]` chain.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(TrafficLog),
            Arc::new(Validator),
            Arc::new(ContextCacheInterceptor),
        ])
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain calls the handler directly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run `req` through the chain into `handler`.
    ///
    /// The handler receives the context as left by the last interceptor.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an interceptor or the handler, or an
    /// internal error when the reply is not a `Resp`.
    pub async fn invoke<'a, Req, Resp, F, Fut>(
        &'a self,
        ctx: &RequestContext,
        method: MethodInfo,
        req: &'a Req,
        handler: F,
    ) -> Result<Resp, Error>
    where
        Req: Validate + Sync,
        Resp: Send + 'static,
        F: FnOnce(RequestContext) -> Fut + Send + 'a,
        Fut: Future<Output = Result<Resp, Error>> + Send + 'a,
    {
        let endpoint: Endpoint<'a> = Box::new(move |ctx| {
            Box::pin(async move { handler(ctx).await.map(|resp| Box::new(resp) as Reply) })
        });
        let next = Next {
            remaining: &self.interceptors,
            endpoint,
        };
        let reply = next
            .run(ctx.clone(), CallInfo {
                method,
                request: req,
            })
            .await?;
        reply
            .downcast::<Resp>()
            .map(|resp| *resp)
            .map_err(|_| Error::internal(format!("{method} produced an unexpected reply type")))
    }
}
