//! The standard interceptors.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{Error, RequestContext};

use super::chain::{CallInfo, Interceptor, Next, Reply};

/// Logs every call with its latency and outcome code.
///
/// Request and reply payloads are never logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficLog;

#[async_trait]
impl Interceptor for TrafficLog {
    async fn intercept<'a>(
        &'a self,
        ctx: RequestContext,
        call: CallInfo<'a>,
        next: Next<'a>,
    ) -> Result<Reply, Error> {
        let log_id = ctx.log_id().clone();
        let started = Instant::now();
        let outcome = next.run(ctx, call).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            Ok(_) => debug!(
                service = call.method.service,
                method = call.method.method,
                latency_ms,
                code = 0,
                log_id = %log_id,
                "rpc call completed"
            ),
            Err(err) => warn!(
                service = call.method.service,
                method = call.method.method,
                latency_ms,
                code = err.code(),
                log_id = %log_id,
                error = %err,
                "rpc call failed"
            ),
        }
        outcome
    }
}

/// Rejects requests whose [`Validate`](crate::domain::Validate) check fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

#[async_trait]
impl Interceptor for Validator {
    async fn intercept<'a>(
        &'a self,
        ctx: RequestContext,
        call: CallInfo<'a>,
        next: Next<'a>,
    ) -> Result<Reply, Error> {
        if let Err(err) = call.request.validate() {
            return Err(Error::invalid_param(format!(
                "method={}, err={err}",
                call.method
            )));
        }
        next.run(ctx, call).await
    }
}

/// Installs a request cache unless the caller already carries one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextCacheInterceptor;

#[async_trait]
impl Interceptor for ContextCacheInterceptor {
    async fn intercept<'a>(
        &'a self,
        mut ctx: RequestContext,
        call: CallInfo<'a>,
        next: Next<'a>,
    ) -> Result<Reply, Error> {
        ctx.ensure_cache();
        next.run(ctx, call).await
    }
}
