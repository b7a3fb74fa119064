//! In-process RPC dispatch.
//!
//! A domain service is exposed to inbound adapters through a local client
//! that implements the same driving port. Every client call runs the
//! standard interceptor chain `[traffic-log, validator, ctx-cache]` before
//! reaching the service and unwinds through it on the way back.

mod chain;
mod client;
mod interceptors;

pub use chain::{CallInfo, Interceptor, InterceptorChain, MethodInfo, Next, Reply};
pub use client::{LocalApiKeyClient, LocalAuthClient, LocalSpaceClient, LocalUserClient};
pub use interceptors::{ContextCacheInterceptor, TrafficLog, Validator};
