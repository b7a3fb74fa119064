//! Personal access token handlers.
//!
//! ```text
//! POST   /api/foundation/v1/api_keys {"name":"ci","duration_day":"30"}
//! GET    /api/foundation/v1/api_keys?page_number=1&page_size=20
//! DELETE /api/foundation/v1/api_keys/{api_key_id}
//! ```

use std::sync::Arc;

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::RequestContext;
use crate::domain::ports::{
    ApiKeyByIdRequest, CreateApiKeyRequest, ListApiKeysRequest, UpdateApiKeyRequest,
    VerifyTokenRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bind::{Bound, invoke_and_render};
use crate::inbound::http::state::HttpState;

/// Mint a token; the plaintext is only returned here.
#[post("/api_keys")]
pub async fn create_api_key(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<CreateApiKeyRequest>,
) -> ApiResult<HttpResponse> {
    let api_keys = Arc::clone(&state.api_keys);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        api_keys.create_api_key(&ctx, &req).await
    })
    .await
}

#[get("/api_keys")]
pub async fn list_api_keys(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<ListApiKeysRequest>,
) -> ApiResult<HttpResponse> {
    let api_keys = Arc::clone(&state.api_keys);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        api_keys.list_api_keys(&ctx, &req).await
    })
    .await
}

/// Check a presented token.
#[post("/api_keys/verify")]
pub async fn verify_token(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<VerifyTokenRequest>,
) -> ApiResult<HttpResponse> {
    let api_keys = Arc::clone(&state.api_keys);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        api_keys.verify_token(&ctx, &req).await
    })
    .await
}

#[get("/api_keys/{api_key_id}")]
pub async fn get_api_key(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<ApiKeyByIdRequest>,
) -> ApiResult<HttpResponse> {
    let api_keys = Arc::clone(&state.api_keys);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        api_keys.get_api_key(&ctx, &req).await
    })
    .await
}

/// Rename a token.
#[put("/api_keys/{api_key_id}")]
pub async fn update_api_key(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<UpdateApiKeyRequest>,
) -> ApiResult<HttpResponse> {
    let api_keys = Arc::clone(&state.api_keys);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        api_keys.update_api_key(&ctx, &req).await
    })
    .await
}

/// Revoke a token.
#[delete("/api_keys/{api_key_id}")]
pub async fn delete_api_key(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<ApiKeyByIdRequest>,
) -> ApiResult<HttpResponse> {
    let api_keys = Arc::clone(&state.api_keys);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        api_keys.delete_api_key(&ctx, &req).await
    })
    .await
}
