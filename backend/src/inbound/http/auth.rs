//! Workspace authorization handler.

use std::sync::Arc;

use actix_web::{HttpResponse, post, web};

use crate::domain::RequestContext;
use crate::domain::ports::MCheckPermissionRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::bind::{Bound, invoke_and_render};
use crate::inbound::http::state::HttpState;

/// Evaluate `(subject, action, objects)` tuples against one space.
///
/// ```text
/// POST /api/foundation/v1/auth/check_permission
/// {"space_id":"7","auths":[{"subject":{"subject_type":"User","id":"1"},
///   "action":"read","objects":[{"id":"7","entity_type":"Space"}]}]}
/// ```
#[post("/auth/check_permission")]
pub async fn check_permission(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<MCheckPermissionRequest>,
) -> ApiResult<HttpResponse> {
    let auth = Arc::clone(&state.auth);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        auth.m_check_permission(&ctx, &req).await
    })
    .await
}
