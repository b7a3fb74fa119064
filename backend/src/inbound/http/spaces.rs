//! Space handlers, including the server-sent event listing.
//!
//! ```text
//! GET  /api/foundation/v1/spaces?page_number=1&page_size=20
//! POST /api/foundation/v1/spaces {"name":"Team"}
//! GET  /api/foundation/v1/spaces/stream
//! ```

use std::sync::Arc;

use actix_web::{HttpResponse, get, post, web};
use pagination::MAX_PAGE_SIZE;
use tracing::{Instrument, debug, info_span};

use crate::domain::ports::{
    CreateTeamSpaceRequest, GetSpaceRequest, ListUserSpacesRequest, SpaceService,
};
use crate::domain::{LogId, RequestContext};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bind::{Bound, invoke_and_render};
use crate::inbound::http::sse::{EventPublisher, event_stream};
use crate::inbound::http::state::HttpState;

/// Page of the caller's spaces.
#[get("/spaces")]
pub async fn list_user_spaces(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<ListUserSpacesRequest>,
) -> ApiResult<HttpResponse> {
    let spaces = Arc::clone(&state.spaces);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        spaces.list_user_spaces(&ctx, &req).await
    })
    .await
}

/// Create a team space owned by the caller.
#[post("/spaces")]
pub async fn create_team_space(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<CreateTeamSpaceRequest>,
) -> ApiResult<HttpResponse> {
    let spaces = Arc::clone(&state.spaces);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        spaces.create_team_space(&ctx, &req).await
    })
    .await
}

/// Stream every space of the caller as `data` frames.
///
/// A listing failure ends the stream with one `error` frame.
#[get("/spaces/stream")]
pub async fn stream_user_spaces(
    state: web::Data<HttpState>,
    ctx: RequestContext,
) -> ApiResult<HttpResponse> {
    ctx.require_user_id()?;
    let (publisher, response) = event_stream();
    let log_id = ctx.log_id().clone();
    let span = info_span!("space_stream", log_id = %log_id);
    actix_web::rt::spawn(
        LogId::scope(
            log_id,
            publish_user_spaces(Arc::clone(&state.spaces), ctx, publisher),
        )
        .instrument(span),
    );
    Ok(response)
}

/// Publish the caller's spaces page by page.
pub async fn publish_user_spaces(
    spaces: Arc<dyn SpaceService>,
    ctx: RequestContext,
    publisher: EventPublisher,
) {
    let page_size = i64::from(MAX_PAGE_SIZE);
    let mut page_number = 1_i64;
    let mut published = 0_i64;
    loop {
        let req = ListUserSpacesRequest {
            page_number: Some(page_number),
            page_size: Some(page_size),
        };
        let page = match spaces.list_user_spaces(&ctx, &req).await {
            Ok(page) => page,
            Err(err) => {
                publisher.publish_error(&err).await;
                return;
            }
        };
        for space in &page.spaces {
            if !publisher.publish_data(space).await {
                return;
            }
            published += 1;
        }
        if page.spaces.is_empty() || published >= page.total {
            debug!(published, "space stream complete");
            return;
        }
        page_number += 1;
    }
}

/// One space the caller may read.
#[get("/spaces/{space_id}")]
pub async fn get_space(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<GetSpaceRequest>,
) -> ApiResult<HttpResponse> {
    let spaces = Arc::clone(&state.spaces);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        spaces.get_space(&ctx, &req).await
    })
    .await
}
