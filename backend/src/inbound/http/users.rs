//! Account API handlers.
//!
//! ```text
//! POST /api/foundation/v1/users/register {"email":"a@b.co","password":"secret1"}
//! POST /api/foundation/v1/users/login_by_password {"email":"a@b.co","password":"secret1"}
//! GET  /api/foundation/v1/users/me
//! ```
//!
//! Registration and sign-in set the `session_key` cookie; sign-out clears it.

use std::sync::Arc;

use actix_web::{HttpResponse, get, post, put, web};

use crate::domain::RequestContext;
use crate::domain::ports::{
    GetUserInfoRequest, LoginByPasswordRequest, LogoutRequest, MGetUserInfoRequest,
    ModifyUserProfileRequest, RegisterRequest, ResetPasswordRequest, UserSessionResponse,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bind::{Bound, invoke, invoke_and_render};
use crate::inbound::http::state::HttpState;

fn with_session(state: &HttpState, resp: &UserSessionResponse) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(state.cookies.issue(&resp.token))
        .json(resp)
}

/// Create an account and its personal space, then sign in.
#[post("/users/register")]
pub async fn register(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let users = Arc::clone(&state.users);
    let resp = invoke(ctx, req.into_inner(), move |ctx, req| async move {
        users.register(&ctx, &req).await
    })
    .await?;
    Ok(with_session(&state, &resp))
}

/// Sign in with email and password.
#[post("/users/login_by_password")]
pub async fn login_by_password(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<LoginByPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let users = Arc::clone(&state.users);
    let resp = invoke(ctx, req.into_inner(), move |ctx, req| async move {
        users.login_by_password(&ctx, &req).await
    })
    .await?;
    Ok(with_session(&state, &resp))
}

/// Sign out the caller and drop the session cookie.
#[post("/users/logout")]
pub async fn logout(state: web::Data<HttpState>, ctx: RequestContext) -> ApiResult<HttpResponse> {
    let users = Arc::clone(&state.users);
    let resp = invoke(ctx, LogoutRequest::default(), move |ctx, req| async move {
        users.logout(&ctx, &req).await
    })
    .await?;
    Ok(HttpResponse::Ok()
        .cookie(state.cookies.removal())
        .json(resp))
}

/// Change the password after proving the current one.
#[post("/users/reset_password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<ResetPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let users = Arc::clone(&state.users);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        users.reset_password(&ctx, &req).await
    })
    .await
}

/// Profile of the caller.
#[get("/users/me")]
pub async fn me(state: web::Data<HttpState>, ctx: RequestContext) -> ApiResult<HttpResponse> {
    let user_id = ctx.require_user_id()?;
    let users = Arc::clone(&state.users);
    invoke_and_render(ctx, GetUserInfoRequest { user_id }, move |ctx, req| async move {
        users.get_user_info(&ctx, &req).await
    })
    .await
}

/// Profile of any active user.
#[get("/users/{user_id}")]
pub async fn get_user_info(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<GetUserInfoRequest>,
) -> ApiResult<HttpResponse> {
    let users = Arc::clone(&state.users);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        users.get_user_info(&ctx, &req).await
    })
    .await
}

/// Profiles for a batch of ids.
#[post("/users/mget")]
pub async fn mget_user_info(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<MGetUserInfoRequest>,
) -> ApiResult<HttpResponse> {
    let users = Arc::clone(&state.users);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        users.mget_user_info(&ctx, &req).await
    })
    .await
}

/// Update the caller's profile.
#[put("/users/profile")]
pub async fn modify_user_profile(
    state: web::Data<HttpState>,
    ctx: RequestContext,
    req: Bound<ModifyUserProfileRequest>,
) -> ApiResult<HttpResponse> {
    let users = Arc::clone(&state.users);
    invoke_and_render(ctx, req.into_inner(), move |ctx, req| async move {
        users.modify_user_profile(&ctx, &req).await
    })
    .await
}
