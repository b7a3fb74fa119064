//! Route tables for the session-gated API and the token-gated open API.
//!
//! Literal segments are registered before the `{id}` routes that would
//! otherwise capture them.

use actix_web::web;

use super::{api_keys, auth, spaces, users};

/// Prefix of the session-gated API.
pub const API_PREFIX: &str = "/api/foundation/v1";
/// Prefix of the personal-access-token API.
pub const OPEN_API_PREFIX: &str = "/open-api/foundation/v1";

/// Register the session-gated handlers.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::register)
        .service(users::login_by_password)
        .service(users::logout)
        .service(users::reset_password)
        .service(users::me)
        .service(users::mget_user_info)
        .service(users::modify_user_profile)
        .service(users::get_user_info)
        .service(api_keys::create_api_key)
        .service(api_keys::list_api_keys)
        .service(api_keys::verify_token)
        .service(api_keys::get_api_key)
        .service(api_keys::update_api_key)
        .service(api_keys::delete_api_key)
        .service(spaces::list_user_spaces)
        .service(spaces::create_team_space)
        .service(spaces::stream_user_spaces)
        .service(spaces::get_space)
        .service(auth::check_permission);
}

/// Register the token-gated handlers.
pub fn configure_open_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::me);
}
