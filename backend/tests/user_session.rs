//! Account lifecycle over the assembled HTTP pipeline.

mod support;

use actix_web::cookie::Cookie;
use actix_web::test::{self, TestRequest};
use foundation::domain::{
    COMMON_INVALID_PARAM, COMMON_NO_PERMISSION, LOCALE_COOKIE, SESSION_COOKIE,
    USER_EMAIL_EXIST, USER_PASSWORD_WRONG, USER_REGISTRATION_BLOCKED, USER_UNIQUE_NAME_EXIST,
};
use foundation::middleware::LOG_ID_HEADER;
use foundation::server::build_app;
use foundation::test_support::TestServices;
use rstest::rstest;
use serde_json::json;
use support::{API, PASSWORD, register, send, signed_in};

#[actix_web::test]
async fn registration_issues_a_session_and_a_personal_space() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;

    let reply = register(&app, "a@x.com").await;
    let body = reply.json();
    assert!(reply.status.is_success());
    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "");
    assert_eq!(body["user_info"]["email"], "a@x.com");
    assert_eq!(body["expire_time"], "604800000000000");
    let cookie = reply.session_cookie().expect("session cookie");
    assert_eq!(cookie.value(), body["token"].as_str().expect("token"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));

    let spaces = send(
        &app,
        TestRequest::get().uri(&format!("{API}/spaces")).cookie(cookie),
    )
    .await
    .json();
    assert_eq!(spaces["total"], "1");
    assert_eq!(spaces["spaces"][0]["space_type"], "personal");
}

#[actix_web::test]
async fn duplicate_email_is_reported_in_the_envelope() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;

    assert_eq!(register(&app, "a@x.com").await.code(), 0);
    let again = register(&app, "A@X.com").await;
    assert!(again.status.is_success());
    assert_eq!(again.code(), i64::from(USER_EMAIL_EXIST));
    assert!(again.session_cookie().is_none());
}

#[actix_web::test]
async fn session_cookie_resolves_the_caller() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;
    let cookie = signed_in(&app, "me@example.com").await;

    let reply = send(
        &app,
        TestRequest::get().uri(&format!("{API}/users/me")).cookie(cookie),
    )
    .await;
    assert!(reply.headers.contains_key(LOG_ID_HEADER));
    let body = reply.json();
    assert_eq!(body["code"], 0);
    assert_eq!(body["user_info"]["email"], "me@example.com");
}

#[rstest]
#[case("/users/me")]
#[case("/spaces")]
#[case("/api_keys")]
#[actix_web::test]
async fn private_routes_reject_requests_without_a_session(#[case] route: &str) {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;

    let reply = send(&app, TestRequest::get().uri(&format!("{API}{route}"))).await;
    assert!(reply.status.is_success());
    assert_eq!(reply.code(), i64::from(COMMON_NO_PERMISSION));
    assert!(reply.headers.contains_key(LOG_ID_HEADER));
}

#[rstest]
#[case(None, "Incorrect email or password")]
#[case(Some("zh-CN"), "邮箱或密码错误")]
#[actix_web::test]
async fn wrong_password_is_localized(#[case] locale: Option<&str>, #[case] expected: &str) {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;
    signed_in(&app, "login@example.com").await;

    let mut req = TestRequest::post()
        .uri(&format!("{API}/users/login_by_password"))
        .set_json(json!({ "email": "login@example.com", "password": "wrong-password" }));
    if let Some(locale) = locale {
        req = req.cookie(Cookie::new(LOCALE_COOKIE, locale));
    }
    let reply = send(&app, req).await;
    let body = reply.json();
    assert_eq!(body["code"], USER_PASSWORD_WRONG);
    assert_eq!(body["msg"], expected);
}

#[actix_web::test]
async fn unknown_email_and_wrong_password_are_indistinguishable() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;
    signed_in(&app, "known@example.com").await;

    let login = |email: &str| {
        TestRequest::post()
            .uri(&format!("{API}/users/login_by_password"))
            .set_json(json!({ "email": email, "password": "nope-nope" }))
    };
    let unknown = send(&app, login("ghost@example.com")).await.json();
    let wrong = send(&app, login("known@example.com")).await.json();
    assert_eq!(unknown, wrong);
}

#[actix_web::test]
async fn login_then_logout_round_trip() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;
    signed_in(&app, "cycle@example.com").await;

    let login = send(
        &app,
        TestRequest::post()
            .uri(&format!("{API}/users/login_by_password"))
            .set_json(json!({ "email": "cycle@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(login.code(), 0);
    let cookie = login.session_cookie().expect("session cookie");

    let logout = send(
        &app,
        TestRequest::post()
            .uri(&format!("{API}/users/logout"))
            .cookie(cookie),
    )
    .await;
    assert_eq!(logout.code(), 0);
    let removal = logout.session_cookie().expect("removal cookie");
    assert_eq!(removal.name(), SESSION_COOKIE);
    assert_eq!(removal.value(), "");
}

#[actix_web::test]
async fn reset_password_requires_the_current_password() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;
    signed_in(&app, "reset@example.com").await;

    let reset = |old: &str| {
        TestRequest::post()
            .uri(&format!("{API}/users/reset_password"))
            .set_json(json!({
                "email": "reset@example.com",
                "old_password": old,
                "password": "brand-new-secret",
            }))
    };
    assert_eq!(
        send(&app, reset("not-the-password")).await.code(),
        i64::from(USER_PASSWORD_WRONG)
    );
    assert_eq!(send(&app, reset(PASSWORD)).await.code(), 0);

    let relogin = send(
        &app,
        TestRequest::post()
            .uri(&format!("{API}/users/login_by_password"))
            .set_json(json!({ "email": "reset@example.com", "password": "brand-new-secret" })),
    )
    .await;
    assert_eq!(relogin.code(), 0);
}

#[actix_web::test]
async fn closed_registration_is_blocked() {
    let services = TestServices::with_registration(false);
    let app = test::init_service(build_app(services.deps.clone())).await;

    let reply = register(&app, "late@example.com").await;
    assert_eq!(reply.code(), i64::from(USER_REGISTRATION_BLOCKED));
}

#[actix_web::test]
async fn malformed_registration_is_an_invalid_param() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;

    let reply = send(
        &app,
        TestRequest::post()
            .uri(&format!("{API}/users/register"))
            .set_json(json!({ "email": "not-an-email", "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.code(), i64::from(COMMON_INVALID_PARAM));
}

#[actix_web::test]
async fn profile_updates_enforce_unique_names() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;
    let first = signed_in(&app, "first@example.com").await;
    let second = signed_in(&app, "second@example.com").await;

    let rename = |cookie: Cookie<'static>, name: &str| {
        TestRequest::put()
            .uri(&format!("{API}/users/profile"))
            .cookie(cookie)
            .set_json(json!({ "name": name, "description": "hello" }))
    };
    let renamed = send(&app, rename(first, "taken_name")).await.json();
    assert_eq!(renamed["code"], 0);
    assert_eq!(renamed["user_info"]["name"], "taken_name");
    assert_eq!(renamed["user_info"]["description"], "hello");

    let clash = send(&app, rename(second, "taken_name")).await;
    assert_eq!(clash.code(), i64::from(USER_UNIQUE_NAME_EXIST));
}

#[actix_web::test]
async fn profiles_are_readable_by_id_and_in_batches() {
    let services = TestServices::new();
    let app = test::init_service(build_app(services.deps.clone())).await;
    let viewer = signed_in(&app, "viewer@example.com").await;
    let other = register(&app, "other@example.com").await.json();
    let other_id = other["user_info"]["user_id"]
        .as_str()
        .expect("ids travel as strings")
        .to_owned();

    let single = send(
        &app,
        TestRequest::get()
            .uri(&format!("{API}/users/{other_id}"))
            .cookie(viewer.clone()),
    )
    .await
    .json();
    assert_eq!(single["user_info"]["email"], "other@example.com");

    let batch = send(
        &app,
        TestRequest::post()
            .uri(&format!("{API}/users/mget"))
            .cookie(viewer)
            .set_json(json!({ "user_ids": [other_id, "424242"] })),
    )
    .await
    .json();
    assert_eq!(batch["user_infos"].as_array().map(Vec::len), Some(1));
}
