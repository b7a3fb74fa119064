//! Request validation and port error behaviour.

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::{SpaceId, Validate};

fn register(email: &str, password: &str, name: Option<&str>) -> RegisterRequest {
    RegisterRequest {
        email: email.to_owned(),
        password: password.to_owned(),
        name: name.map(str::to_owned),
        nick_name: None,
    }
}

#[rstest]
#[case(register("a@x.com", "p1", None), true)]
#[case(register("a@x.com", "p1", Some("")), true)]
#[case(register("a@x.com", "p1", Some("ada_1")), true)]
#[case(register("a@x.com", "p1", Some("no spaces")), false)]
#[case(register("not-an-email", "p1", None), false)]
#[case(register("a@x.com", "", None), false)]
fn register_request_validation(#[case] request: RegisterRequest, #[case] ok: bool) {
    assert_eq!(request.validate().is_ok(), ok);
}

#[rstest]
fn register_request_debug_redacts_password() {
    let rendered = format!("{:?}", register("a@x.com", "hunter2", None));
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("<redacted>"));
}

#[rstest]
#[case(json!({"name": "ci", "duration_day": "1"}), true)]
#[case(json!({"name": "ci", "duration_day": "permanent"}), true)]
#[case(json!({"name": "ci", "expire_at": "1900000000"}), true)]
#[case(json!({"name": "ci", "expire_at": 1_900_000_000}), true)]
#[case(json!({"name": "ci"}), false)]
#[case(json!({"name": " ", "duration_day": "1"}), false)]
#[case(json!({"name": "ci", "duration_day": "-3"}), false)]
fn create_api_key_validation(#[case] body: serde_json::Value, #[case] ok: bool) {
    let request: CreateApiKeyRequest = serde_json::from_value(body).expect("decode request");
    assert_eq!(request.validate().is_ok(), ok);
}

#[rstest]
#[case(json!({}), true)]
#[case(json!({"page_number": "2", "page_size": 5}), true)]
#[case(json!({"page_number": 0}), false)]
fn list_requests_validate_paging(#[case] body: serde_json::Value, #[case] ok: bool) {
    let keys: ListApiKeysRequest = serde_json::from_value(body.clone()).expect("decode keys");
    let spaces: ListUserSpacesRequest = serde_json::from_value(body).expect("decode spaces");
    assert_eq!(keys.validate().is_ok(), ok);
    assert_eq!(spaces.validate().is_ok(), ok);
}

#[rstest]
fn mget_rejects_empty_and_oversized_batches() {
    let empty = MGetUserInfoRequest { user_ids: vec![] };
    assert!(empty.validate().is_err());
    let huge = MGetUserInfoRequest {
        user_ids: (0..=i64::try_from(MGET_USERS_MAX).expect("small")).collect(),
    };
    assert!(huge.validate().is_err());
}

#[rstest]
fn modify_profile_requires_a_field() {
    assert!(ModifyUserProfileRequest::default().validate().is_err());
    let request = ModifyUserProfileRequest {
        nick_name: Some("Ada".to_owned()),
        ..ModifyUserProfileRequest::default()
    };
    assert!(request.validate().is_ok());
}

#[rstest]
fn auth_object_resolves_owning_space() {
    assert_eq!(AuthObject::space(SpaceId::new(4)).owning_space(), Some(SpaceId::new(4)));
    let prompt = AuthObject {
        id: "77".to_owned(),
        entity_type: "Prompt".to_owned(),
        space_id: Some(9),
    };
    assert_eq!(prompt.owning_space(), Some(SpaceId::new(9)));
}

#[rstest]
fn verify_response_omits_absent_fields() {
    let value = serde_json::to_value(VerifyTokenResponse::accepted(crate::domain::UserId::new(5)))
        .expect("encode");
    assert_eq!(value, json!({"valid": true, "user_id": "5"}));
}

#[rstest]
fn port_errors_render_messages() {
    assert_eq!(
        UserRepositoryError::connection("refused").to_string(),
        "user repository connection failed: refused"
    );
    assert_eq!(
        UserRepositoryError::duplicate_email().to_string(),
        "email already registered"
    );
    assert_eq!(
        ApiKeyRepositoryError::query("timeout").to_string(),
        "api key repository query failed: timeout"
    );
}
