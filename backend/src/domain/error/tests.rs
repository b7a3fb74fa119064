//! Regression coverage for coded errors and the registry.

use std::collections::BTreeMap;

use rstest::rstest;

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("connection reset")]
struct TransportFailure;

#[rstest]
fn by_code_uses_registered_message_and_flag() {
    let err = Error::by_code(USER_EMAIL_EXIST);
    assert_eq!(err.code(), USER_EMAIL_EXIST);
    assert_eq!(err.message(), "Email already registered");
    assert!(!err.affects_stability());
}

#[rstest]
fn unregistered_code_falls_back_to_internal_message() {
    let err = Error::by_code(42);
    assert_eq!(err.code(), 42);
    assert_eq!(err.message(), UNKNOWN_ERROR_MESSAGE);
    assert!(err.affects_stability());
}

#[rstest]
fn extra_message_is_appended_with_comma() {
    let err = Error::by_code(COMMON_INVALID_PARAM).with_extra_msg("name too long");
    assert_eq!(err.message(), "Invalid parameter, name too long");
}

#[rstest]
fn params_replace_named_placeholders() {
    let registry = ErrorRegistry::builder()
        .register(7, "user {name} missing from {space}", false)
        .build();
    let (template, _) = registry.describe(7);
    let mut err = Error::by_code(COMMON_RESOURCE_NOT_FOUND);
    err.message = template;
    let err = err.with_param("name", "ada").with_param("space", "team");
    assert_eq!(err.message(), "user ada missing from team");
}

#[rstest]
fn register_is_an_upsert() {
    let registry = ErrorRegistry::builder()
        .register(9, "first", true)
        .register(9, "second", false)
        .set_default_error_code(9)
        .build();
    let def = registry.lookup(9).expect("registered");
    assert_eq!(def.message, "second");
    assert!(!def.affects_stability);
    assert_eq!(registry.default_code(), 9);
    assert_eq!(registry.codes().count(), 1);
}

#[rstest]
fn wrap_by_code_keeps_source() {
    let err = Error::wrap_by_code(TransportFailure, COMMON_RPC_ERROR);
    assert_eq!(err.code(), COMMON_RPC_ERROR);
    let source = std::error::Error::source(&err).expect("source kept");
    assert_eq!(source.to_string(), "connection reset");
}

#[rstest]
fn wrap_by_code_reuses_first_backtrace() {
    let inner = Error::by_code(COMMON_DB_ERROR);
    let outer = Error::wrap_by_code(inner.clone(), COMMON_INTERNAL_ERROR);
    assert!(Arc::ptr_eq(&inner.backtrace, &outer.backtrace));
}

#[rstest]
fn wrap_passes_coded_errors_through() {
    let coded = Error::no_permission("not owner");
    assert_eq!(Error::wrap(coded.clone()), coded);
    let promoted = Error::wrap(TransportFailure);
    assert_eq!(promoted.code(), COMMON_INTERNAL_ERROR);
}

#[rstest]
#[case(true, "1")]
#[case(false, "0")]
fn wire_form_carries_stability_flag(#[case] flag: bool, #[case] expected: &str) {
    let wire = Error::by_code(COMMON_INTERNAL_ERROR)
        .with_stability(flag)
        .to_wire();
    assert_eq!(
        wire.extra.get(EXTRA_AFFECT_STABILITY).map(String::as_str),
        Some(expected)
    );
    assert!(!wire.extra.contains_key(EXTRA_CUSTOM));
}

#[rstest]
#[case(Error::by_code(USER_PASSWORD_WRONG))]
#[case(Error::invalid_param("email").with_extra("field", "email"))]
#[case(Error::by_code(COMMON_RPC_ERROR).with_stability(false).with_extra("peer", "auth"))]
fn wire_round_trip_preserves_error(#[case] original: Error) {
    let restored = Error::from_wire(original.to_wire());
    assert_eq!(restored, original);
}

#[rstest]
fn from_wire_defaults_stability_when_flag_missing() {
    let err = Error::from_wire(WireError {
        code: 1001,
        message: "bad".to_owned(),
        extra: BTreeMap::new(),
    });
    assert!(err.affects_stability());
    assert!(err.extra().is_empty());
}

#[rstest]
fn wire_error_deserializes_without_extra() {
    let wire: WireError =
        serde_json::from_str(r#"{"code":5,"message":"m"}"#).expect("decode wire error");
    assert_eq!(wire.code, 5);
    assert!(wire.extra.is_empty());
}

#[rstest]
fn serializes_as_the_wire_triple() {
    let err = Error::by_code(USER_PASSWORD_WRONG).with_extra("attempt", "2");
    let value = serde_json::to_value(&err).expect("serialize");
    assert_eq!(value["code"], USER_PASSWORD_WRONG);
    assert_eq!(value["message"], err.message());
    assert_eq!(value["extra"][EXTRA_AFFECT_STABILITY], "0");
    assert!(value["extra"][EXTRA_CUSTOM].is_string());
}
