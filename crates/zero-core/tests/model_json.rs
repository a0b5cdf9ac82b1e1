//! JSON field layout of the user model and build info.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use zero_core::{BuildInfo, NewUser};

#[test]
fn new_user_uses_camel_case_fields() {
    let body = r#"{"firstName":"Ada","secondName":"Lovelace","birthDate":"1815-12-10T00:00:00Z"}"#;
    let u: NewUser = serde_json::from_str(body).unwrap();
    assert_eq!(u.first_name, "Ada");
    u.validate().expect("valid");

    let user = u.into_user(3);
    let v = serde_json::to_value(&user).unwrap();
    assert_eq!(v["id"], 3);
    assert_eq!(v["secondName"], "Lovelace");
    assert_eq!(v["birthDate"], "1815-12-10T00:00:00Z");
}

#[test]
fn new_user_rejects_unknown_fields_and_blank_names() {
    let typo = r#"{"firstName":"A","lastName":"B","birthDate":"2000-01-01T00:00:00Z"}"#;
    assert!(serde_json::from_str::<NewUser>(typo).is_err());

    let blank = r#"{"firstName":" ","secondName":"B","birthDate":"2000-01-01T00:00:00Z"}"#;
    let u: NewUser = serde_json::from_str(blank).unwrap();
    let err = u.validate().expect_err("blank first name");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn build_info_serializes_with_last_commit() {
    let v = serde_json::to_value(BuildInfo::from_build_env()).unwrap();
    assert!(v["version"].is_string());
    assert!(v["gitVersion"].is_string());
    assert!(v["buildTime"].is_string());
    assert!(v["lastCommit"]["author"].is_string());
}
