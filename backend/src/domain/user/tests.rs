//! Tests for the session user model.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn ada() -> User {
    User::try_from_strings(VALID_ID, "ada", "Ada Lovelace").expect("valid user")
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_bad_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
}

#[rstest]
fn username_is_trimmed() {
    let username = Username::new("  ada  ").expect("valid username");
    assert_eq!(username.as_ref(), "ada");
}

#[rstest]
#[case("   ", UserValidationError::EmptyUsername)]
#[case(&"u".repeat(USERNAME_MAX_LEN + 1), UserValidationError::UsernameTooLong { max: USERNAME_MAX_LEN })]
fn username_rejects_bad_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Username::new(raw).expect_err("invalid username"), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyDisplayName)]
#[case("bad$char", UserValidationError::DisplayNameInvalidCharacters)]
#[case(&"a".repeat(DISPLAY_NAME_MAX + 1), UserValidationError::DisplayNameTooLong { max: DISPLAY_NAME_MAX })]
fn display_name_rejects_bad_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(DisplayName::new(raw).expect_err("invalid name"), expected);
}

#[rstest]
fn profile_exposes_public_fields_only(ada: User) {
    let profile = ada.profile();
    assert_eq!(profile.user_id, VALID_ID);
    assert_eq!(profile.username, "ada");
    assert_eq!(profile.display_name, "Ada Lovelace");
}

#[rstest]
fn serialises_as_plain_strings(ada: User) {
    let value = serde_json::to_value(&ada).expect("serialise user");
    assert_eq!(
        value,
        json!({ "id": VALID_ID, "username": "ada", "display_name": "Ada Lovelace" })
    );
    let restored: User = serde_json::from_value(value).expect("deserialise user");
    assert_eq!(restored, ada);
}

#[rstest]
fn deserialising_revalidates_fields() {
    let tampered = json!({ "id": "nope", "username": "ada", "display_name": "Ada" });
    assert!(serde_json::from_value::<User>(tampered).is_err());
}
