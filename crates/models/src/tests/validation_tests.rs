use chrono::Utc;

use crate::storage_object::{self, AclType, Model};
use crate::{errors::ModelError, user};

fn sample() -> Model {
    let now = Utc::now().into();
    Model {
        object_id: "player-1".into(),
        object_type: "Player".into(),
        object_data: r#"{"name":"ada","coins":10}"#.into(),
        object_score: 1.5,
        acl_type: AclType::Public,
        acl_param: String::new(),
        created_on: now,
        modified_on: now,
    }
}

#[test]
fn valid_object_passes() {
    assert!(storage_object::validate(&sample()).is_ok());
}

#[test]
fn blank_ids_are_rejected() {
    let mut m = sample();
    m.object_id = "   ".into();
    assert!(matches!(storage_object::validate(&m), Err(ModelError::Validation(_))));

    let mut m = sample();
    m.object_type = String::new();
    assert!(matches!(storage_object::validate(&m), Err(ModelError::Validation(_))));
}

#[test]
fn oversized_id_is_rejected() {
    let mut m = sample();
    m.object_id = "x".repeat(storage_object::MAX_OBJECT_ID_LEN + 1);
    assert!(storage_object::validate(&m).is_err());
}

#[test]
fn body_must_be_json() {
    let mut m = sample();
    m.object_data = "{not json".into();
    assert!(storage_object::validate(&m).is_err());

    // scalars are still JSON documents
    m.object_data = "42".into();
    assert!(storage_object::validate(&m).is_ok());
}

#[test]
fn non_finite_score_is_rejected() {
    let mut m = sample();
    m.object_score = f32::NAN;
    assert!(storage_object::validate(&m).is_err());
}

#[test]
fn acl_type_serializes_by_name() {
    assert_eq!(serde_json::to_string(&AclType::User).unwrap(), "\"User\"");
    let parsed: AclType = serde_json::from_str("\"Admin\"").unwrap();
    assert_eq!(parsed, AclType::Admin);
    assert_eq!(AclType::default(), AclType::Public);
}

#[test]
fn user_validation_rules() {
    assert!(user::validate_email("a@b.c").is_ok());
    assert!(user::validate_email("nope").is_err());
    assert!(user::validate_name("Ada").is_ok());
    assert!(user::validate_name("  ").is_err());
}
