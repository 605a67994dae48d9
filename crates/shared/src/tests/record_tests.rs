use super::*;
use crate::domain::{EntityName, FieldDef, SchemaError};
use serde_json::json;

fn products() -> EntitySchema {
    EntitySchema::new(
        "products".parse().expect("name"),
        vec![
            FieldDef::new("name", FieldKind::String),
            FieldDef::new("price", FieldKind::Integer),
            FieldDef::new("stock", FieldKind::Long),
            FieldDef::new("active", FieldKind::Boolean),
        ],
    )
    .expect("schema")
}

fn object(value: Value) -> Fields {
    value.as_object().cloned().expect("object")
}

#[test]
fn numeric_strings_are_stored_as_numbers() {
    let schema = products();
    let mut fields = blank_fields(&schema);
    let rejected = apply_input(
        &schema,
        &mut fields,
        &object(json!({ "name": "Laptop", "price": "999", "stock": " 12 " })),
    );
    assert!(rejected.is_empty());
    assert_eq!(fields["name"], json!("Laptop"));
    assert_eq!(fields["price"], json!(999));
    assert_eq!(fields["stock"], json!(12));
    assert_eq!(fields["active"], Value::Null);
}

#[test]
fn unparseable_values_leave_field_unchanged() {
    let schema = products();
    let mut fields = object(json!({ "name": "Mug", "price": 15, "stock": null, "active": true }));
    let rejected = apply_input(
        &schema,
        &mut fields,
        &object(json!({ "price": "fifteen", "stock": [1] })),
    );
    assert_eq!(rejected, vec!["price".to_string(), "stock".to_string()]);
    assert_eq!(fields["price"], json!(15));
    assert_eq!(fields["stock"], Value::Null);
}

#[test]
fn integer_field_rejects_values_outside_32_bits() {
    assert_eq!(coerce(FieldKind::Integer, &json!("3000000000")), None);
    assert_eq!(
        coerce(FieldKind::Long, &json!("3000000000")),
        Some(json!(3_000_000_000_i64))
    );
}

#[test]
fn boolean_strings_follow_true_or_false() {
    assert_eq!(coerce(FieldKind::Boolean, &json!("TRUE")), Some(json!(true)));
    assert_eq!(coerce(FieldKind::Boolean, &json!("yes")), Some(json!(false)));
    assert_eq!(coerce(FieldKind::Boolean, &json!(false)), Some(json!(false)));
    assert_eq!(coerce(FieldKind::Boolean, &json!(1)), None);
}

#[test]
fn null_clears_any_kind() {
    for kind in [
        FieldKind::String,
        FieldKind::Integer,
        FieldKind::Long,
        FieldKind::Boolean,
    ] {
        assert_eq!(coerce(kind, &Value::Null), Some(Value::Null));
    }
}

#[test]
fn id_and_unknown_keys_are_ignored() {
    let schema = products();
    let mut fields = blank_fields(&schema);
    apply_input(
        &schema,
        &mut fields,
        &object(json!({ "id": 77, "color": "red", "name": "Pen" })),
    );
    assert!(!fields.contains_key("id"));
    assert!(!fields.contains_key("color"));
    assert_eq!(fields["name"], json!("Pen"));
}

#[test]
fn render_puts_id_first_and_follows_schema_order() {
    let schema = products();
    let record = StoredRecord {
        id: RecordId(3),
        fields: object(json!({ "active": true, "legacy": "x", "name": "Desk" })),
    };
    let rendered = render(&schema, &record);
    let keys: Vec<&str> = rendered.keys().map(String::as_str).collect();
    assert_eq!(keys, ["id", "name", "price", "stock", "active"]);
    assert_eq!(rendered["id"], json!(3));
    assert_eq!(rendered["price"], Value::Null);
}

#[test]
fn schema_rejects_reserved_and_duplicate_fields() {
    let name: EntityName = "users".parse().expect("name");
    let err = EntitySchema::new(name.clone(), vec![FieldDef::new("id", FieldKind::Long)])
        .expect_err("id is reserved");
    assert_eq!(err, SchemaError::ReservedField("users".into()));

    let err = EntitySchema::new(
        name,
        vec![
            FieldDef::new("email", FieldKind::String),
            FieldDef::new("email", FieldKind::String),
        ],
    )
    .expect_err("duplicate");
    assert!(matches!(err, SchemaError::DuplicateField { .. }));
}

#[test]
fn entity_names_are_validated() {
    assert!("users".parse::<EntityName>().is_ok());
    assert!("order-items_2".parse::<EntityName>().is_ok());
    assert_eq!(
        "entities".parse::<EntityName>(),
        Err(SchemaError::ReservedName("entities".into()))
    );
    assert_eq!("".parse::<EntityName>(), Err(SchemaError::EmptyName));
    assert!("users/1".parse::<EntityName>().is_err());
    assert_eq!(
        "users".parse::<EntityName>().expect("name").display_name(),
        "Users"
    );
}
