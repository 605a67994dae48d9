use serde_json::{Map, Number, Value};

use crate::domain::{EntitySchema, FieldKind, RecordId, ID_FIELD};

/// Untyped record body, keyed by field name in insertion order.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub fields: Fields,
}

/// Every schema field set to `null`.
pub fn blank_fields(schema: &EntitySchema) -> Fields {
    schema
        .fields()
        .iter()
        .map(|field| (field.name.clone(), Value::Null))
        .collect()
}

/// Converts an input value to the representation stored for `kind`.
///
/// Returns `None` when the value cannot be represented; callers leave the
/// field untouched in that case. `null` always clears.
pub fn coerce(kind: FieldKind, value: &Value) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    match kind {
        FieldKind::String => match value {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        FieldKind::Integer => integer_input(value)
            .and_then(|n| i32::try_from(n).ok())
            .map(|n| Value::Number(Number::from(n))),
        FieldKind::Long => integer_input(value).map(|n| Value::Number(Number::from(n))),
        FieldKind::Boolean => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) => Some(Value::Bool(s.trim().eq_ignore_ascii_case("true"))),
            _ => None,
        },
    }
}

fn integer_input(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Copies every schema field present in `input` onto `target`.
///
/// `id` and keys outside the schema are ignored. Returns the names of fields
/// whose values could not be converted.
pub fn apply_input(schema: &EntitySchema, target: &mut Fields, input: &Fields) -> Vec<String> {
    let mut rejected = Vec::new();
    for field in schema.fields() {
        let Some(raw) = input.get(&field.name) else {
            continue;
        };
        match coerce(field.kind, raw) {
            Some(value) => {
                target.insert(field.name.clone(), value);
            }
            None => rejected.push(field.name.clone()),
        }
    }
    rejected
}

/// Wire shape of a record: `id` first, then schema fields in declaration
/// order. Stored keys that are no longer part of the schema are dropped.
pub fn render(schema: &EntitySchema, record: &StoredRecord) -> Fields {
    let mut out = Fields::new();
    out.insert(ID_FIELD.to_string(), Value::Number(Number::from(record.id.0)));
    for field in schema.fields() {
        let value = record
            .fields
            .get(&field.name)
            .cloned()
            .unwrap_or(Value::Null);
        out.insert(field.name.clone(), value);
    }
    out
}

#[cfg(test)]
#[path = "tests/record_tests.rs"]
mod tests;
