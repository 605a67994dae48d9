use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(RecordId);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reserved path segment used by the entity discovery route.
pub const RESERVED_ENTITY_NAME: &str = "entities";

/// Field injected into every record; never part of a schema.
pub const ID_FIELD: &str = "id";

const MAX_ENTITY_NAME_BYTES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("entity name cannot be empty")]
    EmptyName,
    #[error("entity name '{0}' is too long")]
    NameTooLong(String),
    #[error("entity name '{0}' may only contain ASCII letters, digits, '-' and '_'")]
    InvalidName(String),
    #[error("entity name '{0}' is reserved")]
    ReservedName(String),
    #[error("field '{field}' is declared more than once on '{entity}'")]
    DuplicateField { entity: String, field: String },
    #[error("field 'id' is managed by the server and cannot be declared on '{0}'")]
    ReservedField(String),
    #[error("field names on '{0}' cannot be empty")]
    EmptyField(String),
}

/// Name of a registered resource type, e.g. `users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `users` -> `Users`.
    pub fn display_name(&self) -> String {
        capitalize(&self.0)
    }
}

impl FromStr for EntityName {
    type Err = SchemaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if raw.len() > MAX_ENTITY_NAME_BYTES {
            return Err(SchemaError::NameTooLong(raw.to_string()));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SchemaError::InvalidName(raw.to_string()));
        }
        if raw == RESERVED_ENTITY_NAME {
            return Err(SchemaError::ReservedName(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }
}

impl TryFrom<String> for EntityName {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityName> for String {
    fn from(value: EntityName) -> Self {
        value.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Declared shape of an entity. Field order is the JSON key order of
/// rendered records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    name: EntityName,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    pub fn new(name: EntityName, fields: Vec<FieldDef>) -> Result<Self, SchemaError> {
        for (index, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyField(name.to_string()));
            }
            if field.name == ID_FIELD {
                return Err(SchemaError::ReservedField(name.to_string()));
            }
            if fields[..index].iter().any(|prior| prior.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    entity: name.to_string(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(Self { name, fields })
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }
}

pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
