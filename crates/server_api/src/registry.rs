use shared::domain::{EntityName, EntitySchema, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("entity '{0}' is already registered")]
    Duplicate(EntityName),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Registered entity schemas in registration order.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    schemas: Vec<EntitySchema>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: EntitySchema) -> Result<&EntitySchema, RegistryError> {
        if self.get(schema.name().as_str()).is_some() {
            return Err(RegistryError::Duplicate(schema.name().clone()));
        }
        self.schemas.push(schema);
        let index = self.schemas.len() - 1;
        Ok(&self.schemas[index])
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.schemas
            .iter()
            .find(|schema| schema.name().as_str() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.schemas
            .iter()
            .map(|schema| schema.name().to_string())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
