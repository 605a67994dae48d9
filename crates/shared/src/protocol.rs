use serde::{Deserialize, Serialize};

use crate::domain::EntityName;

/// Body returned by a successful `DELETE /api/{entity}/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

impl DeleteResponse {
    pub fn for_entity(entity: &EntityName) -> Self {
        Self {
            message: format!("{} deleted successfully", entity.display_name()),
        }
    }
}

pub fn entities_route() -> &'static str {
    "/api/entities"
}

pub fn collection_route(entity: &str) -> String {
    format!("/api/{entity}")
}

pub fn record_route(entity: &str, id: i64) -> String {
    format!("/api/{entity}/{id}")
}
