mod admin;
pub mod config;
pub mod routes;
pub mod startup;

pub use routes::{build_router, AppState};
