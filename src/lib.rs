// Library surface so integration tests can build the router in-process.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod scrapers;
pub mod search;

pub use crate::api::{create_router, AppState};
pub use crate::config::Config;
