pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

/// Mounted under `/api/users`.
pub fn router() -> Router<AppState> {
    handlers::routes()
}
