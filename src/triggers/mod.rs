pub mod dto;
pub mod handlers;
mod repo;

use crate::state::AppState;
use axum::Router;

/// Mounted under `/api/triggers`.
pub fn router() -> Router<AppState> {
    handlers::routes()
}
