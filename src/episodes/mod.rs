pub mod dto;
pub mod handlers;
mod repo;
mod services;

use crate::state::AppState;
use axum::Router;

/// Mounted under `/api/episodes`.
pub fn router() -> Router<AppState> {
    handlers::routes()
}
