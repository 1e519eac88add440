pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod seed;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::catalog_routes())
        .merge(handlers::user_layer_routes())
}
