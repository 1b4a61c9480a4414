use std::sync::Arc;

use axum::{
    routing::{delete, patch},
    Router,
};

use crate::{
    core::state::AppState,
    handlers::projects::{delete_sprint, update_sprint},
};

pub fn sprint_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:sprint_id", patch(update_sprint))
        .route("/:sprint_id", delete(delete_sprint))
}
