use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::{
    core::state::AppState,
    handlers::{
        projects::{create_sprint, delete_project, get_project, update_project},
        tasks::{create_task, list_tasks},
    },
};

pub fn project_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:project_id", get(get_project))
        .route("/:project_id", patch(update_project))
        .route("/:project_id", delete(delete_project))
        .route("/:project_id/sprints", post(create_sprint))
        .route("/:project_id/tasks", get(list_tasks))
        .route("/:project_id/tasks", post(create_task))
}
