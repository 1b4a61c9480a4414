use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{
    core::state::AppState,
    handlers::{
        comments::{add_subtask_comment, list_subtask_comments},
        subtasks::{
            change_subtask_status, delete_subtask, set_subtask_assignees, update_subtask,
        },
    },
};

pub fn subtask_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:subtask_id", patch(update_subtask))
        .route("/:subtask_id", delete(delete_subtask))
        .route("/:subtask_id/status", post(change_subtask_status))
        .route("/:subtask_id/assignees", put(set_subtask_assignees))
        .route("/:subtask_id/comments", get(list_subtask_comments))
        .route("/:subtask_id/comments", post(add_subtask_comment))
}
