use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::{
    core::state::AppState,
    handlers::{
        comments::{add_task_comment, list_task_comments},
        subtasks::create_subtask,
        tasks::{
            assign_task, change_task_status, delete_task, get_task, unassign_task, update_task,
        },
    },
};

pub fn task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:task_id", get(get_task))
        .route("/:task_id", patch(update_task))
        .route("/:task_id", delete(delete_task))
        .route("/:task_id/status", post(change_task_status))
        .route("/:task_id/assignees", post(assign_task))
        .route("/:task_id/assignees/:user_id", delete(unassign_task))
        .route("/:task_id/subtasks", post(create_subtask))
        .route("/:task_id/comments", get(list_task_comments))
        .route("/:task_id/comments", post(add_task_comment))
}
