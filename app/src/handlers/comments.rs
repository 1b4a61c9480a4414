use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    core::state::AppState,
    models::{comment::Model as Comment, user::Model as User},
    repos::{comments::CommentsRepo, projects::ProjectsRepo, subtasks::SubtasksRepo},
    utils::response::APIError,
};

use super::tasks::load_task_scope;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentInfo {
    id: String,
    content: String,
    author_id: String,
    author_name: String,
    created_at: NaiveDateTime,
}

impl CommentInfo {
    pub(super) fn from_pair(comment: Comment, author: User) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author_id: author.id,
            author_name: author.username,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    comments: Vec<CommentInfo>,
}

pub async fn list_task_comments(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<CommentListResponse>, APIError> {
    let (_task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_member(&project.workspace_id, &user.id)
        .await?;

    let comments = CommentsRepo::new(state.database.clone())
        .list_for_task(&task_id)
        .await
        .map_err(|e| {
            error!("Failed to list comments: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .into_iter()
        .filter_map(|(comment, author)| author.map(|a| CommentInfo::from_pair(comment, a)))
        .collect();

    Ok(Json(CommentListResponse { comments }))
}

pub async fn add_task_comment(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<CommentInfo>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_member(&project.workspace_id, &user.id)
        .await?;

    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(APIError::BadRequest("Comment cannot be empty".to_string()));
    }

    let comment = CommentsRepo::new(state.database.clone())
        .create_for_task(task.id, user.id.clone(), content)
        .await
        .map_err(|e| {
            error!("Failed to add comment: {}", e);
            APIError::InternalServerError("Failed to add comment".to_string())
        })?;

    Ok(Json(CommentInfo::from_pair(comment, user)))
}

pub async fn list_subtask_comments(
    State(state): State<Arc<AppState>>,
    Path(subtask_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<CommentListResponse>, APIError> {
    let workspace_id = subtask_workspace(&state, &subtask_id).await?;

    state
        .access()
        .require_member(&workspace_id, &user.id)
        .await?;

    let comments = CommentsRepo::new(state.database.clone())
        .list_for_subtask(&subtask_id)
        .await
        .map_err(|e| {
            error!("Failed to list comments: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .into_iter()
        .filter_map(|(comment, author)| author.map(|a| CommentInfo::from_pair(comment, a)))
        .collect();

    Ok(Json(CommentListResponse { comments }))
}

pub async fn add_subtask_comment(
    State(state): State<Arc<AppState>>,
    Path(subtask_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<CommentInfo>, APIError> {
    let workspace_id = subtask_workspace(&state, &subtask_id).await?;

    state
        .access()
        .require_member(&workspace_id, &user.id)
        .await?;

    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(APIError::BadRequest("Comment cannot be empty".to_string()));
    }

    let comment = CommentsRepo::new(state.database.clone())
        .create_for_subtask(subtask_id, user.id.clone(), content)
        .await
        .map_err(|e| {
            error!("Failed to add comment: {}", e);
            APIError::InternalServerError("Failed to add comment".to_string())
        })?;

    Ok(Json(CommentInfo::from_pair(comment, user)))
}

/// Workspace id owning the subtask, via its parent task and project.
async fn subtask_workspace(state: &AppState, subtask_id: &str) -> Result<String, APIError> {
    let (_, task) = SubtasksRepo::new(state.database.clone())
        .get_with_task(subtask_id)
        .await
        .map_err(|e| {
            error!("Failed to load subtask: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Subtask not found".to_string()))?;

    let task = task.ok_or_else(|| APIError::NotFound("Subtask not found".to_string()))?;

    let project = ProjectsRepo::new(state.database.clone())
        .get(&task.project_id)
        .await
        .map_err(|e| {
            error!("Failed to load project: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Subtask not found".to_string()))?;

    Ok(project.workspace_id)
}
