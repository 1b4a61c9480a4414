use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    core::state::AppState,
    models::{
        project::Model as Project,
        subtask::Model as Subtask,
        task::{Model as Task, TaskStatus},
        user::Model as User,
        workspace_member::WorkspaceRole,
    },
    repos::{projects::ProjectsRepo, subtasks::SubtasksRepo, workspaces::WorkspacesRepo},
    services::notify::templates,
    utils::response::APIError,
};

use super::tasks::{load_task_scope, require_workspace_user, AssigneeInfo};

#[derive(Debug, Deserialize)]
pub struct CreateSubtaskRequest {
    title: String,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    assignee_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubtaskRequest {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    #[serde(default)]
    clear_due_date: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetAssigneesRequest {
    user_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubtaskOverview {
    id: String,
    task_id: String,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    created_at: NaiveDateTime,
    assignees: Vec<AssigneeInfo>,
}

impl SubtaskOverview {
    pub(super) fn build(subtask: Subtask, assignees: Vec<User>) -> Self {
        Self {
            id: subtask.id,
            task_id: subtask.task_id,
            title: subtask.title,
            description: subtask.description,
            status: subtask.status,
            due_date: subtask.due_date,
            created_at: subtask.created_at,
            assignees: assignees.into_iter().map(AssigneeInfo::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    message: String,
}

/// Walks subtask -> task -> project so access checks can reach the
/// owning workspace.
async fn load_subtask_scope(
    state: &AppState,
    subtask_id: &str,
) -> Result<(Subtask, Task, Project), APIError> {
    let (subtask, task) = SubtasksRepo::new(state.database.clone())
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

    Ok((subtask, task, project))
}

pub async fn create_subtask(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateSubtaskRequest>,
) -> Result<Json<SubtaskOverview>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(APIError::BadRequest(
            "Subtask title cannot be empty".to_string(),
        ));
    }

    let subtasks_repo = SubtasksRepo::new(state.database.clone());
    let subtask = subtasks_repo
        .create(
            task.id.clone(),
            title,
            payload.description.filter(|d| !d.trim().is_empty()),
            payload.due_date,
            user.id.clone(),
        )
        .await
        .map_err(|e| {
            error!("Failed to create subtask: {}", e);
            APIError::InternalServerError("Failed to create subtask".to_string())
        })?;

    info!("{} created subtask {}", user.username, subtask.title);

    let mut assigned = Vec::new();
    if let Some(assignee_ids) = payload.assignee_ids {
        for user_id in &assignee_ids {
            require_workspace_user(&state, &project.workspace_id, user_id).await?;
        }

        let added = subtasks_repo
            .set_assignees(&subtask.id, assignee_ids)
            .await
            .map_err(|e| {
                error!("Failed to set assignees: {}", e);
                APIError::InternalServerError("Failed to set assignees".to_string())
            })?;

        assigned = subtasks_repo.assignees(&subtask.id).await.map_err(|e| {
            error!("Failed to load assignees: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

        for assignee in assigned.iter().filter(|a| added.contains(&a.id)) {
            notify_subtask_assignment(&state, &subtask, &task, &project, assignee).await;
        }
    }

    Ok(Json(SubtaskOverview::build(subtask, assigned)))
}

pub async fn update_subtask(
    State(state): State<Arc<AppState>>,
    Path(subtask_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateSubtaskRequest>,
) -> Result<Json<Subtask>, APIError> {
    let (subtask, _task, project) = load_subtask_scope(&state, &subtask_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(APIError::BadRequest(
                "Subtask title cannot be empty".to_string(),
            ));
        }
    }

    let due_change = if payload.clear_due_date {
        Some(None)
    } else {
        payload.due_date.map(Some)
    };

    let updated = SubtasksRepo::new(state.database.clone())
        .update(subtask, payload.title, payload.description, due_change)
        .await
        .map_err(|e| {
            error!("Failed to update subtask: {}", e);
            APIError::InternalServerError("Failed to update subtask".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn change_subtask_status(
    State(state): State<Arc<AppState>>,
    Path(subtask_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<Subtask>, APIError> {
    let (subtask, _task, project) = load_subtask_scope(&state, &subtask_id).await?;

    let membership = state
        .access()
        .require_member(&project.workspace_id, &user.id)
        .await?;

    let subtasks_repo = SubtasksRepo::new(state.database.clone());

    if membership.role == WorkspaceRole::Member {
        let assigned = subtasks_repo
            .is_assignee(&subtask.id, &user.id)
            .await
            .map_err(|e| {
                error!("Failed to check assignment: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            })?;
        if !assigned {
            return Err(APIError::Forbidden(
                "Only assignees can update the status of this subtask".to_string(),
            ));
        }
    }

    let updated = subtasks_repo
        .change_status(subtask, payload.status)
        .await
        .map_err(|e| {
            error!("Failed to change status: {}", e);
            APIError::InternalServerError("Failed to change status".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn delete_subtask(
    State(state): State<Arc<AppState>>,
    Path(subtask_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<DeleteResponse>, APIError> {
    let (subtask, _task, project) = load_subtask_scope(&state, &subtask_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    SubtasksRepo::new(state.database.clone())
        .delete(&subtask.id)
        .await
        .map_err(|e| {
            error!("Failed to delete subtask: {}", e);
            APIError::InternalServerError("Failed to delete subtask".to_string())
        })?;

    Ok(Json(DeleteResponse {
        message: "Subtask deleted".to_string(),
    }))
}

pub async fn set_subtask_assignees(
    State(state): State<Arc<AppState>>,
    Path(subtask_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<SetAssigneesRequest>,
) -> Result<Json<SubtaskOverview>, APIError> {
    let (subtask, task, project) = load_subtask_scope(&state, &subtask_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    for user_id in &payload.user_ids {
        require_workspace_user(&state, &project.workspace_id, user_id).await?;
    }

    let subtasks_repo = SubtasksRepo::new(state.database.clone());
    let added = subtasks_repo
        .set_assignees(&subtask.id, payload.user_ids)
        .await
        .map_err(|e| {
            error!("Failed to set assignees: {}", e);
            APIError::InternalServerError("Failed to set assignees".to_string())
        })?;

    let assignees = subtasks_repo.assignees(&subtask.id).await.map_err(|e| {
        error!("Failed to load assignees: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    for assignee in assignees.iter().filter(|a| added.contains(&a.id)) {
        notify_subtask_assignment(&state, &subtask, &task, &project, assignee).await;
    }

    Ok(Json(SubtaskOverview::build(subtask, assignees)))
}

/// Subtask assignments reuse the task templates; the link lands on the
/// parent task where the subtask lives.
async fn notify_subtask_assignment(
    state: &AppState,
    subtask: &Subtask,
    task: &Task,
    project: &Project,
    assignee: &User,
) {
    let workspace_name = match WorkspacesRepo::new(state.database.clone())
        .get(&project.workspace_id)
        .await
    {
        Ok(Some(workspace)) => workspace.name,
        _ => project.name.clone(),
    };

    let link = format!(
        "{}/tasks/{}/",
        state.config.site_url.trim_end_matches('/'),
        task.id
    );

    let content = templates::assignment_email(
        &assignee.username,
        &subtask.title,
        &project.name,
        &workspace_name,
        &subtask.status,
        subtask.due_date,
        &link,
    );
    state
        .notifier
        .send_email(&assignee.email, &content.subject, &content.body)
        .await;

    if let Some(phone) = &assignee.phone_number {
        let sms = templates::assignment_sms(
            &assignee.username,
            &subtask.title,
            &workspace_name,
            subtask.due_date,
        );
        state.notifier.send_sms(phone, &sms).await;
    }
}
