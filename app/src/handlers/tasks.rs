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
        task::{Model as Task, TaskStatus},
        user::Model as User,
        workspace_member::WorkspaceRole,
    },
    repos::{
        comments::CommentsRepo,
        projects::ProjectsRepo,
        sprints::SprintsRepo,
        subtasks::SubtasksRepo,
        tasks::{progress_percentage, TasksRepo},
        users::UsersRepo,
        workspace_members::WorkspaceMembersRepo,
        workspaces::WorkspacesRepo,
    },
    services::notify::templates,
    utils::response::APIError,
};

use super::comments::CommentInfo;
use super::subtasks::SubtaskOverview;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    sprint_id: Option<String>,
    due_date: Option<NaiveDate>,
    assignee_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    sprint_id: Option<String>,
    #[serde(default)]
    clear_sprint: bool,
    due_date: Option<NaiveDate>,
    #[serde(default)]
    clear_due_date: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    user_id: String,
}

#[derive(Debug, Serialize)]
pub struct AssigneeInfo {
    id: String,
    username: String,
}

impl From<User> for AssigneeInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskOverview {
    id: String,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    sprint_id: Option<String>,
    due_date: Option<NaiveDate>,
    created_at: NaiveDateTime,
    assignees: Vec<AssigneeInfo>,
}

impl TaskOverview {
    fn build(task: Task, assignees: Vec<User>) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            sprint_id: task.sprint_id,
            due_date: task.due_date,
            created_at: task.created_at,
            assignees: assignees.into_iter().map(AssigneeInfo::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    tasks: Vec<TaskOverview>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetail {
    task: Task,
    project_name: String,
    assignees: Vec<AssigneeInfo>,
    subtasks: Vec<SubtaskOverview>,
    /// Share of subtasks done, 0 when the task has none.
    progress: u8,
    comments: Vec<CommentInfo>,
}

#[derive(Debug, Serialize)]
pub struct AssignResponse {
    message: String,
    assignees: Vec<AssigneeInfo>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    message: String,
}

/// Resolves a task down to its project so role checks can run against
/// the owning workspace.
pub(super) async fn load_task_scope(
    state: &AppState,
    task_id: &str,
) -> Result<(Task, Project), APIError> {
    let (task, project) = TasksRepo::new(state.database.clone())
        .get_with_project(task_id)
        .await
        .map_err(|e| {
            error!("Failed to load task: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Task not found".to_string()))?;

    let project =
        project.ok_or_else(|| APIError::NotFound("Task not found".to_string()))?;

    Ok((task, project))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<TaskListResponse>, APIError> {
    let project = ProjectsRepo::new(state.database.clone())
        .get(&project_id)
        .await
        .map_err(|e| {
            error!("Failed to load project: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Project not found".to_string()))?;

    state
        .access()
        .require_member(&project.workspace_id, &user.id)
        .await?;

    let tasks_repo = TasksRepo::new(state.database.clone());
    let rows = tasks_repo.list_for_project(&project_id).await.map_err(|e| {
        error!("Failed to list tasks: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    let mut tasks = Vec::with_capacity(rows.len());
    for task in rows {
        let assignees = tasks_repo.assignees(&task.id).await.map_err(|e| {
            error!("Failed to load assignees: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;
        tasks.push(TaskOverview::build(task, assignees));
    }

    Ok(Json(TaskListResponse { tasks }))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<TaskOverview>, APIError> {
    let project = ProjectsRepo::new(state.database.clone())
        .get(&project_id)
        .await
        .map_err(|e| {
            error!("Failed to load project: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Project not found".to_string()))?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(APIError::BadRequest(
            "Task title cannot be empty".to_string(),
        ));
    }

    if let Some(sprint_id) = &payload.sprint_id {
        let sprint = SprintsRepo::new(state.database.clone())
            .get(sprint_id)
            .await
            .map_err(|e| {
                error!("Failed to load sprint: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            })?
            .ok_or_else(|| APIError::NotFound("Sprint not found".to_string()))?;
        if sprint.project_id != project_id {
            return Err(APIError::BadRequest(
                "Sprint does not belong to this project".to_string(),
            ));
        }
    }

    let tasks_repo = TasksRepo::new(state.database.clone());
    let task = tasks_repo
        .create(
            project_id,
            payload.sprint_id,
            title,
            payload.description.filter(|d| !d.trim().is_empty()),
            payload.due_date,
            user.id.clone(),
        )
        .await
        .map_err(|e| {
            error!("Failed to create task: {}", e);
            APIError::InternalServerError("Failed to create task".to_string())
        })?;

    info!("{} created task {}", user.username, task.title);

    let mut assigned = Vec::new();
    for user_id in payload.assignee_ids.unwrap_or_default() {
        let target = require_workspace_user(&state, &project.workspace_id, &user_id).await?;
        let added = tasks_repo.assign(&task.id, &target.id).await.map_err(|e| {
            error!("Failed to assign task: {}", e);
            APIError::InternalServerError("Failed to assign task".to_string())
        })?;
        if added.is_some() {
            notify_assignment(&state, &task, &project, &target).await;
        }
        assigned.push(target);
    }

    Ok(Json(TaskOverview::build(task, assigned)))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<TaskDetail>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_member(&project.workspace_id, &user.id)
        .await?;

    let tasks_repo = TasksRepo::new(state.database.clone());
    let assignees = tasks_repo.assignees(&task.id).await.map_err(|e| {
        error!("Failed to load assignees: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    let subtasks_repo = SubtasksRepo::new(state.database.clone());
    let subtask_rows = subtasks_repo.list_for_task(&task.id).await.map_err(|e| {
        error!("Failed to load subtasks: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    let done = subtask_rows
        .iter()
        .filter(|subtask| subtask.status == TaskStatus::Done)
        .count() as u64;
    let progress = progress_percentage(done, subtask_rows.len() as u64);

    let mut subtasks = Vec::with_capacity(subtask_rows.len());
    for subtask in subtask_rows {
        let subtask_assignees = subtasks_repo.assignees(&subtask.id).await.map_err(|e| {
            error!("Failed to load assignees: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;
        subtasks.push(SubtaskOverview::build(subtask, subtask_assignees));
    }

    let comments = CommentsRepo::new(state.database.clone())
        .list_for_task(&task.id)
        .await
        .map_err(|e| {
            error!("Failed to load comments: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .into_iter()
        .filter_map(|(comment, author)| author.map(|a| CommentInfo::from_pair(comment, a)))
        .collect();

    Ok(Json(TaskDetail {
        task,
        project_name: project.name,
        assignees: assignees.into_iter().map(AssigneeInfo::from).collect(),
        subtasks,
        progress,
        comments,
    }))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(APIError::BadRequest(
                "Task title cannot be empty".to_string(),
            ));
        }
    }

    let sprint_change = if payload.clear_sprint {
        Some(None)
    } else if let Some(sprint_id) = payload.sprint_id {
        let sprint = SprintsRepo::new(state.database.clone())
            .get(&sprint_id)
            .await
            .map_err(|e| {
                error!("Failed to load sprint: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            })?
            .ok_or_else(|| APIError::NotFound("Sprint not found".to_string()))?;
        if sprint.project_id != task.project_id {
            return Err(APIError::BadRequest(
                "Sprint does not belong to this project".to_string(),
            ));
        }
        Some(Some(sprint_id))
    } else {
        None
    };

    let due_change = if payload.clear_due_date {
        Some(None)
    } else {
        payload.due_date.map(Some)
    };

    let updated = TasksRepo::new(state.database.clone())
        .update(task, payload.title, payload.description, sprint_change, due_change)
        .await
        .map_err(|e| {
            error!("Failed to update task: {}", e);
            APIError::InternalServerError("Failed to update task".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn change_task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<Task>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    let membership = state
        .access()
        .require_member(&project.workspace_id, &user.id)
        .await?;

    let tasks_repo = TasksRepo::new(state.database.clone());

    // Plain members can only move tasks they are assigned to.
    if membership.role == WorkspaceRole::Member {
        let assigned = tasks_repo.is_assignee(&task.id, &user.id).await.map_err(|e| {
            error!("Failed to check assignment: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;
        if !assigned {
            return Err(APIError::Forbidden(
                "Only assignees can update the status of this task".to_string(),
            ));
        }
    }

    let updated = tasks_repo
        .change_status(task, payload.status)
        .await
        .map_err(|e| {
            error!("Failed to change status: {}", e);
            APIError::InternalServerError("Failed to change status".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<DeleteResponse>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    TasksRepo::new(state.database.clone())
        .delete(&task.id)
        .await
        .map_err(|e| {
            error!("Failed to delete task: {}", e);
            APIError::InternalServerError("Failed to delete task".to_string())
        })?;

    info!("{} deleted task {}", user.username, task.title);

    Ok(Json(DeleteResponse {
        message: "Task deleted".to_string(),
    }))
}

pub async fn assign_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<AssignResponse>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    let target = require_workspace_user(&state, &project.workspace_id, &payload.user_id).await?;

    let tasks_repo = TasksRepo::new(state.database.clone());
    let added = tasks_repo.assign(&task.id, &target.id).await.map_err(|e| {
        error!("Failed to assign task: {}", e);
        APIError::InternalServerError("Failed to assign task".to_string())
    })?;

    let message = if added.is_some() {
        notify_assignment(&state, &task, &project, &target).await;
        format!("Assigned {} to the task", target.username)
    } else {
        format!("{} is already assigned to the task", target.username)
    };

    let assignees = tasks_repo.assignees(&task.id).await.map_err(|e| {
        error!("Failed to load assignees: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    Ok(Json(AssignResponse {
        message,
        assignees: assignees.into_iter().map(AssigneeInfo::from).collect(),
    }))
}

pub async fn unassign_task(
    State(state): State<Arc<AppState>>,
    Path((task_id, user_id)): Path<(String, String)>,
    Extension(user): Extension<User>,
) -> Result<Json<AssignResponse>, APIError> {
    let (task, project) = load_task_scope(&state, &task_id).await?;

    state
        .access()
        .require_manager(&project.workspace_id, &user.id)
        .await?;

    let tasks_repo = TasksRepo::new(state.database.clone());
    let removed = tasks_repo.unassign(&task.id, &user_id).await.map_err(|e| {
        error!("Failed to unassign task: {}", e);
        APIError::InternalServerError("Failed to unassign task".to_string())
    })?;

    if !removed {
        return Err(APIError::NotFound(
            "User is not assigned to this task".to_string(),
        ));
    }

    let assignees = tasks_repo.assignees(&task.id).await.map_err(|e| {
        error!("Failed to load assignees: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    Ok(Json(AssignResponse {
        message: "Assignee removed".to_string(),
        assignees: assignees.into_iter().map(AssigneeInfo::from).collect(),
    }))
}

/// Looks up the user and confirms they belong to the workspace. Tasks can
/// only be assigned to people who can actually see them.
pub(super) async fn require_workspace_user(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
) -> Result<User, APIError> {
    let target = UsersRepo::new(state.database.clone())
        .get_by_id(user_id)
        .await
        .map_err(|e| match e {
            sea_orm::DbErr::RecordNotFound(_) => {
                APIError::NotFound("User not found".to_string())
            }
            e => {
                error!("Failed to load user: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            }
        })?;

    let membership = WorkspaceMembersRepo::new(state.database.clone())
        .get(workspace_id, user_id)
        .await
        .map_err(|e| {
            error!("Failed to check membership: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    if membership.is_none() {
        return Err(APIError::BadRequest(
            "User is not a member of this workspace".to_string(),
        ));
    }

    Ok(target)
}

/// Best effort notification to a newly assigned user. Failures are logged
/// by the notifier and never fail the request.
pub(super) async fn notify_assignment(
    state: &AppState,
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
        &task.title,
        &project.name,
        &workspace_name,
        &task.status,
        task.due_date,
        &link,
    );
    state
        .notifier
        .send_email(&assignee.email, &content.subject, &content.body)
        .await;

    if let Some(phone) = &assignee.phone_number {
        let sms = templates::assignment_sms(
            &assignee.username,
            &task.title,
            &workspace_name,
            task.due_date,
        );
        state.notifier.send_sms(phone, &sms).await;
    }
}
