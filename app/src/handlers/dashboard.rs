use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::error;

use crate::{
    core::state::AppState,
    models::{
        task::{Model as Task, TaskStatus},
        user::Model as User,
        workspace_member::WorkspaceRole,
    },
    repos::{projects::ProjectsRepo, tasks::TasksRepo, workspace_members::WorkspaceMembersRepo},
    utils::response::APIError,
};

#[derive(Debug, Serialize)]
pub struct TaskSummary {
    id: String,
    title: String,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    project_name: String,
}

impl TaskSummary {
    fn build(task: Task, project_name: String) -> Self {
        Self {
            id: task.id,
            title: task.title,
            status: task.status,
            due_date: task.due_date,
            project_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    role: String,
    workspace_count: u64,
    project_count: u64,
    total_tasks: u64,
    todo_tasks: u64,
    in_progress_tasks: u64,
    completed_tasks: u64,
    overdue_tasks: u64,
    my_tasks: Vec<TaskSummary>,
    recent_tasks: Vec<TaskSummary>,
}

/// One dashboard per user, shaped by their strongest role. Admins and
/// project managers see totals across the workspaces they run; plain
/// members see their own assignments.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<DashboardResponse>, APIError> {
    let memberships = WorkspaceMembersRepo::new(state.database.clone())
        .list_for_user(&user.id)
        .await
        .map_err(|e| {
            error!("Failed to load memberships: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    let admin_ids: Vec<String> = memberships
        .iter()
        .filter(|m| m.role == WorkspaceRole::Admin)
        .map(|m| m.workspace_id.clone())
        .collect();
    let pm_ids: Vec<String> = memberships
        .iter()
        .filter(|m| m.role == WorkspaceRole::Pm)
        .map(|m| m.workspace_id.clone())
        .collect();

    let tasks_repo = TasksRepo::new(state.database.clone());
    let today = chrono::Utc::now().date_naive();

    let my_task_rows = tasks_repo.assigned_to_user(&user.id).await.map_err(|e| {
        error!("Failed to load assigned tasks: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    let my_tasks: Vec<TaskSummary> = my_task_rows
        .iter()
        .filter_map(|(task, project)| {
            project
                .as_ref()
                .map(|p| TaskSummary::build(task.clone(), p.name.clone()))
        })
        .collect();

    if memberships.is_empty() {
        return Ok(Json(DashboardResponse {
            role: "none".to_string(),
            workspace_count: 0,
            project_count: 0,
            total_tasks: 0,
            todo_tasks: 0,
            in_progress_tasks: 0,
            completed_tasks: 0,
            overdue_tasks: 0,
            my_tasks,
            recent_tasks: Vec::new(),
        }));
    }

    let (role, scope_ids) = if !admin_ids.is_empty() {
        ("admin", admin_ids)
    } else if !pm_ids.is_empty() {
        ("pm", pm_ids)
    } else {
        ("member", Vec::new())
    };

    if role == "member" {
        // Member numbers come straight from their own assignments.
        let assigned: Vec<&Task> = my_task_rows.iter().map(|(task, _)| task).collect();
        let project_ids: HashSet<&str> =
            assigned.iter().map(|t| t.project_id.as_str()).collect();

        let count_status = |status: TaskStatus| {
            assigned.iter().filter(|t| t.status == status).count() as u64
        };
        let overdue = assigned
            .iter()
            .filter(|t| {
                t.status != TaskStatus::Done && t.due_date.map(|d| d < today).unwrap_or(false)
            })
            .count() as u64;

        return Ok(Json(DashboardResponse {
            role: role.to_string(),
            workspace_count: memberships.len() as u64,
            project_count: project_ids.len() as u64,
            total_tasks: assigned.len() as u64,
            todo_tasks: count_status(TaskStatus::Todo),
            in_progress_tasks: count_status(TaskStatus::InProgress),
            completed_tasks: count_status(TaskStatus::Done),
            overdue_tasks: overdue,
            my_tasks,
            recent_tasks: Vec::new(),
        }));
    }

    let projects_repo = ProjectsRepo::new(state.database.clone());
    let internal = |e: sea_orm::DbErr| {
        error!("Failed to build dashboard: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    };

    let project_count = projects_repo
        .count_in_workspaces(&scope_ids)
        .await
        .map_err(internal)?;
    let total_tasks = tasks_repo
        .count_in_workspaces(&scope_ids, None)
        .await
        .map_err(internal)?;
    let todo_tasks = tasks_repo
        .count_in_workspaces(&scope_ids, Some(TaskStatus::Todo))
        .await
        .map_err(internal)?;
    let in_progress_tasks = tasks_repo
        .count_in_workspaces(&scope_ids, Some(TaskStatus::InProgress))
        .await
        .map_err(internal)?;
    let completed_tasks = tasks_repo
        .count_in_workspaces(&scope_ids, Some(TaskStatus::Done))
        .await
        .map_err(internal)?;
    let overdue_tasks = tasks_repo
        .count_overdue_in_workspaces(&scope_ids, today)
        .await
        .map_err(internal)?;

    let recent_tasks = tasks_repo
        .recent_in_workspaces(&scope_ids, 10)
        .await
        .map_err(internal)?
        .into_iter()
        .filter_map(|(task, project)| project.map(|p| TaskSummary::build(task, p.name)))
        .collect();

    Ok(Json(DashboardResponse {
        role: role.to_string(),
        workspace_count: scope_ids.len() as u64,
        project_count,
        total_tasks,
        todo_tasks,
        in_progress_tasks,
        completed_tasks,
        overdue_tasks,
        my_tasks,
        recent_tasks,
    }))
}
