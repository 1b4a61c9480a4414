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
        sprint::{Model as Sprint, SprintStatus},
        task::{Model as Task, TaskStatus},
        user::Model as User,
        workspace_member::WorkspaceRole,
    },
    repos::{
        projects::ProjectsRepo,
        sprints::SprintsRepo,
        tasks::{progress_percentage, TasksRepo},
    },
    utils::response::APIError,
};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    name: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSprintRequest {
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSprintRequest {
    name: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    status: Option<SprintStatus>,
}

#[derive(Debug, Serialize)]
pub struct ProjectOverview {
    id: String,
    name: String,
    description: Option<String>,
    created_at: NaiveDateTime,
    task_count: u64,
    completed_task_count: u64,
    progress: u8,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    projects: Vec<ProjectOverview>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    project: Project,
    role: WorkspaceRole,
    sprints: Vec<Sprint>,
    tasks: Vec<Task>,
    task_count: u64,
    completed_task_count: u64,
    progress: u8,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    message: String,
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<ProjectListResponse>, APIError> {
    state
        .access()
        .require_member(&workspace_id, &user.id)
        .await?;

    let tasks_repo = TasksRepo::new(state.database.clone());
    let rows = ProjectsRepo::new(state.database.clone())
        .list_for_workspace(&workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to list projects: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    let mut projects = Vec::with_capacity(rows.len());
    for project in rows {
        let task_count = tasks_repo
            .count_for_project(&project.id)
            .await
            .map_err(|e| {
                error!("Failed to count tasks: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            })?;
        let completed_task_count = tasks_repo
            .count_done_for_project(&project.id)
            .await
            .map_err(|e| {
                error!("Failed to count tasks: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            })?;

        projects.push(ProjectOverview {
            id: project.id,
            name: project.name,
            description: project.description,
            created_at: project.created_at,
            task_count,
            completed_task_count,
            progress: progress_percentage(completed_task_count, task_count),
        });
    }

    Ok(Json(ProjectListResponse { projects }))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<Project>, APIError> {
    state
        .access()
        .require_manager(&workspace_id, &user.id)
        .await?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(APIError::BadRequest(
            "Project name cannot be empty".to_string(),
        ));
    }

    let project = ProjectsRepo::new(state.database.clone())
        .create(
            workspace_id,
            name,
            payload.description.filter(|d| !d.trim().is_empty()),
            user.id.clone(),
        )
        .await
        .map_err(|e| {
            error!("Failed to create project: {}", e);
            APIError::InternalServerError("Failed to create project".to_string())
        })?;

    info!("{} created project {}", user.username, project.name);

    Ok(Json(project))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<ProjectDetail>, APIError> {
    let project = ProjectsRepo::new(state.database.clone())
        .get(&project_id)
        .await
        .map_err(|e| {
            error!("Failed to load project: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Project not found".to_string()))?;

    let membership = state
        .access()
        .require_member(&project.workspace_id, &user.id)
        .await?;

    let sprints = SprintsRepo::new(state.database.clone())
        .list_for_project(&project_id)
        .await
        .map_err(|e| {
            error!("Failed to load sprints: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    let tasks_repo = TasksRepo::new(state.database.clone());
    let tasks = tasks_repo.list_for_project(&project_id).await.map_err(|e| {
        error!("Failed to load tasks: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    let task_count = tasks.len() as u64;
    let completed_task_count = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .count() as u64;

    Ok(Json(ProjectDetail {
        project,
        role: membership.role,
        sprints,
        tasks,
        task_count,
        completed_task_count,
        progress: progress_percentage(completed_task_count, task_count),
    }))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, APIError> {
    let projects_repo = ProjectsRepo::new(state.database.clone());
    let project = projects_repo
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

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(APIError::BadRequest(
                "Project name cannot be empty".to_string(),
            ));
        }
    }

    let updated = projects_repo
        .update(project, payload.name, payload.description)
        .await
        .map_err(|e| {
            error!("Failed to update project: {}", e);
            APIError::InternalServerError("Failed to update project".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<DeleteResponse>, APIError> {
    let projects_repo = ProjectsRepo::new(state.database.clone());
    let project = projects_repo
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

    projects_repo.delete(&project.id).await.map_err(|e| {
        error!("Failed to delete project: {}", e);
        APIError::InternalServerError("Failed to delete project".to_string())
    })?;

    info!("{} deleted project {}", user.username, project.name);

    Ok(Json(DeleteResponse {
        message: "Project deleted".to_string(),
    }))
}

pub async fn create_sprint(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateSprintRequest>,
) -> Result<Json<Sprint>, APIError> {
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

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(APIError::BadRequest(
            "Sprint name cannot be empty".to_string(),
        ));
    }
    if payload.end_date < payload.start_date {
        return Err(APIError::BadRequest(
            "Sprint end date cannot be before its start date".to_string(),
        ));
    }

    let sprint = SprintsRepo::new(state.database.clone())
        .create(project.id, name, payload.start_date, payload.end_date)
        .await
        .map_err(|e| {
            error!("Failed to create sprint: {}", e);
            APIError::InternalServerError("Failed to create sprint".to_string())
        })?;

    Ok(Json(sprint))
}

pub async fn update_sprint(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateSprintRequest>,
) -> Result<Json<Sprint>, APIError> {
    let sprints_repo = SprintsRepo::new(state.database.clone());
    let sprint = sprints_repo
        .get(&sprint_id)
        .await
        .map_err(|e| {
            error!("Failed to load sprint: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Sprint not found".to_string()))?;

    let project = ProjectsRepo::new(state.database.clone())
        .get(&sprint.project_id)
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

    let start_date = payload.start_date.unwrap_or(sprint.start_date);
    let end_date = payload.end_date.unwrap_or(sprint.end_date);
    if end_date < start_date {
        return Err(APIError::BadRequest(
            "Sprint end date cannot be before its start date".to_string(),
        ));
    }

    let updated = sprints_repo
        .update(
            sprint,
            payload.name,
            payload.start_date,
            payload.end_date,
            payload.status,
        )
        .await
        .map_err(|e| {
            error!("Failed to update sprint: {}", e);
            APIError::InternalServerError("Failed to update sprint".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn delete_sprint(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<DeleteResponse>, APIError> {
    let sprints_repo = SprintsRepo::new(state.database.clone());
    let sprint = sprints_repo
        .get(&sprint_id)
        .await
        .map_err(|e| {
            error!("Failed to load sprint: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Sprint not found".to_string()))?;

    let project = ProjectsRepo::new(state.database.clone())
        .get(&sprint.project_id)
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

    sprints_repo.delete(&sprint.id).await.map_err(|e| {
        error!("Failed to delete sprint: {}", e);
        APIError::InternalServerError("Failed to delete sprint".to_string())
    })?;

    Ok(Json(DeleteResponse {
        message: "Sprint deleted".to_string(),
    }))
}
