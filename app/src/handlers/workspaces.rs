use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    core::state::AppState,
    models::{
        project::Model as Project,
        user::Model as User,
        workspace::Model as Workspace,
        workspace_member::{Model as WorkspaceMember, WorkspaceRole},
    },
    repos::{
        projects::ProjectsRepo, users::UsersRepo, workspace_members::WorkspaceMembersRepo,
        workspaces::WorkspacesRepo,
    },
    utils::response::APIError,
};

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceRequest {
    name: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkspaceRequest {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    email: String,
    role: WorkspaceRole,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    role: WorkspaceRole,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceSummary {
    id: String,
    name: String,
    description: Option<String>,
    role: WorkspaceRole,
    member_count: u64,
    project_count: u64,
    created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceListResponse {
    workspaces: Vec<WorkspaceSummary>,
}

#[derive(Debug, Serialize)]
pub struct MemberInfo {
    id: String,
    user_id: String,
    username: String,
    email: String,
    role: WorkspaceRole,
    joined_at: NaiveDateTime,
}

impl MemberInfo {
    fn from_pair(member: WorkspaceMember, user: User) -> Self {
        Self {
            id: member.id,
            user_id: user.id,
            username: user.username,
            email: user.email,
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkspaceDetail {
    id: String,
    name: String,
    description: Option<String>,
    role: WorkspaceRole,
    created_at: NaiveDateTime,
    members: Vec<MemberInfo>,
    projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: String,
}

pub async fn list_workspaces(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<WorkspaceListResponse>, APIError> {
    let members_repo = WorkspaceMembersRepo::new(state.database.clone());
    let projects_repo = ProjectsRepo::new(state.database.clone());

    let memberships = members_repo
        .list_with_workspaces(&user.id)
        .await
        .map_err(|e| {
            error!("Failed to list workspaces: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    let mut workspaces = Vec::with_capacity(memberships.len());
    for (member, workspace) in memberships {
        let Some(workspace) = workspace else {
            continue;
        };

        let member_count = members_repo
            .count_for_workspace(&workspace.id)
            .await
            .map_err(|e| {
                error!("Failed to count members: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            })?;
        let project_count = projects_repo
            .count_for_workspace(&workspace.id)
            .await
            .map_err(|e| {
                error!("Failed to count projects: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            })?;

        workspaces.push(WorkspaceSummary {
            id: workspace.id,
            name: workspace.name,
            description: workspace.description,
            role: member.role,
            member_count,
            project_count,
            created_at: workspace.created_at,
        });
    }

    Ok(Json(WorkspaceListResponse { workspaces }))
}

pub async fn create_workspace(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> Result<Json<WorkspaceSummary>, APIError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(APIError::BadRequest(
            "Workspace name cannot be empty".to_string(),
        ));
    }

    let description = payload
        .description
        .filter(|d| !d.trim().is_empty());

    let (workspace, member) = WorkspacesRepo::new(state.database.clone())
        .create(name, description, user.id.clone())
        .await
        .map_err(|e| {
            error!("Failed to create workspace: {}", e);
            APIError::InternalServerError("Failed to create workspace".to_string())
        })?;

    info!("{} created workspace {}", user.username, workspace.name);

    Ok(Json(WorkspaceSummary {
        id: workspace.id,
        name: workspace.name,
        description: workspace.description,
        role: member.role,
        member_count: 1,
        project_count: 0,
        created_at: workspace.created_at,
    }))
}

pub async fn get_workspace(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<WorkspaceDetail>, APIError> {
    let membership = state
        .access()
        .require_member(&workspace_id, &user.id)
        .await?;

    let workspace = WorkspacesRepo::new(state.database.clone())
        .get(&workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to load workspace: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Workspace not found".to_string()))?;

    let members = WorkspaceMembersRepo::new(state.database.clone())
        .list_with_users(&workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to load members: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .into_iter()
        .filter_map(|(member, user)| user.map(|u| MemberInfo::from_pair(member, u)))
        .collect();

    let projects = ProjectsRepo::new(state.database.clone())
        .list_for_workspace(&workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to load projects: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    Ok(Json(WorkspaceDetail {
        id: workspace.id,
        name: workspace.name,
        description: workspace.description,
        role: membership.role,
        created_at: workspace.created_at,
        members,
        projects,
    }))
}

pub async fn update_workspace(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateWorkspaceRequest>,
) -> Result<Json<Workspace>, APIError> {
    state.access().require_admin(&workspace_id, &user.id).await?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(APIError::BadRequest(
                "Workspace name cannot be empty".to_string(),
            ));
        }
    }

    let workspaces_repo = WorkspacesRepo::new(state.database.clone());
    let workspace = workspaces_repo
        .get(&workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to load workspace: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Workspace not found".to_string()))?;

    let updated = workspaces_repo
        .update(workspace, payload.name, payload.description)
        .await
        .map_err(|e| {
            error!("Failed to update workspace: {}", e);
            APIError::InternalServerError("Failed to update workspace".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn delete_workspace(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<MessageResponse>, APIError> {
    state.access().require_admin(&workspace_id, &user.id).await?;

    WorkspacesRepo::new(state.database.clone())
        .delete(&workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to delete workspace: {}", e);
            APIError::InternalServerError("Failed to delete workspace".to_string())
        })?;

    info!("{} deleted workspace {}", user.username, workspace_id);

    Ok(Json(MessageResponse {
        message: "Workspace deleted".to_string(),
    }))
}

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<Json<MemberInfo>, APIError> {
    state.access().require_admin(&workspace_id, &user.id).await?;

    let email = payload.email.trim().to_lowercase();
    let target = UsersRepo::new(state.database.clone())
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("No user found with that email".to_string()))?;

    let members_repo = WorkspaceMembersRepo::new(state.database.clone());
    if members_repo
        .get(&workspace_id, &target.id)
        .await
        .map_err(|e| {
            error!("Failed to check membership: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .is_some()
    {
        return Err(APIError::Conflict(
            "User is already a member of this workspace".to_string(),
        ));
    }

    let member = members_repo
        .add(workspace_id.clone(), target.id.clone(), payload.role)
        .await
        .map_err(|e| {
            error!("Failed to add member: {}", e);
            APIError::InternalServerError("Failed to add member".to_string())
        })?;

    info!(
        "{} added {} to workspace {}",
        user.username, target.username, workspace_id
    );

    Ok(Json(MemberInfo::from_pair(member, target)))
}

pub async fn change_member_role(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, member_id)): Path<(String, String)>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<WorkspaceMember>, APIError> {
    state.access().require_admin(&workspace_id, &user.id).await?;

    let members_repo = WorkspaceMembersRepo::new(state.database.clone());
    let target = members_repo
        .get_by_id(&member_id)
        .await
        .map_err(|e| {
            error!("Failed to load member: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .filter(|m| m.workspace_id == workspace_id)
        .ok_or_else(|| APIError::NotFound("Member not found".to_string()))?;

    if target.role == WorkspaceRole::Admin && payload.role != WorkspaceRole::Admin {
        let admins = members_repo.count_admins(&workspace_id).await.map_err(|e| {
            error!("Failed to count admins: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;
        if admins <= 1 {
            return Err(APIError::Conflict(
                "Cannot remove the last admin from the workspace".to_string(),
            ));
        }
    }

    let updated = members_repo
        .change_role(target, payload.role)
        .await
        .map_err(|e| {
            error!("Failed to change role: {}", e);
            APIError::InternalServerError("Failed to change role".to_string())
        })?;

    Ok(Json(updated))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, member_id)): Path<(String, String)>,
    Extension(user): Extension<User>,
) -> Result<Json<MessageResponse>, APIError> {
    let members_repo = WorkspaceMembersRepo::new(state.database.clone());

    let target = members_repo
        .get_by_id(&member_id)
        .await
        .map_err(|e| {
            error!("Failed to load member: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .filter(|m| m.workspace_id == workspace_id)
        .ok_or_else(|| APIError::NotFound("Member not found".to_string()))?;

    // Leaving the workspace yourself does not need admin rights.
    if target.user_id != user.id {
        state.access().require_admin(&workspace_id, &user.id).await?;
    }

    if target.role == WorkspaceRole::Admin {
        let admins = members_repo.count_admins(&workspace_id).await.map_err(|e| {
            error!("Failed to count admins: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;
        if admins <= 1 {
            return Err(APIError::Conflict(
                "Cannot remove the last admin from the workspace".to_string(),
            ));
        }
    }

    let leaving = target.user_id == user.id;
    members_repo.remove(&target.id).await.map_err(|e| {
        error!("Failed to remove member: {}", e);
        APIError::InternalServerError("Failed to remove member".to_string())
    })?;

    let message = if leaving {
        "You left the workspace".to_string()
    } else {
        "Member removed".to_string()
    };

    Ok(Json(MessageResponse { message }))
}
