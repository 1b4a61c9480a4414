use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    core::state::AppState,
    models::{user::Model as User, workspace_member::WorkspaceRole},
    repos::{users::UsersRepo, workspace_members::WorkspaceMembersRepo},
    utils::{
        jwt::create_jwt,
        password::{hash_password, verify_password},
        response::APIError,
    },
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    phone_number: Option<String>,
    invitation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
    invitation_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    id: String,
    username: String,
    email: String,
    phone_number: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JoinedWorkspace {
    workspace_id: String,
    role: WorkspaceRole,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    token: String,
    user: UserInfo,
    joined_workspace: Option<JoinedWorkspace>,
}

#[derive(Debug, Serialize)]
pub struct MembershipInfo {
    workspace_id: String,
    workspace_name: String,
    role: WorkspaceRole,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    user: UserInfo,
    memberships: Vec<MembershipInfo>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, APIError> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() {
        return Err(APIError::BadRequest(
            "Username and email are required".to_string(),
        ));
    }
    if payload.password.len() < 8 {
        return Err(APIError::BadRequest(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    let users_repo = UsersRepo::new(state.database.clone());

    if users_repo
        .find_by_username(&username)
        .await
        .map_err(|e| {
            error!("Failed to check username: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .is_some()
    {
        return Err(APIError::Conflict("Username is already taken".to_string()));
    }

    if users_repo
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Failed to check email: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .is_some()
    {
        return Err(APIError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        APIError::InternalServerError("Failed to create account".to_string())
    })?;

    let phone_number = payload
        .phone_number
        .filter(|phone| !phone.trim().is_empty());

    let user = users_repo
        .create(username, email, password_hash, phone_number)
        .await
        .map_err(|e| {
            error!("Failed to create user: {}", e);
            APIError::InternalServerError("Failed to create account".to_string())
        })?;

    info!("New user registered: {}", user.username);

    let token = create_jwt(
        user.email.clone(),
        user.id.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )
    .map_err(|e| {
        error!("Failed to create JWT: {}", e);
        APIError::InternalServerError("Failed to create session".to_string())
    })?;

    let joined_workspace = match payload.invitation_token {
        Some(invite_token) => redeem_invitation(&state, &invite_token, &user).await,
        None => None,
    };

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
        joined_workspace,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, APIError> {
    let users_repo = UsersRepo::new(state.database.clone());

    let user = users_repo
        .find_by_username(payload.username.trim())
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::BadRequest("Invalid username or password".to_string()))?;

    let valid = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!("Failed to verify password: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    if !valid {
        return Err(APIError::BadRequest(
            "Invalid username or password".to_string(),
        ));
    }

    info!("User logged in: {}", user.username);

    let token = create_jwt(
        user.email.clone(),
        user.id.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )
    .map_err(|e| {
        error!("Failed to create JWT: {}", e);
        APIError::InternalServerError("Failed to create session".to_string())
    })?;

    let joined_workspace = match payload.invitation_token {
        Some(invite_token) => redeem_invitation(&state, &invite_token, &user).await,
        None => None,
    };

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
        joined_workspace,
    }))
}

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<MeResponse>, APIError> {
    let members_repo = WorkspaceMembersRepo::new(state.database.clone());

    let memberships = members_repo
        .list_with_workspaces(&user.id)
        .await
        .map_err(|e| {
            error!("Failed to load memberships: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .into_iter()
        .filter_map(|(member, workspace)| {
            workspace.map(|w| MembershipInfo {
                workspace_id: w.id,
                workspace_name: w.name,
                role: member.role,
            })
        })
        .collect();

    Ok(Json(MeResponse {
        user: user.into(),
        memberships,
    }))
}

/// Signing in with an invitation token is a convenience; a bad token must
/// not fail the login itself.
async fn redeem_invitation(
    state: &AppState,
    token: &str,
    user: &User,
) -> Option<JoinedWorkspace> {
    match state.invitations().accept(token, user).await {
        Ok(invitation) => Some(JoinedWorkspace {
            workspace_id: invitation.workspace_id,
            role: invitation.role,
        }),
        Err(e) => {
            warn!("Could not redeem invitation for {}: {}", user.username, e);
            None
        }
    }
}
