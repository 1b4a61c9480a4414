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
    models::{
        user::Model as User,
        workspace_invitation::{InvitationStatus, Model as WorkspaceInvitation},
        workspace_member::WorkspaceRole,
    },
    repos::{invitations::InvitationsRepo, users::UsersRepo, workspaces::WorkspacesRepo},
    services::invitations::InvitationResolution,
    utils::response::APIError,
};

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    recipient_name: String,
    email: String,
    recipient_phone: Option<String>,
    role: Option<WorkspaceRole>,
}

#[derive(Debug, Serialize)]
pub struct InvitationInfo {
    id: String,
    recipient_name: String,
    email: String,
    recipient_phone: Option<String>,
    role: WorkspaceRole,
    status: InvitationStatus,
    link: String,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
    accepted_at: Option<NaiveDateTime>,
    revoked_at: Option<NaiveDateTime>,
}

impl InvitationInfo {
    /// A lapsed pending invitation reads as expired even before the
    /// sweep has rewritten its row.
    fn build(invitation: WorkspaceInvitation, link: String, now: NaiveDateTime) -> Self {
        let status = if invitation.has_expired(now) {
            InvitationStatus::Expired
        } else {
            invitation.status
        };

        Self {
            id: invitation.id,
            recipient_name: invitation.recipient_name,
            email: invitation.email,
            recipient_phone: invitation.recipient_phone,
            role: invitation.role,
            status,
            link,
            created_at: invitation.created_at,
            expires_at: invitation.expires_at,
            accepted_at: invitation.accepted_at,
            revoked_at: invitation.revoked_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssueResponse {
    message: String,
    invitation: InvitationInfo,
}

#[derive(Debug, Serialize)]
pub struct InvitationListResponse {
    pending: Vec<InvitationInfo>,
    expired: Vec<InvitationInfo>,
    accepted: Vec<InvitationInfo>,
    revoked: Vec<InvitationInfo>,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    message: String,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    expired: u64,
}

#[derive(Debug, Serialize)]
pub struct InvitationPreview {
    workspace_name: String,
    inviter_name: String,
    recipient_name: String,
    email: String,
    role: WorkspaceRole,
    expires_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    message: String,
    workspace_id: String,
    role: WorkspaceRole,
}

pub async fn issue_invitation(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
    Json(payload): Json<InviteRequest>,
) -> Result<Json<IssueResponse>, APIError> {
    let recipient_name = payload.recipient_name.trim().to_string();
    if recipient_name.is_empty() {
        return Err(APIError::BadRequest(
            "Recipient name is required".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(APIError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let service = state.invitations();
    let invitation = service
        .issue(
            &workspace_id,
            &user,
            recipient_name,
            email,
            payload.recipient_phone,
            payload.role.unwrap_or(WorkspaceRole::Member),
        )
        .await?;

    let link = service.invitation_link(&invitation.token);
    let message = format!("Invitation sent to {}", invitation.email);
    let info = InvitationInfo::build(invitation, link, chrono::Utc::now().naive_utc());

    Ok(Json(IssueResponse {
        message,
        invitation: info,
    }))
}

pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<InvitationListResponse>, APIError> {
    state.access().require_admin(&workspace_id, &user.id).await?;

    let invitations = InvitationsRepo::new(state.database.clone())
        .list_for_workspace(&workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to list invitations: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    let service = state.invitations();
    let now = chrono::Utc::now().naive_utc();

    let mut response = InvitationListResponse {
        pending: Vec::new(),
        expired: Vec::new(),
        accepted: Vec::new(),
        revoked: Vec::new(),
    };

    for invitation in invitations {
        let link = service.invitation_link(&invitation.token);
        let info = InvitationInfo::build(invitation, link, now);

        match info.status {
            InvitationStatus::Pending => response.pending.push(info),
            InvitationStatus::Expired => response.expired.push(info),
            InvitationStatus::Accepted => response.accepted.push(info),
            InvitationStatus::Revoked => response.revoked.push(info),
        }
    }

    Ok(Json(response))
}

pub async fn revoke_invitation(
    State(state): State<Arc<AppState>>,
    Path((workspace_id, invitation_id)): Path<(String, String)>,
    Extension(user): Extension<User>,
) -> Result<Json<RevokeResponse>, APIError> {
    let revoked = state
        .invitations()
        .revoke(&workspace_id, &invitation_id, &user)
        .await?;

    Ok(Json(RevokeResponse {
        message: format!("Invitation for {} revoked", revoked.email),
    }))
}

pub async fn sweep_invitations(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<SweepResponse>, APIError> {
    let expired = state
        .invitations()
        .sweep_expired(&workspace_id, &user)
        .await?;

    Ok(Json(SweepResponse { expired }))
}

/// Public preview of what an invitation link offers, shown before the
/// visitor registers or signs in.
pub async fn resolve_invitation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<InvitationPreview>, APIError> {
    let resolution = state.invitations().resolve(&token).await.map_err(|e| {
        error!("Failed to resolve invitation: {}", e);
        APIError::InternalServerError("Something went wrong".to_string())
    })?;

    let invitation = match resolution {
        InvitationResolution::Valid(invitation) => invitation,
        InvitationResolution::Expired => {
            return Err(APIError::Gone("This invitation has expired".to_string()))
        }
        InvitationResolution::AlreadyUsed => {
            return Err(APIError::Conflict(
                "This invitation has already been used".to_string(),
            ))
        }
        InvitationResolution::NotFound => {
            return Err(APIError::NotFound("Invitation not found".to_string()))
        }
    };

    let workspace = WorkspacesRepo::new(state.database.clone())
        .get(&invitation.workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to load workspace: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Invitation not found".to_string()))?;

    let inviter = UsersRepo::new(state.database.clone())
        .get_by_id(&invitation.created_by)
        .await
        .map_err(|e| {
            error!("Failed to load inviter: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?;

    Ok(Json(InvitationPreview {
        workspace_name: workspace.name,
        inviter_name: inviter.username,
        recipient_name: invitation.recipient_name,
        email: invitation.email,
        role: invitation.role,
        expires_at: invitation.expires_at,
    }))
}

pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<AcceptResponse>, APIError> {
    let invitation = state.invitations().accept(&token, &user).await?;

    let workspace_name = WorkspacesRepo::new(state.database.clone())
        .get(&invitation.workspace_id)
        .await
        .map_err(|e| {
            error!("Failed to load workspace: {}", e);
            APIError::InternalServerError("Something went wrong".to_string())
        })?
        .map(|w| w.name)
        .unwrap_or_else(|| "your new workspace".to_string());

    Ok(Json(AcceptResponse {
        message: format!("Welcome to {}", workspace_name),
        workspace_id: invitation.workspace_id,
        role: invitation.role,
    }))
}
