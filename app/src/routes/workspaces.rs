use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::{
    core::state::AppState,
    handlers::{
        invitations::{issue_invitation, list_invitations, revoke_invitation, sweep_invitations},
        projects::{create_project, list_projects},
        workspaces::{
            add_member, change_member_role, create_workspace, delete_workspace, get_workspace,
            list_workspaces, remove_member, update_workspace,
        },
    },
};

pub fn workspace_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_workspaces))
        .route("/", post(create_workspace))
        .route("/:workspace_id", get(get_workspace))
        .route("/:workspace_id", patch(update_workspace))
        .route("/:workspace_id", delete(delete_workspace))
        // Membership management
        .route("/:workspace_id/members", post(add_member))
        .route(
            "/:workspace_id/members/:member_id",
            patch(change_member_role),
        )
        .route("/:workspace_id/members/:member_id", delete(remove_member))
        // Invitation lifecycle, admin side
        .route("/:workspace_id/invitations", get(list_invitations))
        .route("/:workspace_id/invitations", post(issue_invitation))
        .route("/:workspace_id/invitations/sweep", post(sweep_invitations))
        .route(
            "/:workspace_id/invitations/:invitation_id/revoke",
            post(revoke_invitation),
        )
        // Projects scoped to the workspace
        .route("/:workspace_id/projects", get(list_projects))
        .route("/:workspace_id/projects", post(create_project))
}
