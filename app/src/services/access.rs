use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::error;

use crate::{
    models::workspace_member::{Model as WorkspaceMember, WorkspaceRole},
    repos::workspace_members::WorkspaceMembersRepo,
    utils::response::APIError,
};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("You are not a member of this workspace")]
    NotMember,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<AccessError> for APIError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotMember | AccessError::Forbidden => {
                APIError::Forbidden(err.to_string())
            }
            AccessError::Db(e) => {
                error!("Access check failed: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            }
        }
    }
}

/// Role checks for workspace scoped endpoints. Every protected resource
/// hangs off a workspace, so permissions always resolve to a membership.
pub struct AccessControl {
    db: DatabaseConnection,
}

impl AccessControl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn membership(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceMember>, DbErr> {
        WorkspaceMembersRepo::new(self.db.clone())
            .get(workspace_id, user_id)
            .await
    }

    pub async fn require_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMember, AccessError> {
        self.membership(workspace_id, user_id)
            .await?
            .ok_or(AccessError::NotMember)
    }

    pub async fn require_role(
        &self,
        workspace_id: &str,
        user_id: &str,
        allowed: &[WorkspaceRole],
    ) -> Result<WorkspaceMember, AccessError> {
        let member = self.require_member(workspace_id, user_id).await?;

        if !allowed.contains(&member.role) {
            return Err(AccessError::Forbidden);
        }

        Ok(member)
    }

    pub async fn require_admin(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMember, AccessError> {
        self.require_role(workspace_id, user_id, &[WorkspaceRole::Admin])
            .await
    }

    /// Admins and project managers share most write permissions.
    pub async fn require_manager(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMember, AccessError> {
        self.require_role(
            workspace_id,
            user_id,
            &[WorkspaceRole::Admin, WorkspaceRole::Pm],
        )
        .await
    }
}
