use chrono::Duration;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder,
};

use crate::{
    models::workspace_invitation::{
        self, ActiveModel, Entity as WorkspaceInvitationEntity, InvitationStatus,
        Model as WorkspaceInvitation,
    },
    models::workspace_member::WorkspaceRole,
    utils::crypto::{generate_invite_token, generate_uuid},
};

/// Pending invitations stop being acceptable this many days after issue.
pub const INVITATION_EXPIRY_DAYS: i64 = 7;

pub struct InvitationsRepo {
    db: DatabaseConnection,
}

impl InvitationsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        workspace_id: String,
        created_by: String,
        recipient_name: String,
        email: String,
        recipient_phone: Option<String>,
        role: WorkspaceRole,
    ) -> Result<WorkspaceInvitation, DbErr> {
        let now = chrono::Utc::now().naive_utc();

        let invitation_model = ActiveModel {
            id: Set(generate_uuid()),
            workspace_id: Set(workspace_id),
            recipient_name: Set(recipient_name),
            email: Set(email),
            recipient_phone: Set(recipient_phone),
            role: Set(role),
            token: Set(generate_invite_token()),
            status: Set(InvitationStatus::Pending),
            created_by: Set(created_by),
            created_at: Set(now),
            expires_at: Set(now + Duration::days(INVITATION_EXPIRY_DAYS)),
            accepted_by: Set(None),
            accepted_at: Set(None),
            revoked_at: Set(None),
        };

        let invitation = invitation_model.insert(&self.db).await?;

        Ok(invitation)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<WorkspaceInvitation>, DbErr> {
        WorkspaceInvitationEntity::find()
            .filter(workspace_invitation::Column::Token.eq(token))
            .one(&self.db)
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<WorkspaceInvitation>, DbErr> {
        WorkspaceInvitationEntity::find_by_id(id).one(&self.db).await
    }

    /// A pending, unexpired invitation for this email in this workspace.
    pub async fn find_active_pending(
        &self,
        workspace_id: &str,
        email: &str,
    ) -> Result<Option<WorkspaceInvitation>, DbErr> {
        let now = chrono::Utc::now().naive_utc();

        WorkspaceInvitationEntity::find()
            .filter(workspace_invitation::Column::WorkspaceId.eq(workspace_id))
            .filter(workspace_invitation::Column::Email.eq(email))
            .filter(workspace_invitation::Column::Status.eq(InvitationStatus::Pending))
            .filter(workspace_invitation::Column::ExpiresAt.gte(now))
            .one(&self.db)
            .await
    }

    pub async fn list_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<WorkspaceInvitation>, DbErr> {
        WorkspaceInvitationEntity::find()
            .filter(workspace_invitation::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(workspace_invitation::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn revoke(
        &self,
        invitation: WorkspaceInvitation,
    ) -> Result<WorkspaceInvitation, DbErr> {
        let mut active: ActiveModel = invitation.into();
        active.status = Set(InvitationStatus::Revoked);
        active.revoked_at = Set(Some(chrono::Utc::now().naive_utc()));

        active.update(&self.db).await
    }

    /// Flip every lapsed pending invitation of the workspace to expired.
    /// Returns how many rows were affected.
    pub async fn sweep_expired(&self, workspace_id: &str) -> Result<u64, DbErr> {
        let now = chrono::Utc::now().naive_utc();

        let result = WorkspaceInvitationEntity::update_many()
            .col_expr(
                workspace_invitation::Column::Status,
                Expr::value(InvitationStatus::Expired),
            )
            .filter(workspace_invitation::Column::WorkspaceId.eq(workspace_id))
            .filter(workspace_invitation::Column::Status.eq(InvitationStatus::Pending))
            .filter(workspace_invitation::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
