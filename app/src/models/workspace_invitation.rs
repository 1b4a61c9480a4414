use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::workspace_member::WorkspaceRole;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "revoked")]
    Revoked,
    #[sea_orm(string_value = "expired")]
    Expired,
}

#[derive(Debug, Clone, DeriveEntityModel, PartialEq)]
#[sea_orm(table_name = "workspace_invitations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: String,
    pub workspace_id: String,
    pub recipient_name: String,
    pub email: String,
    pub recipient_phone: Option<String>,
    pub role: WorkspaceRole,
    pub token: String,
    pub status: InvitationStatus,
    pub created_by: String,
    pub created_at: DateTime,
    pub expires_at: DateTime,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<DateTime>,
    pub revoked_at: Option<DateTime>,
}

impl Model {
    /// Expired either by a sweep or because the pending window lapsed.
    pub fn has_expired(&self, now: DateTime) -> bool {
        match self.status {
            InvitationStatus::Expired => true,
            InvitationStatus::Pending => self.expires_at < now,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspace::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspace::Column::Id",
        on_delete = "Cascade"
    )]
    Workspace,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AcceptedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Acceptor,
}

impl Related<super::workspace::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspace.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
