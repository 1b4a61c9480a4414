use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::{
    models::user::{self, Entity as UserEntity, Model as User},
    models::workspace::{Entity as WorkspaceEntity, Model as Workspace},
    models::workspace_member::{
        self, ActiveModel, Entity as WorkspaceMemberEntity, Model as WorkspaceMember,
        WorkspaceRole,
    },
    utils::crypto::generate_uuid,
};

pub struct WorkspaceMembersRepo {
    db: DatabaseConnection,
}

impl WorkspaceMembersRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn add(
        &self,
        workspace_id: String,
        user_id: String,
        role: WorkspaceRole,
    ) -> Result<WorkspaceMember, DbErr> {
        let member_model = ActiveModel {
            id: Set(generate_uuid()),
            workspace_id: Set(workspace_id),
            user_id: Set(user_id),
            role: Set(role),
            joined_at: Set(chrono::Utc::now().naive_utc()),
        };

        let member = member_model.insert(&self.db).await?;

        Ok(member)
    }

    pub async fn get(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceMember>, DbErr> {
        WorkspaceMemberEntity::find()
            .filter(workspace_member::Column::WorkspaceId.eq(workspace_id))
            .filter(workspace_member::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<WorkspaceMember>, DbErr> {
        WorkspaceMemberEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn list_with_users(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<(WorkspaceMember, Option<User>)>, DbErr> {
        WorkspaceMemberEntity::find()
            .find_also_related(UserEntity)
            .filter(workspace_member::Column::WorkspaceId.eq(workspace_id))
            .order_by_asc(workspace_member::Column::Role)
            .order_by_asc(workspace_member::Column::JoinedAt)
            .all(&self.db)
            .await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceMember>, DbErr> {
        WorkspaceMemberEntity::find()
            .filter(workspace_member::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
    }

    pub async fn list_with_workspaces(
        &self,
        user_id: &str,
    ) -> Result<Vec<(WorkspaceMember, Option<Workspace>)>, DbErr> {
        WorkspaceMemberEntity::find()
            .find_also_related(WorkspaceEntity)
            .filter(workspace_member::Column::UserId.eq(user_id))
            .order_by_asc(workspace_member::Column::JoinedAt)
            .all(&self.db)
            .await
    }

    pub async fn count_for_workspace(&self, workspace_id: &str) -> Result<u64, DbErr> {
        WorkspaceMemberEntity::find()
            .filter(workspace_member::Column::WorkspaceId.eq(workspace_id))
            .count(&self.db)
            .await
    }

    /// Admin count backs the last-admin guard on role changes and removals.
    pub async fn count_admins(&self, workspace_id: &str) -> Result<u64, DbErr> {
        WorkspaceMemberEntity::find()
            .filter(workspace_member::Column::WorkspaceId.eq(workspace_id))
            .filter(workspace_member::Column::Role.eq(WorkspaceRole::Admin))
            .count(&self.db)
            .await
    }

    /// True when some member of the workspace already owns this email.
    pub async fn is_email_member(&self, workspace_id: &str, email: &str) -> Result<bool, DbErr> {
        let matches = WorkspaceMemberEntity::find()
            .join(JoinType::InnerJoin, workspace_member::Relation::User.def())
            .filter(workspace_member::Column::WorkspaceId.eq(workspace_id))
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(matches > 0)
    }

    pub async fn change_role(
        &self,
        member: WorkspaceMember,
        role: WorkspaceRole,
    ) -> Result<WorkspaceMember, DbErr> {
        let mut active: ActiveModel = member.into();
        active.role = Set(role);

        active.update(&self.db).await
    }

    pub async fn remove(&self, id: &str) -> Result<(), DbErr> {
        WorkspaceMemberEntity::delete_by_id(id)
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
