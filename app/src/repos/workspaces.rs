use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait, TransactionTrait,
};

use crate::{
    models::workspace::{ActiveModel, Entity as WorkspaceEntity, Model as Workspace},
    models::workspace_member::{self, Model as WorkspaceMember, WorkspaceRole},
    utils::crypto::generate_uuid,
};

pub struct WorkspacesRepo {
    db: DatabaseConnection,
}

impl WorkspacesRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates the workspace and its admin membership in one transaction,
    /// so a workspace can never exist without at least one admin.
    pub async fn create(
        &self,
        name: String,
        description: Option<String>,
        created_by: String,
    ) -> Result<(Workspace, WorkspaceMember), DbErr> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().naive_utc();

        let workspace = ActiveModel {
            id: Set(generate_uuid()),
            name: Set(name),
            description: Set(description),
            created_by: Set(created_by.clone()),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let member = workspace_member::ActiveModel {
            id: Set(generate_uuid()),
            workspace_id: Set(workspace.id.clone()),
            user_id: Set(created_by),
            role: Set(WorkspaceRole::Admin),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok((workspace, member))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Workspace>, DbErr> {
        WorkspaceEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn update(
        &self,
        workspace: Workspace,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Workspace, DbErr> {
        let mut active: ActiveModel = workspace.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Some(chrono::Utc::now().naive_utc()));

        active.update(&self.db).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DbErr> {
        WorkspaceEntity::delete_by_id(id).exec(&self.db).await?;

        Ok(())
    }
}
