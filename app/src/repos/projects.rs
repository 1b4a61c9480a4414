use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::{
    models::project::{self, ActiveModel, Entity as ProjectEntity, Model as Project},
    utils::crypto::generate_uuid,
};

pub struct ProjectsRepo {
    db: DatabaseConnection,
}

impl ProjectsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        workspace_id: String,
        name: String,
        description: Option<String>,
        created_by: String,
    ) -> Result<Project, DbErr> {
        let project_model = ActiveModel {
            id: Set(generate_uuid()),
            workspace_id: Set(workspace_id),
            name: Set(name),
            description: Set(description),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(None),
        };

        let project = project_model.insert(&self.db).await?;

        Ok(project)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Project>, DbErr> {
        ProjectEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn list_for_workspace(&self, workspace_id: &str) -> Result<Vec<Project>, DbErr> {
        ProjectEntity::find()
            .filter(project::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(project::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn update(
        &self,
        project: Project,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Project, DbErr> {
        let mut active: ActiveModel = project.into();
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
        ProjectEntity::delete_by_id(id).exec(&self.db).await?;

        Ok(())
    }

    pub async fn count_for_workspace(&self, workspace_id: &str) -> Result<u64, DbErr> {
        ProjectEntity::find()
            .filter(project::Column::WorkspaceId.eq(workspace_id))
            .count(&self.db)
            .await
    }

    pub async fn count_in_workspaces(&self, workspace_ids: &[String]) -> Result<u64, DbErr> {
        if workspace_ids.is_empty() {
            return Ok(0);
        }

        ProjectEntity::find()
            .filter(project::Column::WorkspaceId.is_in(workspace_ids.to_vec()))
            .count(&self.db)
            .await
    }
}
