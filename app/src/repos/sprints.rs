use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::{
    models::sprint::{self, ActiveModel, Entity as SprintEntity, Model as Sprint, SprintStatus},
    utils::crypto::generate_uuid,
};

pub struct SprintsRepo {
    db: DatabaseConnection,
}

impl SprintsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        project_id: String,
        name: String,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
    ) -> Result<Sprint, DbErr> {
        let sprint_model = ActiveModel {
            id: Set(generate_uuid()),
            project_id: Set(project_id),
            name: Set(name),
            start_date: Set(start_date),
            end_date: Set(end_date),
            status: Set(SprintStatus::Upcoming),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        let sprint = sprint_model.insert(&self.db).await?;

        Ok(sprint)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Sprint>, DbErr> {
        SprintEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn list_for_project(&self, project_id: &str) -> Result<Vec<Sprint>, DbErr> {
        SprintEntity::find()
            .filter(sprint::Column::ProjectId.eq(project_id))
            .order_by_asc(sprint::Column::StartDate)
            .all(&self.db)
            .await
    }

    pub async fn update(
        &self,
        sprint: Sprint,
        name: Option<String>,
        start_date: Option<chrono::NaiveDate>,
        end_date: Option<chrono::NaiveDate>,
        status: Option<SprintStatus>,
    ) -> Result<Sprint, DbErr> {
        let mut active: ActiveModel = sprint.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(start_date) = start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = end_date {
            active.end_date = Set(end_date);
        }
        if let Some(status) = status {
            active.status = Set(status);
        }

        active.update(&self.db).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DbErr> {
        SprintEntity::delete_by_id(id).exec(&self.db).await?;

        Ok(())
    }
}
