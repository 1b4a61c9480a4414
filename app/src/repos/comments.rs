use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};

use crate::{
    models::comment::{self, ActiveModel, Entity as CommentEntity, Model as Comment},
    models::user::{Entity as UserEntity, Model as User},
    utils::crypto::generate_uuid,
};

pub struct CommentsRepo {
    db: DatabaseConnection,
}

impl CommentsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_for_task(
        &self,
        task_id: String,
        author_id: String,
        content: String,
    ) -> Result<Comment, DbErr> {
        self.create(Some(task_id), None, author_id, content).await
    }

    pub async fn create_for_subtask(
        &self,
        subtask_id: String,
        author_id: String,
        content: String,
    ) -> Result<Comment, DbErr> {
        self.create(None, Some(subtask_id), author_id, content).await
    }

    async fn create(
        &self,
        task_id: Option<String>,
        subtask_id: Option<String>,
        author_id: String,
        content: String,
    ) -> Result<Comment, DbErr> {
        let comment_model = ActiveModel {
            id: Set(generate_uuid()),
            task_id: Set(task_id),
            subtask_id: Set(subtask_id),
            author_id: Set(author_id),
            content: Set(content),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        let comment = comment_model.insert(&self.db).await?;

        Ok(comment)
    }

    pub async fn list_for_task(
        &self,
        task_id: &str,
    ) -> Result<Vec<(Comment, Option<User>)>, DbErr> {
        CommentEntity::find()
            .find_also_related(UserEntity)
            .filter(comment::Column::TaskId.eq(task_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn list_for_subtask(
        &self,
        subtask_id: &str,
    ) -> Result<Vec<(Comment, Option<User>)>, DbErr> {
        CommentEntity::find()
            .find_also_related(UserEntity)
            .filter(comment::Column::SubtaskId.eq(subtask_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}
