use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::{
    models::subtask::{self, ActiveModel, Entity as SubtaskEntity, Model as Subtask},
    models::subtask_assignee::{self, Entity as SubtaskAssigneeEntity},
    models::task::{Entity as TaskEntity, Model as Task, TaskStatus},
    models::user::{Entity as UserEntity, Model as User},
    utils::crypto::generate_uuid,
};

pub struct SubtasksRepo {
    db: DatabaseConnection,
}

impl SubtasksRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        task_id: String,
        title: String,
        description: Option<String>,
        due_date: Option<chrono::NaiveDate>,
        created_by: String,
    ) -> Result<Subtask, DbErr> {
        let subtask_model = ActiveModel {
            id: Set(generate_uuid()),
            task_id: Set(task_id),
            title: Set(title),
            description: Set(description),
            status: Set(TaskStatus::Todo),
            due_date: Set(due_date),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(None),
        };

        let subtask = subtask_model.insert(&self.db).await?;

        Ok(subtask)
    }

    pub async fn get_with_task(&self, id: &str) -> Result<Option<(Subtask, Option<Task>)>, DbErr> {
        SubtaskEntity::find_by_id(id)
            .find_also_related(TaskEntity)
            .one(&self.db)
            .await
    }

    pub async fn list_for_task(&self, task_id: &str) -> Result<Vec<Subtask>, DbErr> {
        SubtaskEntity::find()
            .filter(subtask::Column::TaskId.eq(task_id))
            .order_by_asc(subtask::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn update(
        &self,
        subtask: Subtask,
        title: Option<String>,
        description: Option<String>,
        due_date: Option<Option<chrono::NaiveDate>>,
    ) -> Result<Subtask, DbErr> {
        let mut active: ActiveModel = subtask.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        if let Some(due_date) = due_date {
            active.due_date = Set(due_date);
        }
        active.updated_at = Set(Some(chrono::Utc::now().naive_utc()));

        active.update(&self.db).await
    }

    pub async fn change_status(
        &self,
        subtask: Subtask,
        status: TaskStatus,
    ) -> Result<Subtask, DbErr> {
        let mut active: ActiveModel = subtask.into();
        active.status = Set(status);
        active.updated_at = Set(Some(chrono::Utc::now().naive_utc()));

        active.update(&self.db).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DbErr> {
        SubtaskEntity::delete_by_id(id).exec(&self.db).await?;

        Ok(())
    }

    /// Replaces the assignee set, returning the ids that were newly added
    /// so callers can notify just those users.
    pub async fn set_assignees(
        &self,
        subtask_id: &str,
        user_ids: Vec<String>,
    ) -> Result<Vec<String>, DbErr> {
        let current: Vec<String> = SubtaskAssigneeEntity::find()
            .filter(subtask_assignee::Column::SubtaskId.eq(subtask_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| row.user_id)
            .collect();

        let removed: Vec<String> = current
            .iter()
            .filter(|id| !user_ids.contains(id))
            .cloned()
            .collect();
        if !removed.is_empty() {
            SubtaskAssigneeEntity::delete_many()
                .filter(subtask_assignee::Column::SubtaskId.eq(subtask_id))
                .filter(subtask_assignee::Column::UserId.is_in(removed))
                .exec(&self.db)
                .await?;
        }

        let mut added = Vec::new();
        for user_id in user_ids {
            if current.contains(&user_id) {
                continue;
            }

            subtask_assignee::ActiveModel {
                id: Set(generate_uuid()),
                subtask_id: Set(subtask_id.to_string()),
                user_id: Set(user_id.clone()),
                assigned_at: Set(chrono::Utc::now().naive_utc()),
            }
            .insert(&self.db)
            .await?;

            added.push(user_id);
        }

        Ok(added)
    }

    pub async fn assignees(&self, subtask_id: &str) -> Result<Vec<User>, DbErr> {
        let rows = SubtaskAssigneeEntity::find()
            .find_also_related(UserEntity)
            .filter(subtask_assignee::Column::SubtaskId.eq(subtask_id))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().filter_map(|(_, user)| user).collect())
    }

    pub async fn is_assignee(&self, subtask_id: &str, user_id: &str) -> Result<bool, DbErr> {
        let matches = SubtaskAssigneeEntity::find()
            .filter(subtask_assignee::Column::SubtaskId.eq(subtask_id))
            .filter(subtask_assignee::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(matches > 0)
    }
}
