use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::{
    models::project::{self, Entity as ProjectEntity, Model as Project},
    models::task::{self, ActiveModel, Entity as TaskEntity, Model as Task, TaskStatus},
    models::task_assignee::{self, Entity as TaskAssigneeEntity, Model as TaskAssignee},
    models::user::{Entity as UserEntity, Model as User},
    utils::crypto::generate_uuid,
};

/// Completion ratio as a whole percentage, 0 when there is nothing to count.
pub fn progress_percentage(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }

    ((completed * 100) / total) as u8
}

pub struct TasksRepo {
    db: DatabaseConnection,
}

impl TasksRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        project_id: String,
        sprint_id: Option<String>,
        title: String,
        description: Option<String>,
        due_date: Option<chrono::NaiveDate>,
        created_by: String,
    ) -> Result<Task, DbErr> {
        let task_model = ActiveModel {
            id: Set(generate_uuid()),
            project_id: Set(project_id),
            sprint_id: Set(sprint_id),
            title: Set(title),
            description: Set(description),
            status: Set(TaskStatus::Todo),
            due_date: Set(due_date),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(None),
        };

        let task = task_model.insert(&self.db).await?;

        Ok(task)
    }

    pub async fn get_with_project(&self, id: &str) -> Result<Option<(Task, Option<Project>)>, DbErr> {
        TaskEntity::find_by_id(id)
            .find_also_related(ProjectEntity)
            .one(&self.db)
            .await
    }

    pub async fn list_for_project(&self, project_id: &str) -> Result<Vec<Task>, DbErr> {
        TaskEntity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn update(
        &self,
        task: Task,
        title: Option<String>,
        description: Option<String>,
        sprint_id: Option<Option<String>>,
        due_date: Option<Option<chrono::NaiveDate>>,
    ) -> Result<Task, DbErr> {
        let mut active: ActiveModel = task.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        if let Some(sprint_id) = sprint_id {
            active.sprint_id = Set(sprint_id);
        }
        if let Some(due_date) = due_date {
            active.due_date = Set(due_date);
        }
        active.updated_at = Set(Some(chrono::Utc::now().naive_utc()));

        active.update(&self.db).await
    }

    pub async fn change_status(&self, task: Task, status: TaskStatus) -> Result<Task, DbErr> {
        let mut active: ActiveModel = task.into();
        active.status = Set(status);
        active.updated_at = Set(Some(chrono::Utc::now().naive_utc()));

        active.update(&self.db).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DbErr> {
        TaskEntity::delete_by_id(id).exec(&self.db).await?;

        Ok(())
    }

    /// Idempotent: returns None when the user is already on the task.
    pub async fn assign(
        &self,
        task_id: &str,
        user_id: &str,
    ) -> Result<Option<TaskAssignee>, DbErr> {
        let existing = TaskAssigneeEntity::find()
            .filter(task_assignee::Column::TaskId.eq(task_id))
            .filter(task_assignee::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Ok(None);
        }

        let assignee = task_assignee::ActiveModel {
            id: Set(generate_uuid()),
            task_id: Set(task_id.to_string()),
            user_id: Set(user_id.to_string()),
            assigned_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(&self.db)
        .await?;

        Ok(Some(assignee))
    }

    pub async fn unassign(&self, task_id: &str, user_id: &str) -> Result<bool, DbErr> {
        let result = TaskAssigneeEntity::delete_many()
            .filter(task_assignee::Column::TaskId.eq(task_id))
            .filter(task_assignee::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn assignees(&self, task_id: &str) -> Result<Vec<User>, DbErr> {
        let rows = TaskAssigneeEntity::find()
            .find_also_related(UserEntity)
            .filter(task_assignee::Column::TaskId.eq(task_id))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().filter_map(|(_, user)| user).collect())
    }

    pub async fn is_assignee(&self, task_id: &str, user_id: &str) -> Result<bool, DbErr> {
        let matches = TaskAssigneeEntity::find()
            .filter(task_assignee::Column::TaskId.eq(task_id))
            .filter(task_assignee::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(matches > 0)
    }

    pub async fn count_for_project(&self, project_id: &str) -> Result<u64, DbErr> {
        TaskEntity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .count(&self.db)
            .await
    }

    pub async fn count_done_for_project(&self, project_id: &str) -> Result<u64, DbErr> {
        TaskEntity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .filter(task::Column::Status.eq(TaskStatus::Done))
            .count(&self.db)
            .await
    }

    pub async fn count_in_workspaces(
        &self,
        workspace_ids: &[String],
        status: Option<TaskStatus>,
    ) -> Result<u64, DbErr> {
        if workspace_ids.is_empty() {
            return Ok(0);
        }

        let mut query = TaskEntity::find()
            .join(JoinType::InnerJoin, task::Relation::Project.def())
            .filter(project::Column::WorkspaceId.is_in(workspace_ids.to_vec()));
        if let Some(status) = status {
            query = query.filter(task::Column::Status.eq(status));
        }

        query.count(&self.db).await
    }

    pub async fn count_overdue_in_workspaces(
        &self,
        workspace_ids: &[String],
        today: chrono::NaiveDate,
    ) -> Result<u64, DbErr> {
        if workspace_ids.is_empty() {
            return Ok(0);
        }

        TaskEntity::find()
            .join(JoinType::InnerJoin, task::Relation::Project.def())
            .filter(project::Column::WorkspaceId.is_in(workspace_ids.to_vec()))
            .filter(task::Column::DueDate.lt(today))
            .filter(task::Column::Status.ne(TaskStatus::Done))
            .count(&self.db)
            .await
    }

    pub async fn recent_in_workspaces(
        &self,
        workspace_ids: &[String],
        limit: u64,
    ) -> Result<Vec<(Task, Option<Project>)>, DbErr> {
        if workspace_ids.is_empty() {
            return Ok(Vec::new());
        }

        TaskEntity::find()
            .find_also_related(ProjectEntity)
            .filter(project::Column::WorkspaceId.is_in(workspace_ids.to_vec()))
            .order_by_desc(task::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    pub async fn assigned_to_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<(Task, Option<Project>)>, DbErr> {
        TaskEntity::find()
            .join(JoinType::InnerJoin, task::Relation::TaskAssignee.def())
            .filter(task_assignee::Column::UserId.eq(user_id))
            .find_also_related(ProjectEntity)
            .order_by_asc(task::Column::DueDate)
            .all(&self.db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert_eq!(progress_percentage(0, 4), 0);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 4), 50);
        assert_eq!(progress_percentage(4, 4), 100);
    }
}
