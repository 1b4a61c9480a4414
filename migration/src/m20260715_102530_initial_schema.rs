use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(string(Users::Id).primary_key())
                    .col(string(Users::Username))
                    .col(string(Users::Email))
                    .col(string(Users::PasswordHash))
                    .col(timestamp(Users::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_null(Users::UpdatedAt))
                    .index(
                        Index::create()
                            .unique()
                            .name("idx_users_username")
                            .col(Users::Username),
                    )
                    .index(
                        Index::create()
                            .unique()
                            .name("idx_users_email")
                            .col(Users::Email),
                    )
                    .to_owned(),
            )
            .await?;

        // workspaces
        manager
            .create_table(
                Table::create()
                    .table(Workspaces::Table)
                    .if_not_exists()
                    .col(string(Workspaces::Id).primary_key())
                    .col(string(Workspaces::Name))
                    .col(text_null(Workspaces::Description))
                    .col(string(Workspaces::CreatedBy))
                    .col(timestamp(Workspaces::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_null(Workspaces::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workspaces_creator")
                            .from(Workspaces::Table, Workspaces::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // workspace_members
        manager
            .create_table(
                Table::create()
                    .table(WorkspaceMembers::Table)
                    .if_not_exists()
                    .col(string(WorkspaceMembers::Id).primary_key())
                    .col(string(WorkspaceMembers::WorkspaceId))
                    .col(string(WorkspaceMembers::UserId))
                    .col(string(WorkspaceMembers::Role).default("member"))
                    .col(timestamp(WorkspaceMembers::JoinedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workspace_members_workspace")
                            .from(WorkspaceMembers::Table, WorkspaceMembers::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workspace_members_user")
                            .from(WorkspaceMembers::Table, WorkspaceMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .unique()
                            .name("idx_workspace_member")
                            .col(WorkspaceMembers::WorkspaceId)
                            .col(WorkspaceMembers::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        // projects
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(string(Projects::Id).primary_key())
                    .col(string(Projects::WorkspaceId))
                    .col(string(Projects::Name))
                    .col(text_null(Projects::Description))
                    .col(string(Projects::CreatedBy))
                    .col(timestamp(Projects::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_null(Projects::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_workspace")
                            .from(Projects::Table, Projects::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_creator")
                            .from(Projects::Table, Projects::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // sprints
        manager
            .create_table(
                Table::create()
                    .table(Sprints::Table)
                    .if_not_exists()
                    .col(string(Sprints::Id).primary_key())
                    .col(string(Sprints::ProjectId))
                    .col(string(Sprints::Name))
                    .col(date(Sprints::StartDate))
                    .col(date(Sprints::EndDate))
                    .col(string(Sprints::Status).default("upcoming"))
                    .col(timestamp(Sprints::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sprints_project")
                            .from(Sprints::Table, Sprints::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // tasks
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(string(Tasks::Id).primary_key())
                    .col(string(Tasks::ProjectId))
                    .col(string_null(Tasks::SprintId))
                    .col(string(Tasks::Title))
                    .col(text_null(Tasks::Description))
                    .col(string(Tasks::Status).default("todo"))
                    .col(date_null(Tasks::DueDate))
                    .col(string(Tasks::CreatedBy))
                    .col(timestamp(Tasks::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_null(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_project")
                            .from(Tasks::Table, Tasks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_sprint")
                            .from(Tasks::Table, Tasks::SprintId)
                            .to(Sprints::Table, Sprints::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_creator")
                            .from(Tasks::Table, Tasks::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // task_assignees
        manager
            .create_table(
                Table::create()
                    .table(TaskAssignees::Table)
                    .if_not_exists()
                    .col(string(TaskAssignees::Id).primary_key())
                    .col(string(TaskAssignees::TaskId))
                    .col(string(TaskAssignees::UserId))
                    .col(timestamp(TaskAssignees::AssignedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_assignees_task")
                            .from(TaskAssignees::Table, TaskAssignees::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_assignees_user")
                            .from(TaskAssignees::Table, TaskAssignees::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .unique()
                            .name("idx_task_assignee")
                            .col(TaskAssignees::TaskId)
                            .col(TaskAssignees::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        // subtasks
        manager
            .create_table(
                Table::create()
                    .table(Subtasks::Table)
                    .if_not_exists()
                    .col(string(Subtasks::Id).primary_key())
                    .col(string(Subtasks::TaskId))
                    .col(string(Subtasks::Title))
                    .col(text_null(Subtasks::Description))
                    .col(string(Subtasks::Status).default("todo"))
                    .col(date_null(Subtasks::DueDate))
                    .col(string(Subtasks::CreatedBy))
                    .col(timestamp(Subtasks::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_null(Subtasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtasks_task")
                            .from(Subtasks::Table, Subtasks::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtasks_creator")
                            .from(Subtasks::Table, Subtasks::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // subtask_assignees
        manager
            .create_table(
                Table::create()
                    .table(SubtaskAssignees::Table)
                    .if_not_exists()
                    .col(string(SubtaskAssignees::Id).primary_key())
                    .col(string(SubtaskAssignees::SubtaskId))
                    .col(string(SubtaskAssignees::UserId))
                    .col(
                        timestamp(SubtaskAssignees::AssignedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtask_assignees_subtask")
                            .from(SubtaskAssignees::Table, SubtaskAssignees::SubtaskId)
                            .to(Subtasks::Table, Subtasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtask_assignees_user")
                            .from(SubtaskAssignees::Table, SubtaskAssignees::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .unique()
                            .name("idx_subtask_assignee")
                            .col(SubtaskAssignees::SubtaskId)
                            .col(SubtaskAssignees::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        // comments
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(string(Comments::Id).primary_key())
                    .col(string_null(Comments::TaskId))
                    .col(string_null(Comments::SubtaskId))
                    .col(string(Comments::AuthorId))
                    .col(text(Comments::Content))
                    .col(timestamp(Comments::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_task")
                            .from(Comments::Table, Comments::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_subtask")
                            .from(Comments::Table, Comments::SubtaskId)
                            .to(Subtasks::Table, Subtasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_author")
                            .from(Comments::Table, Comments::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubtaskAssignees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subtasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskAssignees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sprints::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkspaceMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Workspaces::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Workspaces {
    Table,
    Id,
    Name,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WorkspaceMembers {
    Table,
    Id,
    WorkspaceId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    WorkspaceId,
    Name,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sprints {
    Table,
    Id,
    ProjectId,
    Name,
    StartDate,
    EndDate,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    ProjectId,
    SprintId,
    Title,
    Description,
    Status,
    DueDate,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TaskAssignees {
    Table,
    Id,
    TaskId,
    UserId,
    AssignedAt,
}

#[derive(DeriveIden)]
enum Subtasks {
    Table,
    Id,
    TaskId,
    Title,
    Description,
    Status,
    DueDate,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SubtaskAssignees {
    Table,
    Id,
    SubtaskId,
    UserId,
    AssignedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    TaskId,
    SubtaskId,
    AuthorId,
    Content,
    CreatedAt,
}
