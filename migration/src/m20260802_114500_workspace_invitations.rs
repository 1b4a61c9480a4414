use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkspaceInvitations::Table)
                    .if_not_exists()
                    .col(string(WorkspaceInvitations::Id).primary_key())
                    .col(string(WorkspaceInvitations::WorkspaceId))
                    .col(string(WorkspaceInvitations::RecipientName))
                    .col(string(WorkspaceInvitations::Email))
                    .col(string_null(WorkspaceInvitations::RecipientPhone))
                    .col(string(WorkspaceInvitations::Role).default("member"))
                    .col(string(WorkspaceInvitations::Token))
                    .col(string(WorkspaceInvitations::Status).default("pending"))
                    .col(string(WorkspaceInvitations::CreatedBy))
                    .col(
                        timestamp(WorkspaceInvitations::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp(WorkspaceInvitations::ExpiresAt))
                    .col(string_null(WorkspaceInvitations::AcceptedBy))
                    .col(timestamp_null(WorkspaceInvitations::AcceptedAt))
                    .col(timestamp_null(WorkspaceInvitations::RevokedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workspace_invitations_workspace")
                            .from(
                                WorkspaceInvitations::Table,
                                WorkspaceInvitations::WorkspaceId,
                            )
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workspace_invitations_creator")
                            .from(
                                WorkspaceInvitations::Table,
                                WorkspaceInvitations::CreatedBy,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workspace_invitations_acceptor")
                            .from(
                                WorkspaceInvitations::Table,
                                WorkspaceInvitations::AcceptedBy,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .index(
                        Index::create()
                            .unique()
                            .name("idx_workspace_invitations_token")
                            .col(WorkspaceInvitations::Token),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workspace_invitations_workspace_email")
                    .table(WorkspaceInvitations::Table)
                    .col(WorkspaceInvitations::WorkspaceId)
                    .col(WorkspaceInvitations::Email)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkspaceInvitations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WorkspaceInvitations {
    Table,
    Id,
    WorkspaceId,
    RecipientName,
    Email,
    RecipientPhone,
    Role,
    Token,
    Status,
    CreatedBy,
    CreatedAt,
    ExpiresAt,
    AcceptedBy,
    AcceptedAt,
    RevokedAt,
}

#[derive(DeriveIden)]
enum Workspaces {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
