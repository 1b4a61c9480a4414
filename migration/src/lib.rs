pub use sea_orm_migration::prelude::*;

mod m20260715_102530_initial_schema;
mod m20260802_114500_workspace_invitations;
mod m20260811_093000_add_user_phone;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260715_102530_initial_schema::Migration),
            Box::new(m20260802_114500_workspace_invitations::Migration),
            Box::new(m20260811_093000_add_user_phone::Migration),
        ]
    }
}
