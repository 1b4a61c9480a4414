use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};

use crate::{
    models::user::{self, ActiveModel, Entity as UserEntity, Model as User},
    utils::crypto::generate_uuid,
};

pub struct UsersRepo {
    db: DatabaseConnection,
}

impl UsersRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        username: String,
        email: String,
        password_hash: String,
        phone_number: Option<String>,
    ) -> Result<User, DbErr> {
        let user_model = ActiveModel {
            id: Set(generate_uuid()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            phone_number: Set(phone_number),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(None),
        };

        let user = user_model.insert(&self.db).await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User, DbErr> {
        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, DbErr> {
        let user = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        match user {
            Some(u) => Ok(u),
            None => Err(DbErr::RecordNotFound(format!(
                "User with the email {} not found",
                email
            ))),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbErr> {
        UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbErr> {
        UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
    }
}
