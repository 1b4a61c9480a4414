use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::{
    models::user::Model as User,
    models::workspace::Model as Workspace,
    repos::{users::UsersRepo, workspaces::WorkspacesRepo},
    services::notify::{EmailSender, Notifier, SendError, SmsSender},
    utils::password::hash_password,
};

/// Fresh in-memory database with the full schema applied. A single
/// connection keeps every query on the same sqlite instance.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");

    db
}

#[derive(Clone, Default)]
pub struct RecordingEmailSender {
    pub sent: Arc<Mutex<Vec<(String, String, String)>>>,
    pub fail: bool,
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError> {
        if self.fail {
            return Err(SendError::SendFailed("simulated smtp outage".to_string()));
        }

        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));

        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSmsSender {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl SmsSender for RecordingSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SendError> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));

        Ok(())
    }
}

pub fn test_notifier() -> (Notifier, RecordingEmailSender, RecordingSmsSender) {
    let email = RecordingEmailSender::default();
    let sms = RecordingSmsSender::default();
    let notifier = Notifier::new(Arc::new(email.clone()), Some(Arc::new(sms.clone())));

    (notifier, email, sms)
}

pub fn email_only_notifier() -> (Notifier, RecordingEmailSender) {
    let email = RecordingEmailSender::default();
    let notifier = Notifier::new(Arc::new(email.clone()), None);

    (notifier, email)
}

pub async fn create_user(db: &DatabaseConnection, username: &str, email: &str) -> User {
    let password_hash = hash_password("correct horse battery staple").expect("hash password");

    UsersRepo::new(db.clone())
        .create(username.to_string(), email.to_string(), password_hash, None)
        .await
        .expect("create user")
}

pub async fn create_workspace(db: &DatabaseConnection, owner: &User, name: &str) -> Workspace {
    let (workspace, _admin) = WorkspacesRepo::new(db.clone())
        .create(name.to_string(), None, owner.id.clone())
        .await
        .expect("create workspace");

    workspace
}
