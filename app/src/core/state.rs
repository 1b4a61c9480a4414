use sea_orm::DatabaseConnection;

use crate::{
    config::config::Config,
    services::{access::AccessControl, invitations::InvitationService, notify::Notifier},
};

#[derive(Clone)]
pub struct AppState {
    pub database: DatabaseConnection,
    pub config: Config,
    pub notifier: Notifier,
}

impl AppState {
    pub fn access(&self) -> AccessControl {
        AccessControl::new(self.database.clone())
    }

    pub fn invitations(&self) -> InvitationService {
        InvitationService::new(
            self.database.clone(),
            self.notifier.clone(),
            self.config.site_url.clone(),
        )
    }
}
