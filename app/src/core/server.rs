use anyhow::Result;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use axum::Router;

use crate::{
    config::config::Config,
    core::state::AppState,
    database::connect::{connect_database, run_migrations},
    routes::create_routers,
    services::notify::Notifier,
};

pub async fn create_server(config: Config) -> Result<(Router<()>, DatabaseConnection)> {
    let db_conn = connect_database(config.clone()).await?;
    run_migrations(&db_conn).await?;

    let notifier = Notifier::from_config(&config)?;

    let state = AppState {
        database: db_conn.clone(),
        config,
        notifier,
    };

    let app = create_routers(Arc::new(state));

    Ok((app, db_conn))
}
