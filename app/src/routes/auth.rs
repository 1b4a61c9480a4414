use std::sync::Arc;

use axum::{routing::post, Router};

use crate::{
    core::state::AppState,
    handlers::auth::{login, register},
};

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
