pub mod auth;
pub mod invitations;
pub mod projects;
pub mod sprints;
pub mod subtasks;
pub mod tasks;
pub mod workspaces;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::{
    core::state::AppState,
    handlers::dashboard::get_dashboard,
    middlewares::auth::require_auth,
    routes::{
        auth::auth_routes,
        invitations::{invitation_routes, protected_invitation_routes},
        projects::project_routes,
        sprints::sprint_routes,
        subtasks::subtask_routes,
        tasks::task_routes,
        workspaces::workspace_routes,
    },
    utils::response::APIError,
};

pub fn create_routers(state: Arc<AppState>) -> Router<()> {
    let public_routes = Router::new()
        .nest("/auth", auth_routes())
        .nest("/invitations", invitation_routes());

    let protected_routes = Router::new()
        .nest("/auth", protected_auth_routes())
        .nest("/invitations", protected_invitation_routes())
        .nest("/workspaces", workspace_routes())
        .nest("/projects", project_routes())
        .nest("/sprints", sprint_routes())
        .nest("/tasks", task_routes())
        .nest("/subtasks", subtask_routes())
        .route("/dashboard", get(get_dashboard))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(CorsLayer::permissive())
        .fallback(global_error_handler)
        .with_state(state)
}

fn protected_auth_routes() -> Router<Arc<AppState>> {
    use crate::handlers::auth::get_me;

    Router::new().route("/me", get(get_me))
}

async fn global_error_handler() -> APIError {
    APIError::NotFound("Not Found".to_string())
}
