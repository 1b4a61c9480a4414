use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    core::state::AppState,
    handlers::invitations::{accept_invitation, resolve_invitation},
};

/// Token resolution is public so a recipient can preview the invitation
/// before they have an account.
pub fn invitation_routes() -> Router<Arc<AppState>> {
    Router::new().route("/:token", get(resolve_invitation))
}

/// Accepting requires a signed in user to attach the membership to.
pub fn protected_invitation_routes() -> Router<Arc<AppState>> {
    Router::new().route("/:token/accept", post(accept_invitation))
}
