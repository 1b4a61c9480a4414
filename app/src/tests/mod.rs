mod common;

mod auth;
mod invitations;
mod tasks;
mod workspaces;
