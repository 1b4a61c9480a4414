pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod invitations;
pub mod projects;
pub mod subtasks;
pub mod tasks;
pub mod workspaces;
