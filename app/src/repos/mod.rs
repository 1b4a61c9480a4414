pub mod comments;
pub mod invitations;
pub mod projects;
pub mod sprints;
pub mod subtasks;
pub mod tasks;
pub mod users;
pub mod workspace_members;
pub mod workspaces;
