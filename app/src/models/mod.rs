pub mod comment;
pub mod project;
pub mod sprint;
pub mod subtask;
pub mod subtask_assignee;
pub mod task;
pub mod task_assignee;
pub mod user;
pub mod workspace;
pub mod workspace_invitation;
pub mod workspace_member;
