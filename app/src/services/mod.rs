pub mod access;
pub mod invitations;
pub mod notify;
