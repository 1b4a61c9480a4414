pub mod crypto;
pub mod jwt;
pub mod password;
pub mod response;
