pub mod auth;
pub mod guild;
pub mod user;
