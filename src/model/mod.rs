pub mod api;
pub mod guild;
pub mod member;
pub mod query;
pub mod user;
