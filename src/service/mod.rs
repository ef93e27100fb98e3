pub mod guild;
pub mod metrics;
pub mod oauth;
pub mod user;
