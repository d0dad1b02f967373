pub mod auth;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod tracing;
pub mod users;
