use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::shared::config::Config;
use crate::system::mailer::Mailer;

/// Shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}
