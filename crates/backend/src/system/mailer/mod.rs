pub mod console;
pub mod smtp;

pub use console::ConsoleMailer;
pub use smtp::SmtpMailer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::shared::config::EmailConfig;

/// A single outgoing message with an HTML body.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Mail delivery seam. Production uses SMTP; development and tests log to
/// the console instead.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Pick the mailer for the current configuration: SMTP when fully
/// configured, console otherwise.
pub fn build_mailer(config: &EmailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    if config.smtp_configured() {
        let mailer = SmtpMailer::new(config)?;
        tracing::info!("Using SMTP mailer");
        Ok(Arc::new(mailer))
    } else {
        tracing::info!("Email is not configured, logging outgoing mail to console");
        Ok(Arc::new(ConsoleMailer::new()))
    }
}
