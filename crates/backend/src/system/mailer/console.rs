use async_trait::async_trait;

use super::{Mailer, OutgoingEmail};

/// Logs outgoing mail instead of sending it. Used when SMTP is not
/// configured, and in tests.
#[derive(Clone, Debug, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            from = %email.from,
            subject = %email.subject,
            body_bytes = email.html_body.len(),
            "Outgoing email (console mode)"
        );
        Ok(())
    }
}
