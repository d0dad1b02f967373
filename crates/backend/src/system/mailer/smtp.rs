use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{Mailer, OutgoingEmail};
use crate::shared::config::EmailConfig;

/// SMTP delivery via lettre. The blocking transport runs on the tokio
/// blocking pool so handlers are never stalled by a slow relay.
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| anyhow!("EMAIL_HOST is not set"))?;
        let user = config
            .user
            .clone()
            .ok_or_else(|| anyhow!("EMAIL_USER is not set"))?;
        let password = config
            .password
            .clone()
            .ok_or_else(|| anyhow!("EMAIL_PASSWORD is not set"))?;

        // secure=true means implicit TLS, otherwise STARTTLS on the given port.
        let builder = if config.secure {
            SmtpTransport::relay(host).context("Failed to configure SMTP relay")?
        } else {
            SmtpTransport::starttls_relay(host).context("Failed to configure SMTP relay")?
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(user, password))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(
                email
                    .from
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body)
            .context("Failed to build email")?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("Email task failed")?
            .context("Failed to send email")?;

        Ok(())
    }
}
