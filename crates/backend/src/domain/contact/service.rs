use contracts::domain::{
    ContactReceipt, ContactRequest, ContactSubmission, NewsletterSubscriber, SubscribeOutcome,
    SubscribeRequest, UnsubscribeRequest,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository;
use crate::shared::config::Config;
use crate::shared::error::ApiError;
use crate::system::mailer::{Mailer, OutgoingEmail};
use crate::system::users::service::is_valid_email;

fn sender(display_name: &str, config: &Config) -> String {
    format!(
        "\"{}\" <{}>",
        display_name,
        config
            .email
            .no_reply_or_user()
            .unwrap_or_else(|| "no-reply@pulse.local".to_string())
    )
}

/// Stores a contact form submission and sends the support notification plus
/// an auto-reply to the submitter. All three happen in one transaction: if
/// either email cannot be handed off, the submission is rolled back and the
/// client is asked to retry.
pub async fn submit(
    db: &DatabaseConnection,
    config: &Config,
    mailer: &dyn Mailer,
    req: ContactRequest,
) -> Result<ContactReceipt, ApiError> {
    let name = req.name.as_deref().filter(|s| !s.is_empty());
    let email = req.email.as_deref().filter(|s| !s.is_empty());
    let message = req.message.as_deref().filter(|s| !s.is_empty());
    let (Some(name), Some(email), Some(message)) = (name, email, message) else {
        return Err(ApiError::validation(
            "Name, email, and message are required",
        ));
    };
    if !is_valid_email(email) {
        return Err(ApiError::validation("Invalid email address"));
    }

    let subject = req.subject.as_deref().filter(|s| !s.is_empty());
    let order_number = req.order_number.as_deref().filter(|s| !s.is_empty());

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to send message", e.into()))?;

    let id = repository::insert_submission(
        &txn,
        name,
        email,
        Some(subject.unwrap_or("No subject")),
        message,
        order_number,
    )
    .await
    .map_err(|e| ApiError::internal("Failed to send message", e))?;

    // Falls back to the no-reply account when no support inbox is configured.
    let support_to = config
        .email
        .support_address
        .clone()
        .or_else(|| config.email.no_reply_or_user())
        .unwrap_or_else(|| "support@pulse.local".to_string());
    let notification = OutgoingEmail {
        from: sender("Pulse Support", config),
        to: support_to,
        subject: format!(
            "Pulse Support: {}",
            subject.unwrap_or("New Contact Form Submission")
        ),
        html_body: support_email_body(name, email, message, order_number),
    };
    mailer
        .send(notification)
        .await
        .map_err(|e| ApiError::internal("Failed to send message", e))?;

    let auto_reply = OutgoingEmail {
        from: sender("Pulse Support", config),
        to: email.to_string(),
        subject: "Thank you for contacting Pulse Support".to_string(),
        html_body: auto_reply_body(name),
    };
    mailer
        .send(auto_reply)
        .await
        .map_err(|e| ApiError::internal("Failed to send message", e))?;

    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to send message", e.into()))?;

    Ok(ContactReceipt {
        id,
        name: name.to_string(),
        email: email.to_string(),
        subject: subject.map(str::to_string),
    })
}

/// Admin listing, newest first. The total is the unfiltered table count
/// even when `unread_only` narrows the page.
pub async fn list<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
    offset: u64,
    unread_only: bool,
) -> Result<(Vec<ContactSubmission>, i64), ApiError> {
    let submissions = repository::list_submissions(conn, limit, offset, unread_only)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch contact submissions", e))?;
    let total = repository::count_submissions(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch contact submissions", e))?;
    Ok((submissions, total))
}

pub async fn mark_read<C: ConnectionTrait>(conn: &C, id: &str) -> Result<(), ApiError> {
    let updated = repository::mark_read(conn, id)
        .await
        .map_err(|e| ApiError::internal("Failed to update submission", e))?;
    if !updated {
        return Err(ApiError::not_found("Submission not found"));
    }
    Ok(())
}

/// Adds an address to the newsletter. A known address answers success with
/// the `alreadySubscribed` flag instead of erroring, and an unsubscribed one
/// is not silently reactivated. The welcome email is best effort.
pub async fn subscribe<C: ConnectionTrait>(
    conn: &C,
    config: &Config,
    mailer: &dyn Mailer,
    req: SubscribeRequest,
) -> Result<SubscribeOutcome, ApiError> {
    let email = match req.email.as_deref().filter(|s| !s.is_empty()) {
        Some(e) if is_valid_email(e) => e,
        _ => {
            return Err(ApiError::validation("Valid email address is required"));
        }
    };

    let existing = repository::find_subscriber_id(conn, email)
        .await
        .map_err(|e| ApiError::internal("Failed to subscribe to newsletter", e))?;
    if existing.is_some() {
        return Ok(SubscribeOutcome {
            already_subscribed: true,
        });
    }

    repository::insert_subscriber(conn, email)
        .await
        .map_err(|e| ApiError::internal("Failed to subscribe to newsletter", e))?;

    let welcome = OutgoingEmail {
        from: sender("Pulse Newsletter", config),
        to: email.to_string(),
        subject: "Welcome to the Pulse Newsletter!".to_string(),
        html_body: welcome_email_body(&config.email.website_url),
    };
    if let Err(e) = mailer.send(welcome).await {
        tracing::error!("Failed to send welcome email: {:#}", e);
    }

    Ok(SubscribeOutcome {
        already_subscribed: false,
    })
}

/// Admin listing, newest first. As with submissions, the total ignores the
/// `active_only` filter.
pub async fn list_subscribers<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
    offset: u64,
    active_only: bool,
) -> Result<(Vec<NewsletterSubscriber>, i64), ApiError> {
    let subscribers = repository::list_subscribers(conn, limit, offset, active_only)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch newsletter subscribers", e))?;
    let total = repository::count_subscribers(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch newsletter subscribers", e))?;
    Ok((subscribers, total))
}

/// Soft unsubscribe. Unknown addresses succeed too, so the unsubscribe link
/// in old newsletters never errors.
pub async fn unsubscribe<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    req: UnsubscribeRequest,
) -> Result<(), ApiError> {
    let reason = req
        .reason
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("No reason provided");
    repository::deactivate_subscriber(conn, email, reason)
        .await
        .map_err(|e| ApiError::internal("Failed to unsubscribe", e))?;
    Ok(())
}

fn support_email_body(
    name: &str,
    email: &str,
    message: &str,
    order_number: Option<&str>,
) -> String {
    let order_line = match order_number {
        Some(number) => format!("<p><strong>Order number:</strong> {number}</p>"),
        None => String::new(),
    };
    format!(
        r#"
<div style="font-family: -apple-system, Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #1d1d1f;">New contact form submission</h2>
    <p><strong>From:</strong> {name} &lt;{email}&gt;</p>
    {order_line}
    <p style="white-space: pre-wrap; background: #f5f5f7; padding: 16px; border-radius: 8px;">{message}</p>
</div>
"#
    )
}

fn auto_reply_body(name: &str) -> String {
    format!(
        r#"
<div style="font-family: -apple-system, Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #1d1d1f;">Thank you for reaching out, {name}!</h2>
    <p>We received your message and our support team will get back to you
       within 24 hours.</p>
    <p style="color: #666; font-size: 14px;">
        This is an automated reply; there is no need to respond.
    </p>
</div>
"#
    )
}

fn welcome_email_body(website_url: &str) -> String {
    format!(
        r#"
<div style="font-family: -apple-system, Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #1d1d1f;">Welcome to the Pulse Newsletter!</h2>
    <p>You are on the list. Expect new releases, restocks and member-only
       offers about twice a month.</p>
    <p style="margin: 30px 0;">
        <a href="{website_url}"
           style="display: inline-block; background-color: #007aff; color: white; padding: 12px 24px; text-decoration: none; border-radius: 8px;">
            Browse the collection
        </a>
    </p>
    <p style="color: #666; font-size: 14px;">
        You can unsubscribe at any time from the link in any newsletter.
    </p>
</div>
"#
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::shared::config::EmailConfig;
    use crate::shared::data::db::test_db;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl RecordingMailer {
        fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: OutgoingEmail) -> anyhow::Result<()> {
            anyhow::bail!("smtp connection refused")
        }
    }

    fn test_config() -> Config {
        Config {
            port: 0,
            database_path: String::new(),
            jwt_secret: "test-secret".to_string(),
            admin_key: Some("admin-key".to_string()),
            frontend_url: "http://localhost:5500".to_string(),
            environment: "test".to_string(),
            email: EmailConfig {
                host: None,
                port: 587,
                secure: false,
                user: None,
                password: None,
                support_address: Some("support@example.com".to_string()),
                no_reply_address: Some("no-reply@example.com".to_string()),
                website_url: "http://localhost:5500".to_string(),
            },
        }
    }

    fn contact_req(message: &str) -> ContactRequest {
        ContactRequest {
            name: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            subject: Some("Band broke".to_string()),
            message: Some(message.to_string()),
            order_number: Some("PU-1700000000000-0A1B2C".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_and_sends_both_emails() {
        let conn = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();

        let receipt = submit(&conn, &config, &mailer, contact_req("The clasp came loose."))
            .await
            .unwrap();
        assert_eq!(receipt.name, "Ana");
        assert_eq!(receipt.subject.as_deref(), Some("Band broke"));

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "support@example.com");
        assert_eq!(sent[0].subject, "Pulse Support: Band broke");
        assert_eq!(sent[0].from, "\"Pulse Support\" <no-reply@example.com>");
        assert!(sent[0].html_body.contains("The clasp came loose."));
        assert_eq!(sent[1].to, "ana@example.com");
        assert_eq!(sent[1].subject, "Thank you for contacting Pulse Support");

        let (submissions, total) = list(&conn, 50, 0, false).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(submissions[0].id, receipt.id);
        assert!(!submissions[0].read_status);
    }

    #[tokio::test]
    async fn test_submit_requires_name_email_and_message() {
        let conn = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();

        let mut req = contact_req("hello");
        req.message = None;
        let err = submit(&conn, &config, &mailer, req).await.unwrap_err();
        assert_eq!(err.to_string(), "Name, email, and message are required");

        let mut req = contact_req("hello");
        req.email = Some("not-an-email".to_string());
        let err = submit(&conn, &config, &mailer, req).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email address");

        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_subject_uses_defaults() {
        let conn = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();

        let mut req = contact_req("hello");
        req.subject = None;
        req.order_number = None;
        let receipt = submit(&conn, &config, &mailer, req).await.unwrap();
        assert!(receipt.subject.is_none());

        let sent = mailer.sent();
        assert_eq!(sent[0].subject, "Pulse Support: New Contact Form Submission");

        // The stored row gets the placeholder, the receipt stays bare.
        let (submissions, _) = list(&conn, 50, 0, false).await.unwrap();
        assert_eq!(submissions[0].subject.as_deref(), Some("No subject"));
        assert!(submissions[0].order_number.is_none());
    }

    #[tokio::test]
    async fn test_submit_rolls_back_when_email_fails() {
        let conn = test_db().await;
        let config = test_config();

        let err = submit(&conn, &config, &FailingMailer, contact_req("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to send message");

        let (submissions, total) = list(&conn, 50, 0, false).await.unwrap();
        assert!(submissions.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_list_unread_filter_keeps_unfiltered_total() {
        let conn = test_db().await;
        let first = repository::insert_submission(&conn, "A", "a@example.com", None, "one", None)
            .await
            .unwrap();
        repository::insert_submission(&conn, "B", "b@example.com", None, "two", None)
            .await
            .unwrap();
        repository::insert_submission(&conn, "C", "c@example.com", None, "three", None)
            .await
            .unwrap();

        mark_read(&conn, &first).await.unwrap();

        let (unread, total) = list(&conn, 50, 0, true).await.unwrap();
        assert_eq!(unread.len(), 2);
        assert_eq!(total, 3);

        // Newest first, and the limit caps the page.
        let (page, _) = list(&conn, 2, 0, false).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].message, "three");
    }

    #[tokio::test]
    async fn test_mark_read_unknown_submission_is_not_found() {
        let conn = test_db().await;
        let err = mark_read(&conn, "missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "Submission not found");
    }

    #[tokio::test]
    async fn test_subscribe_then_duplicate() {
        let conn = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();
        let req = SubscribeRequest {
            email: Some("ana@example.com".to_string()),
        };

        let outcome = subscribe(&conn, &config, &mailer, req.clone()).await.unwrap();
        assert!(!outcome.already_subscribed);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert_eq!(sent[0].subject, "Welcome to the Pulse Newsletter!");
        assert_eq!(sent[0].from, "\"Pulse Newsletter\" <no-reply@example.com>");

        let outcome = subscribe(&conn, &config, &mailer, req).await.unwrap();
        assert!(outcome.already_subscribed);
        // No second welcome email.
        assert_eq!(mailer.sent().len(), 1);

        let (subscribers, total) = list_subscribers(&conn, 100, 0, false).await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_addresses() {
        let conn = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();

        for email in [None, Some("".to_string()), Some("nope".to_string())] {
            let err = subscribe(&conn, &config, &mailer, SubscribeRequest { email })
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Valid email address is required");
        }
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_survives_welcome_email_failure() {
        let conn = test_db().await;
        let config = test_config();
        let req = SubscribeRequest {
            email: Some("ana@example.com".to_string()),
        };

        let outcome = subscribe(&conn, &config, &FailingMailer, req).await.unwrap();
        assert!(!outcome.already_subscribed);

        let (subscribers, _) = list_subscribers(&conn, 100, 0, true).await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert!(subscribers[0].active);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_soft_and_idempotent() {
        let conn = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();
        subscribe(
            &conn,
            &config,
            &mailer,
            SubscribeRequest {
                email: Some("ana@example.com".to_string()),
            },
        )
        .await
        .unwrap();

        unsubscribe(&conn, "ana@example.com", UnsubscribeRequest::default())
            .await
            .unwrap();

        let (active, _) = list_subscribers(&conn, 100, 0, true).await.unwrap();
        assert!(active.is_empty());
        let (all, _) = list_subscribers(&conn, 100, 0, false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].active);
        assert!(all[0].unsubscribed_at.is_some());

        // Subscribing again reports the address as known, without
        // reactivating it.
        let outcome = subscribe(
            &conn,
            &config,
            &mailer,
            SubscribeRequest {
                email: Some("ana@example.com".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(outcome.already_subscribed);
        let (active, _) = list_subscribers(&conn, 100, 0, true).await.unwrap();
        assert!(active.is_empty());

        // Unknown addresses unsubscribe without complaint.
        unsubscribe(&conn, "ghost@example.com", UnsubscribeRequest::default())
            .await
            .unwrap();
    }
}
