use anyhow::{Context, Result};
use chrono::Utc;
use contracts::domain::contact::{ContactSubmission, NewsletterSubscriber};
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};
use uuid::Uuid;

// ============================================================================
// Contact submissions
// ============================================================================

#[derive(Debug, FromQueryResult)]
struct SubmissionRow {
    id: String,
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
    order_number: Option<String>,
    read_status: i32,
    created_at: String,
}

impl SubmissionRow {
    fn into_submission(self) -> ContactSubmission {
        ContactSubmission {
            id: self.id,
            name: self.name,
            email: self.email,
            subject: self.subject,
            message: self.message,
            order_number: self.order_number,
            read_status: self.read_status != 0,
            created_at: self.created_at,
        }
    }
}

const SUBMISSION_COLUMNS: &str =
    "id, name, email, subject, message, order_number, read_status, created_at";

pub async fn insert_submission<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    email: &str,
    subject: Option<&str>,
    message: &str,
    order_number: Option<&str>,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO contact_submissions \
         (id, name, email, subject, message, order_number, read_status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
        [
            id.clone().into(),
            name.into(),
            email.into(),
            subject.into(),
            message.into(),
            order_number.into(),
            Utc::now().to_rfc3339().into(),
        ],
    );
    conn.execute(stmt)
        .await
        .context("Failed to insert contact submission")?;
    Ok(id)
}

pub async fn list_submissions<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
    offset: u64,
    unread_only: bool,
) -> Result<Vec<ContactSubmission>> {
    let filter = if unread_only { "WHERE read_status = 0 " } else { "" };
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT {} FROM contact_submissions \
             {}ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SUBMISSION_COLUMNS, filter
        ),
        [limit.into(), offset.into()],
    );
    let rows = SubmissionRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to list contact submissions")?;
    Ok(rows.into_iter().map(SubmissionRow::into_submission).collect())
}

pub async fn count_submissions<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let stmt = Statement::from_string(
        DatabaseBackend::Sqlite,
        "SELECT COUNT(*) AS count FROM contact_submissions".to_string(),
    );
    let row = conn
        .query_one(stmt)
        .await
        .context("Failed to count contact submissions")?;
    match row {
        Some(row) => Ok(row.try_get::<i64>("", "count")?),
        None => Ok(0),
    }
}

/// Returns whether a row was actually updated.
pub async fn mark_read<C: ConnectionTrait>(conn: &C, id: &str) -> Result<bool> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE contact_submissions SET read_status = 1 WHERE id = ?",
        [id.into()],
    );
    let result = conn
        .execute(stmt)
        .await
        .context("Failed to mark contact submission as read")?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_recent_submissions<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
) -> Result<Vec<ContactSubmission>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT {} FROM contact_submissions ORDER BY created_at DESC LIMIT ?",
            SUBMISSION_COLUMNS
        ),
        [limit.into()],
    );
    let rows = SubmissionRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to list recent contact submissions")?;
    Ok(rows.into_iter().map(SubmissionRow::into_submission).collect())
}

// ============================================================================
// Newsletter subscribers
// ============================================================================

#[derive(Debug, FromQueryResult)]
struct SubscriberRow {
    id: String,
    email: String,
    active: i32,
    subscribed_at: String,
    unsubscribed_at: Option<String>,
}

impl SubscriberRow {
    fn into_subscriber(self) -> NewsletterSubscriber {
        NewsletterSubscriber {
            id: self.id,
            email: self.email,
            active: self.active != 0,
            subscribed_at: self.subscribed_at,
            unsubscribed_at: self.unsubscribed_at,
        }
    }
}

const SUBSCRIBER_COLUMNS: &str = "id, email, active, subscribed_at, unsubscribed_at";

/// Lookup regardless of active state; a previously unsubscribed address
/// still counts as known.
pub async fn find_subscriber_id<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<String>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT id FROM newsletter_subscribers WHERE email = ?",
        [email.into()],
    );
    let row = conn
        .query_one(stmt)
        .await
        .context("Failed to look up newsletter subscriber")?;
    match row {
        Some(row) => Ok(Some(row.try_get::<String>("", "id")?)),
        None => Ok(None),
    }
}

pub async fn insert_subscriber<C: ConnectionTrait>(conn: &C, email: &str) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO newsletter_subscribers (id, email, active, subscribed_at) \
         VALUES (?, ?, 1, ?)",
        [id.clone().into(), email.into(), Utc::now().to_rfc3339().into()],
    );
    conn.execute(stmt)
        .await
        .context("Failed to insert newsletter subscriber")?;
    Ok(id)
}

pub async fn list_subscribers<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
    offset: u64,
    active_only: bool,
) -> Result<Vec<NewsletterSubscriber>> {
    let filter = if active_only { "WHERE active = 1 " } else { "" };
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT {} FROM newsletter_subscribers \
             {}ORDER BY subscribed_at DESC LIMIT ? OFFSET ?",
            SUBSCRIBER_COLUMNS, filter
        ),
        [limit.into(), offset.into()],
    );
    let rows = SubscriberRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to list newsletter subscribers")?;
    Ok(rows.into_iter().map(SubscriberRow::into_subscriber).collect())
}

pub async fn count_subscribers<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let stmt = Statement::from_string(
        DatabaseBackend::Sqlite,
        "SELECT COUNT(*) AS count FROM newsletter_subscribers".to_string(),
    );
    let row = conn
        .query_one(stmt)
        .await
        .context("Failed to count newsletter subscribers")?;
    match row {
        Some(row) => Ok(row.try_get::<i64>("", "count")?),
        None => Ok(0),
    }
}

pub async fn count_active_subscribers<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let stmt = Statement::from_string(
        DatabaseBackend::Sqlite,
        "SELECT COUNT(*) AS count FROM newsletter_subscribers WHERE active = 1".to_string(),
    );
    let row = conn
        .query_one(stmt)
        .await
        .context("Failed to count newsletter subscribers")?;
    match row {
        Some(row) => Ok(row.try_get::<i64>("", "count")?),
        None => Ok(0),
    }
}

/// Soft unsubscribe. Safe to call for unknown or already inactive emails.
pub async fn deactivate_subscriber<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    reason: &str,
) -> Result<()> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE newsletter_subscribers \
         SET active = 0, unsubscribed_at = ?, unsubscribe_reason = ? \
         WHERE email = ?",
        [Utc::now().to_rfc3339().into(), reason.into(), email.into()],
    );
    conn.execute(stmt)
        .await
        .context("Failed to unsubscribe from newsletter")?;
    Ok(())
}
