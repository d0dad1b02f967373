use anyhow::{Context, Result};
use contracts::system::users::PublicUser;
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};

const USER_COLUMNS: &str = "id, email, password_hash, name, apple_id, active, created_at, last_login";

/// Full user row, including the password hash. Never serialized; handlers
/// expose `PublicUser` instead.
#[derive(Debug, Clone, FromQueryResult)]
pub struct UserRecord {
    pub id: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub apple_id: Option<String>,
    pub active: i32,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl UserRecord {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            apple_id: self.apple_id.clone(),
            created_at: self.created_at.clone(),
            last_login: self.last_login.clone(),
        }
    }
}

pub async fn insert<C: ConnectionTrait>(conn: &C, user: &UserRecord) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO users (id, email, password_hash, name, apple_id, active, created_at, last_login) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        [
            user.id.clone().into(),
            user.email.clone().into(),
            user.password_hash.clone().into(),
            user.name.clone().into(),
            user.apple_id.clone().into(),
            user.active.into(),
            user.created_at.clone().into(),
            user.last_login.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert user")?;

    Ok(())
}

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<UserRecord>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
        [id.into()],
    );
    let record = UserRecord::find_by_statement(stmt).one(conn).await?;
    Ok(record)
}

pub async fn find_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<UserRecord>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
        [email.into()],
    );
    let record = UserRecord::find_by_statement(stmt).one(conn).await?;
    Ok(record)
}

pub async fn find_by_apple_id<C: ConnectionTrait>(
    conn: &C,
    apple_id: &str,
) -> Result<Option<UserRecord>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("SELECT {} FROM users WHERE apple_id = ?", USER_COLUMNS),
        [apple_id.into()],
    );
    let record = UserRecord::find_by_statement(stmt).one(conn).await?;
    Ok(record)
}

pub async fn update_last_login<C: ConnectionTrait>(conn: &C, id: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE users SET last_login = ? WHERE id = ?",
        [chrono::Utc::now().to_rfc3339().into(), id.into()],
    ))
    .await
    .context("Failed to update last login")?;

    Ok(())
}

/// True when another user already owns this email address.
pub async fn email_taken_by_other<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    user_id: &str,
) -> Result<bool> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT id FROM users WHERE email = ? AND id != ?",
            [email.into(), user_id.into()],
        ))
        .await?;
    Ok(result.is_some())
}

/// Apply a partial profile update. Only the provided fields change.
pub async fn update_profile<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    let mut updates: Vec<&str> = Vec::new();
    let mut values: Vec<sea_orm::Value> = Vec::new();

    if let Some(name) = name {
        updates.push("name = ?");
        values.push(name.into());
    }
    if let Some(email) = email {
        updates.push("email = ?");
        values.push(email.into());
    }
    if updates.is_empty() {
        return Ok(());
    }
    values.push(id.into());

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("UPDATE users SET {} WHERE id = ?", updates.join(", ")),
        values,
    ))
    .await
    .context("Failed to update profile")?;

    Ok(())
}

pub async fn update_password<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    password_hash: &str,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE users SET password_hash = ? WHERE id = ?",
        [password_hash.into(), id.into()],
    ))
    .await
    .context("Failed to update password")?;

    Ok(())
}

/// Soft delete: the row stays, the account is deactivated.
pub async fn deactivate<C: ConnectionTrait>(conn: &C, id: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE users SET active = 0 WHERE id = ?",
        [id.into()],
    ))
    .await
    .context("Failed to deactivate user")?;

    Ok(())
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS count FROM users".to_string(),
        ))
        .await?;

    match result {
        Some(row) => Ok(row.try_get("", "count")?),
        None => Ok(0),
    }
}
