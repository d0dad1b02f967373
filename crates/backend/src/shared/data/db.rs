use anyhow::Context;
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};

/// Open the SQLite database at `db_path`, creating the file and its parent
/// directory on first run.
pub async fn connect(db_path: &str) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_path).is_absolute() {
        std::path::PathBuf::from(db_path)
    } else {
        std::env::current_dir()?.join(db_path)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    let conn = Database::connect(&db_url)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    Ok(conn)
}

/// Storefront schema. Statements are idempotent so bootstrap can run on
/// every startup.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS bands (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        price TEXT NOT NULL,
        color TEXT,
        material TEXT,
        stock INTEGER NOT NULL DEFAULT 0,
        featured INTEGER NOT NULL DEFAULT 0,
        liquid_glass INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        image_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS band_features (
        id TEXT PRIMARY KEY NOT NULL,
        band_id TEXT NOT NULL,
        feature_name TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS band_compatibility (
        id TEXT PRIMARY KEY NOT NULL,
        band_id TEXT NOT NULL,
        compatibility TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS watches (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        price TEXT NOT NULL,
        sizes TEXT NOT NULL DEFAULT '[]',
        colors TEXT NOT NULL DEFAULT '[]',
        features TEXT NOT NULL DEFAULT '[]',
        image_url TEXT,
        release_year INTEGER,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        email TEXT UNIQUE,
        password_hash TEXT,
        name TEXT,
        apple_id TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        last_login TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS shopping_carts (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT,
        session_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cart_items (
        id TEXT PRIMARY KEY NOT NULL,
        cart_id TEXT NOT NULL,
        band_id TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        added_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY NOT NULL,
        order_number TEXT NOT NULL UNIQUE,
        user_id TEXT,
        total_amount TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        shipping_address TEXT,
        billing_address TEXT,
        payment_method TEXT,
        tracking_number TEXT,
        notes TEXT,
        admin_notes TEXT,
        cancellation_reason TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id TEXT PRIMARY KEY NOT NULL,
        order_id TEXT NOT NULL,
        band_id TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contact_submissions (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        subject TEXT,
        message TEXT NOT NULL,
        order_number TEXT,
        read_status INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS newsletter_subscribers (
        id TEXT PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        active INTEGER NOT NULL DEFAULT 1,
        subscribed_at TEXT NOT NULL,
        unsubscribed_at TEXT,
        unsubscribe_reason TEXT
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_band_features_band ON band_features (band_id);",
    "CREATE INDEX IF NOT EXISTS idx_band_compatibility_band ON band_compatibility (band_id);",
    "CREATE INDEX IF NOT EXISTS idx_shopping_carts_user ON shopping_carts (user_id);",
    "CREATE INDEX IF NOT EXISTS idx_shopping_carts_session ON shopping_carts (session_id);",
    "CREATE INDEX IF NOT EXISTS idx_cart_items_cart ON cart_items (cart_id);",
    "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id);",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items (order_id);",
];

/// Create any missing tables and indexes.
pub async fn bootstrap_schema<C: ConnectionTrait>(conn: &C) -> anyhow::Result<()> {
    for sql in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            sql.to_string(),
        ))
        .await
        .with_context(|| {
            let preview: String = sql.split_whitespace().take(6).collect::<Vec<_>>().join(" ");
            format!("Failed to execute schema statement: {}...", preview)
        })?;
    }
    tracing::info!("Database schema is up to date");
    Ok(())
}

/// Fresh in-memory database with the full schema, for tests.
#[cfg(test)]
pub async fn test_db() -> DatabaseConnection {
    use sea_orm::ConnectOptions;

    // A single connection keeps every query on the same in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1);
    let conn = Database::connect(options)
        .await
        .expect("in-memory database");
    bootstrap_schema(&conn).await.expect("schema bootstrap");
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let conn = test_db().await;
        // Second run must not fail on existing tables.
        bootstrap_schema(&conn).await.expect("re-run bootstrap");

        let row = conn
            .query_one(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name IN \
                 ('bands', 'watches', 'users', 'shopping_carts', 'cart_items', 'orders', \
                  'order_items', 'contact_submissions', 'newsletter_subscribers', \
                  'band_features', 'band_compatibility')"
                    .to_string(),
            ))
            .await
            .expect("query sqlite_master")
            .expect("count row");
        let n: i64 = row.try_get("", "n").expect("count value");
        assert_eq!(n, 11);
    }
}
