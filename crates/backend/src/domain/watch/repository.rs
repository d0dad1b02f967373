use anyhow::{Context, Result};
use contracts::domain::Watch;
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};

const WATCH_COLUMNS: &str =
    "id, name, description, price, sizes, colors, features, image_url, release_year, active, \
     created_at";

/// Watch row as stored. The list columns hold JSON-encoded string arrays;
/// decoding happens here so the rest of the crate only sees `Vec<String>`.
#[derive(Debug, Clone, FromQueryResult)]
pub struct WatchRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub sizes: String,
    pub colors: String,
    pub features: String,
    pub image_url: Option<String>,
    pub release_year: Option<i32>,
    pub active: i32,
    pub created_at: String,
}

impl WatchRow {
    fn into_watch(self) -> Watch {
        Watch {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price.parse().unwrap_or_default(),
            sizes: decode_list(&self.sizes),
            colors: decode_list(&self.colors),
            features: decode_list(&self.features),
            image_url: self.image_url,
            release_year: self.release_year,
            active: self.active != 0,
            created_at: self.created_at,
        }
    }
}

/// A malformed or empty column yields an empty list rather than an error;
/// the column defaults to `[]` and is only ever written by this module.
fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn encode_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

async fn select_watches<C: ConnectionTrait>(conn: &C, stmt: Statement) -> Result<Vec<Watch>> {
    let rows = WatchRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch watches")?;
    Ok(rows.into_iter().map(WatchRow::into_watch).collect())
}

/// All active watches, newest model year first, then most expensive.
pub async fn list_active<C: ConnectionTrait>(conn: &C) -> Result<Vec<Watch>> {
    select_watches(
        conn,
        Statement::from_string(
            DatabaseBackend::Sqlite,
            format!(
                "SELECT {} FROM watches WHERE active = 1 \
                 ORDER BY release_year DESC, CAST(price AS REAL) DESC",
                WATCH_COLUMNS
            ),
        ),
    )
    .await
}

pub async fn find_active<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<Watch>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT {} FROM watches WHERE id = ? AND active = 1",
            WATCH_COLUMNS
        ),
        [id.into()],
    );
    let mut watches = select_watches(conn, stmt).await?;
    Ok(watches.pop())
}

/// Lookup without the active filter, for admin reads after an update.
pub async fn find_any<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<Watch>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("SELECT {} FROM watches WHERE id = ?", WATCH_COLUMNS),
        [id.into()],
    );
    let mut watches = select_watches(conn, stmt).await?;
    Ok(watches.pop())
}

/// Series is part of the model name, so a series lookup is a substring
/// match over the name.
pub async fn list_by_series<C: ConnectionTrait>(conn: &C, series: &str) -> Result<Vec<Watch>> {
    select_watches(
        conn,
        Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT {} FROM watches WHERE active = 1 AND name LIKE ? \
                 ORDER BY release_year DESC",
                WATCH_COLUMNS
            ),
            [format!("%{}%", series).into()],
        ),
    )
    .await
}

/// The given ids, unknown ones skipped, newest model year first.
pub async fn find_many<C: ConnectionTrait>(conn: &C, ids: &[String]) -> Result<Vec<Watch>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let values: Vec<sea_orm::Value> = ids.iter().map(|id| id.clone().into()).collect();

    select_watches(
        conn,
        Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT {} FROM watches WHERE active = 1 AND id IN ({}) \
                 ORDER BY release_year DESC",
                WATCH_COLUMNS, placeholders
            ),
            values,
        ),
    )
    .await
}

pub async fn insert<C: ConnectionTrait>(conn: &C, watch: &Watch) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO watches (id, name, description, price, sizes, colors, features, image_url, \
         release_year, active, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            watch.id.clone().into(),
            watch.name.clone().into(),
            watch.description.clone().into(),
            watch.price.to_string().into(),
            encode_list(&watch.sizes).into(),
            encode_list(&watch.colors).into(),
            encode_list(&watch.features).into(),
            watch.image_url.clone().into(),
            watch.release_year.into(),
            (if watch.active { 1 } else { 0 }).into(),
            watch.created_at.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert watch")?;

    Ok(())
}

/// Partial-update payload: only `Some` fields are written. List fields are
/// replaced wholesale.
#[derive(Debug, Default)]
pub struct WatchPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub release_year: Option<i32>,
    pub active: Option<bool>,
}

impl WatchPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.sizes.is_none()
            && self.colors.is_none()
            && self.features.is_none()
            && self.image_url.is_none()
            && self.release_year.is_none()
            && self.active.is_none()
    }
}

/// Apply a partial update. Returns false when no row matched the id.
pub async fn update_partial<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    patch: &WatchPatch,
) -> Result<bool> {
    let mut updates: Vec<&str> = Vec::new();
    let mut values: Vec<sea_orm::Value> = Vec::new();

    if let Some(name) = &patch.name {
        updates.push("name = ?");
        values.push(name.clone().into());
    }
    if let Some(description) = &patch.description {
        updates.push("description = ?");
        values.push(description.clone().into());
    }
    if let Some(price) = &patch.price {
        updates.push("price = ?");
        values.push(price.clone().into());
    }
    if let Some(sizes) = &patch.sizes {
        updates.push("sizes = ?");
        values.push(encode_list(sizes).into());
    }
    if let Some(colors) = &patch.colors {
        updates.push("colors = ?");
        values.push(encode_list(colors).into());
    }
    if let Some(features) = &patch.features {
        updates.push("features = ?");
        values.push(encode_list(features).into());
    }
    if let Some(image_url) = &patch.image_url {
        updates.push("image_url = ?");
        values.push(image_url.clone().into());
    }
    if let Some(release_year) = patch.release_year {
        updates.push("release_year = ?");
        values.push(release_year.into());
    }
    if let Some(active) = patch.active {
        updates.push("active = ?");
        values.push((if active { 1 } else { 0 }).into());
    }

    if updates.is_empty() {
        return Ok(false);
    }
    values.push(id.into());

    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("UPDATE watches SET {} WHERE id = ?", updates.join(", ")),
            values,
        ))
        .await
        .context("Failed to update watch")?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_active<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS count FROM watches WHERE active = 1".to_string(),
        ))
        .await?;

    match result {
        Some(row) => Ok(row.try_get("", "count")?),
        None => Ok(0),
    }
}
