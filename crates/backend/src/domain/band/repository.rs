use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::domain::Band;
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};
use uuid::Uuid;

const BAND_COLUMNS: &str = "id, name, description, price, color, material, stock, featured, \
                            liquid_glass, active, image_url, created_at, updated_at";

/// Band row as stored. Price is TEXT in SQLite; flags are 0/1 integers.
#[derive(Debug, Clone, FromQueryResult)]
pub struct BandRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub color: Option<String>,
    pub material: Option<String>,
    pub stock: i32,
    pub featured: i32,
    pub liquid_glass: i32,
    pub active: i32,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BandRow {
    fn into_band(self, features: Vec<String>, compatibilities: Vec<String>) -> Band {
        Band {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price.parse().unwrap_or_default(),
            color: self.color,
            material: self.material,
            stock: self.stock,
            featured: self.featured != 0,
            liquid_glass: self.liquid_glass != 0,
            active: self.active != 0,
            image_url: self.image_url,
            features,
            compatibilities,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Load the ordered feature and compatibility lists for a set of bands and
/// assemble the aggregates, preserving the row order of `rows`.
async fn attach_lists<C: ConnectionTrait>(conn: &C, rows: Vec<BandRow>) -> Result<Vec<Band>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let placeholders = vec!["?"; ids.len()].join(", ");
    let values: Vec<sea_orm::Value> = ids.iter().map(|id| id.clone().into()).collect();

    let mut features: HashMap<String, Vec<String>> = HashMap::new();
    let feature_rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT band_id, feature_name FROM band_features \
                 WHERE band_id IN ({}) ORDER BY position",
                placeholders
            ),
            values.clone(),
        ))
        .await
        .context("Failed to fetch band features")?;
    for row in feature_rows {
        let band_id: String = row.try_get("", "band_id")?;
        let name: String = row.try_get("", "feature_name")?;
        features.entry(band_id).or_default().push(name);
    }

    let mut compatibilities: HashMap<String, Vec<String>> = HashMap::new();
    let compat_rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT band_id, compatibility FROM band_compatibility \
                 WHERE band_id IN ({}) ORDER BY position",
                placeholders
            ),
            values,
        ))
        .await
        .context("Failed to fetch band compatibility")?;
    for row in compat_rows {
        let band_id: String = row.try_get("", "band_id")?;
        let value: String = row.try_get("", "compatibility")?;
        compatibilities.entry(band_id).or_default().push(value);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let f = features.remove(&row.id).unwrap_or_default();
            let c = compatibilities.remove(&row.id).unwrap_or_default();
            row.into_band(f, c)
        })
        .collect())
}

async fn select_bands<C: ConnectionTrait>(conn: &C, stmt: Statement) -> Result<Vec<Band>> {
    let rows = BandRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch bands")?;
    attach_lists(conn, rows).await
}

/// All active bands, featured first, then newest.
pub async fn list_active<C: ConnectionTrait>(conn: &C) -> Result<Vec<Band>> {
    select_bands(
        conn,
        Statement::from_string(
            DatabaseBackend::Sqlite,
            format!(
                "SELECT {} FROM bands WHERE active = 1 \
                 ORDER BY featured DESC, created_at DESC",
                BAND_COLUMNS
            ),
        ),
    )
    .await
}

pub async fn list_featured<C: ConnectionTrait>(conn: &C, limit: u64) -> Result<Vec<Band>> {
    select_bands(
        conn,
        Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT {} FROM bands WHERE active = 1 AND featured = 1 \
                 ORDER BY created_at DESC LIMIT ?",
                BAND_COLUMNS
            ),
            [limit.into()],
        ),
    )
    .await
}

pub async fn find_active<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<Band>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("SELECT {} FROM bands WHERE id = ? AND active = 1", BAND_COLUMNS),
        [id.into()],
    );
    let mut bands = select_bands(conn, stmt).await?;
    Ok(bands.pop())
}

/// Lookup without the active filter, for admin edits.
pub async fn find_any<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<Band>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("SELECT {} FROM bands WHERE id = ?", BAND_COLUMNS),
        [id.into()],
    );
    let mut bands = select_bands(conn, stmt).await?;
    Ok(bands.pop())
}

/// Category filters mirror the storefront navigation: `liquid-glass` and
/// `limited` are flag/stock based, `sport` and `premium` are material
/// groups, anything else lists every active band.
pub async fn list_by_category<C: ConnectionTrait>(conn: &C, category: &str) -> Result<Vec<Band>> {
    let filter = match category {
        "liquid-glass" => " AND liquid_glass = 1",
        "sport" => " AND material IN ('Fluoroelastomer', 'Silicone', 'Reinforced Silicone')",
        "premium" => " AND material IN ('Premium Leather', 'Premium Nylon')",
        "limited" => " AND stock < 10",
        _ => "",
    };

    select_bands(
        conn,
        Statement::from_string(
            DatabaseBackend::Sqlite,
            format!(
                "SELECT {} FROM bands WHERE active = 1{} ORDER BY created_at DESC",
                BAND_COLUMNS, filter
            ),
        ),
    )
    .await
}

/// Bands whose compatibility list names the size, or `All sizes`.
pub async fn list_compatible<C: ConnectionTrait>(
    conn: &C,
    size: &str,
    limit: Option<u64>,
) -> Result<Vec<Band>> {
    let limit_clause = match limit {
        Some(_) => " LIMIT ?",
        None => "",
    };
    let mut values: Vec<sea_orm::Value> = vec![size.into()];
    if let Some(limit) = limit {
        values.push(limit.into());
    }

    select_bands(
        conn,
        Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT {} FROM bands WHERE active = 1 AND id IN \
                 (SELECT band_id FROM band_compatibility \
                  WHERE compatibility = ? OR compatibility = 'All sizes') \
                 ORDER BY featured DESC, CAST(price AS REAL) ASC{}",
                BAND_COLUMNS, limit_clause
            ),
            values,
        ),
    )
    .await
}

/// Substring search over name, description, color and material.
pub async fn search<C: ConnectionTrait>(conn: &C, query: &str) -> Result<Vec<Band>> {
    let pattern = format!("%{}%", query);
    select_bands(
        conn,
        Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT {} FROM bands WHERE active = 1 AND \
                 (name LIKE ? OR description LIKE ? OR color LIKE ? OR material LIKE ?) \
                 ORDER BY featured DESC LIMIT 20",
                BAND_COLUMNS
            ),
            [
                pattern.clone().into(),
                pattern.clone().into(),
                pattern.clone().into(),
                pattern.into(),
            ],
        ),
    )
    .await
}

pub async fn insert<C: ConnectionTrait>(conn: &C, band: &Band) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO bands (id, name, description, price, color, material, stock, featured, \
         liquid_glass, active, image_url, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            band.id.clone().into(),
            band.name.clone().into(),
            band.description.clone().into(),
            band.price.to_string().into(),
            band.color.clone().into(),
            band.material.clone().into(),
            band.stock.into(),
            (if band.featured { 1 } else { 0 }).into(),
            (if band.liquid_glass { 1 } else { 0 }).into(),
            (if band.active { 1 } else { 0 }).into(),
            band.image_url.clone().into(),
            band.created_at.clone().into(),
            band.updated_at.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert band")?;

    Ok(())
}

/// Replace the band's feature list wholesale, keeping list order as the
/// stored position.
pub async fn replace_features<C: ConnectionTrait>(
    conn: &C,
    band_id: &str,
    features: &[String],
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM band_features WHERE band_id = ?",
        [band_id.into()],
    ))
    .await
    .context("Failed to clear band features")?;

    for (position, feature) in features.iter().enumerate() {
        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO band_features (id, band_id, feature_name, position) VALUES (?, ?, ?, ?)",
            [
                Uuid::new_v4().to_string().into(),
                band_id.into(),
                feature.clone().into(),
                (position as i32).into(),
            ],
        ))
        .await
        .context("Failed to insert band feature")?;
    }

    Ok(())
}

pub async fn replace_compatibilities<C: ConnectionTrait>(
    conn: &C,
    band_id: &str,
    compatibilities: &[String],
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM band_compatibility WHERE band_id = ?",
        [band_id.into()],
    ))
    .await
    .context("Failed to clear band compatibility")?;

    for (position, value) in compatibilities.iter().enumerate() {
        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO band_compatibility (id, band_id, compatibility, position) \
             VALUES (?, ?, ?, ?)",
            [
                Uuid::new_v4().to_string().into(),
                band_id.into(),
                value.clone().into(),
                (position as i32).into(),
            ],
        ))
        .await
        .context("Failed to insert band compatibility")?;
    }

    Ok(())
}

/// Partial-update payload: only `Some` fields are written.
#[derive(Debug, Default)]
pub struct BandPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub liquid_glass: Option<bool>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
}

impl BandPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.color.is_none()
            && self.material.is_none()
            && self.stock.is_none()
            && self.featured.is_none()
            && self.liquid_glass.is_none()
            && self.image_url.is_none()
            && self.active.is_none()
    }
}

/// Apply a partial update and bump `updated_at`. Returns false when no row
/// matched the id.
pub async fn update_partial<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    patch: &BandPatch,
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
    if let Some(color) = &patch.color {
        updates.push("color = ?");
        values.push(color.clone().into());
    }
    if let Some(material) = &patch.material {
        updates.push("material = ?");
        values.push(material.clone().into());
    }
    if let Some(stock) = patch.stock {
        updates.push("stock = ?");
        values.push(stock.into());
    }
    if let Some(featured) = patch.featured {
        updates.push("featured = ?");
        values.push((if featured { 1 } else { 0 }).into());
    }
    if let Some(liquid_glass) = patch.liquid_glass {
        updates.push("liquid_glass = ?");
        values.push((if liquid_glass { 1 } else { 0 }).into());
    }
    if let Some(image_url) = &patch.image_url {
        updates.push("image_url = ?");
        values.push(image_url.clone().into());
    }
    if let Some(active) = patch.active {
        updates.push("active = ?");
        values.push((if active { 1 } else { 0 }).into());
    }

    updates.push("updated_at = ?");
    values.push(chrono::Utc::now().to_rfc3339().into());
    values.push(id.into());

    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("UPDATE bands SET {} WHERE id = ?", updates.join(", ")),
            values,
        ))
        .await
        .context("Failed to update band")?;

    Ok(result.rows_affected() > 0)
}

/// Soft delete. Idempotent: deactivating a missing or already inactive band
/// is not an error.
pub async fn soft_delete<C: ConnectionTrait>(conn: &C, id: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE bands SET active = 0, updated_at = ? WHERE id = ?",
        [chrono::Utc::now().to_rfc3339().into(), id.into()],
    ))
    .await
    .context("Failed to deactivate band")?;

    Ok(())
}

/// Guarded decrement: only succeeds while enough stock remains, so two
/// concurrent checkouts cannot drive stock negative. Returns false when the
/// guard rejected the write.
pub async fn decrement_stock_guarded<C: ConnectionTrait>(
    conn: &C,
    band_id: &str,
    quantity: i32,
) -> Result<bool> {
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE bands SET stock = stock - ? WHERE id = ? AND stock >= ?",
            [quantity.into(), band_id.into(), quantity.into()],
        ))
        .await
        .context("Failed to decrement band stock")?;

    Ok(result.rows_affected() > 0)
}

/// Return cancelled quantities to stock.
pub async fn restore_stock<C: ConnectionTrait>(
    conn: &C,
    band_id: &str,
    quantity: i32,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE bands SET stock = stock + ? WHERE id = ?",
        [quantity.into(), band_id.into()],
    ))
    .await
    .context("Failed to restore band stock")?;

    Ok(())
}

pub async fn find_stock<C: ConnectionTrait>(conn: &C, band_id: &str) -> Result<Option<i32>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT stock FROM bands WHERE id = ?",
            [band_id.into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(Some(row.try_get("", "stock")?)),
        None => Ok(None),
    }
}

pub async fn count_active<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS count FROM bands WHERE active = 1".to_string(),
        ))
        .await?;

    match result {
        Some(row) => Ok(row.try_get("", "count")?),
        None => Ok(0),
    }
}
