use anyhow::{Context, Result};
use chrono::Utc;
use contracts::domain::{CartItemView, CartLine, CartOwner};
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};
use uuid::Uuid;

/// Cart row as stored. Exactly one of `user_id`/`session_id` is set.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CartRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Cart line without joins, for ownership checks and merging.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ItemRecord {
    pub id: String,
    pub cart_id: String,
    pub band_id: String,
    pub quantity: i32,
}

/// Cart line joined with the live stock of its band.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ItemWithStock {
    pub id: String,
    pub cart_id: String,
    pub band_id: String,
    pub quantity: i32,
    pub stock: i32,
}

#[derive(Debug, FromQueryResult)]
struct ItemViewRow {
    id: String,
    band_id: String,
    quantity: i32,
    added_at: String,
    band_name: String,
    band_price: String,
    band_image: Option<String>,
    band_color: Option<String>,
    band_material: Option<String>,
    band_stock: i32,
}

#[derive(Debug, FromQueryResult)]
struct LineRow {
    id: String,
    cart_id: String,
    band_id: String,
    quantity: i32,
    added_at: String,
    name: String,
    price: String,
    image_url: Option<String>,
    color: Option<String>,
    material: Option<String>,
}

fn owner_column(owner: &CartOwner) -> &'static str {
    match owner {
        CartOwner::User(_) => "user_id",
        CartOwner::Guest(_) => "session_id",
    }
}

// ============================================================================
// Carts
// ============================================================================

/// Most recently updated cart for the owner, if any.
pub async fn find_for_owner<C: ConnectionTrait>(
    conn: &C,
    owner: &CartOwner,
) -> Result<Option<CartRecord>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT id, user_id, session_id, created_at, updated_at FROM shopping_carts \
             WHERE {} = ? ORDER BY updated_at DESC LIMIT 1",
            owner_column(owner)
        ),
        [owner.key().into()],
    );
    CartRecord::find_by_statement(stmt)
        .one(conn)
        .await
        .context("Failed to fetch cart")
}

pub async fn create_for_owner<C: ConnectionTrait>(
    conn: &C,
    owner: &CartOwner,
) -> Result<CartRecord> {
    let now = Utc::now().to_rfc3339();
    let record = CartRecord {
        id: Uuid::new_v4().to_string(),
        user_id: match owner {
            CartOwner::User(id) => Some(id.clone()),
            CartOwner::Guest(_) => None,
        },
        session_id: match owner {
            CartOwner::User(_) => None,
            CartOwner::Guest(id) => Some(id.clone()),
        },
        created_at: now.clone(),
        updated_at: now,
    };

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO shopping_carts (id, user_id, session_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
        [
            record.id.clone().into(),
            record.user_id.clone().into(),
            record.session_id.clone().into(),
            record.created_at.clone().into(),
            record.updated_at.clone().into(),
        ],
    ))
    .await
    .context("Failed to create cart")?;

    Ok(record)
}

/// Bump the cart's `updated_at`. A no-op for unknown ids.
pub async fn touch<C: ConnectionTrait>(conn: &C, cart_id: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE shopping_carts SET updated_at = ? WHERE id = ?",
        [Utc::now().to_rfc3339().into(), cart_id.into()],
    ))
    .await
    .context("Failed to touch cart")?;

    Ok(())
}

pub async fn delete_cart<C: ConnectionTrait>(conn: &C, cart_id: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM shopping_carts WHERE id = ?",
        [cart_id.into()],
    ))
    .await
    .context("Failed to delete cart")?;

    Ok(())
}

// ============================================================================
// Items
// ============================================================================

/// Lines joined with live band data for the cart view. Lines whose band is
/// inactive drop out of the join.
pub async fn list_items_view<C: ConnectionTrait>(
    conn: &C,
    cart_id: &str,
) -> Result<Vec<CartItemView>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT ci.id, ci.band_id, ci.quantity, ci.added_at, b.name AS band_name, \
         b.price AS band_price, b.image_url AS band_image, b.color AS band_color, \
         b.material AS band_material, b.stock AS band_stock \
         FROM cart_items ci JOIN bands b ON b.id = ci.band_id \
         WHERE ci.cart_id = ? AND b.active = 1 ORDER BY ci.added_at",
        [cart_id.into()],
    );
    let rows = ItemViewRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch cart items")?;

    Ok(rows
        .into_iter()
        .map(|row| CartItemView {
            id: row.id,
            band_id: row.band_id,
            quantity: row.quantity,
            added_at: row.added_at,
            band_name: row.band_name,
            band_price: row.band_price.parse().unwrap_or_default(),
            band_image: row.band_image,
            band_color: row.band_color,
            band_material: row.band_material,
            band_stock: row.band_stock,
        })
        .collect())
}

/// Raw lines with band display fields, for the add-to-cart response.
pub async fn list_lines<C: ConnectionTrait>(conn: &C, cart_id: &str) -> Result<Vec<CartLine>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT ci.id, ci.cart_id, ci.band_id, ci.quantity, ci.added_at, b.name, b.price, \
         b.image_url, b.color, b.material \
         FROM cart_items ci JOIN bands b ON b.id = ci.band_id \
         WHERE ci.cart_id = ? ORDER BY ci.added_at",
        [cart_id.into()],
    );
    let rows = LineRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch cart items")?;

    Ok(rows
        .into_iter()
        .map(|row| CartLine {
            id: row.id,
            cart_id: row.cart_id,
            band_id: row.band_id,
            quantity: row.quantity,
            added_at: row.added_at,
            name: row.name,
            price: row.price.parse().unwrap_or_default(),
            image_url: row.image_url,
            color: row.color,
            material: row.material,
        })
        .collect())
}

pub async fn find_item<C: ConnectionTrait>(conn: &C, item_id: &str) -> Result<Option<ItemRecord>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT id, cart_id, band_id, quantity FROM cart_items WHERE id = ?",
        [item_id.into()],
    );
    ItemRecord::find_by_statement(stmt)
        .one(conn)
        .await
        .context("Failed to fetch cart item")
}

/// Line plus the live stock of its band; `None` when the line (or its band)
/// is gone.
pub async fn find_item_with_stock<C: ConnectionTrait>(
    conn: &C,
    item_id: &str,
) -> Result<Option<ItemWithStock>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT ci.id, ci.cart_id, ci.band_id, ci.quantity, b.stock \
         FROM cart_items ci JOIN bands b ON b.id = ci.band_id WHERE ci.id = ?",
        [item_id.into()],
    );
    ItemWithStock::find_by_statement(stmt)
        .one(conn)
        .await
        .context("Failed to fetch cart item")
}

/// The cart's line for a band, as (item id, quantity).
pub async fn find_line<C: ConnectionTrait>(
    conn: &C,
    cart_id: &str,
    band_id: &str,
) -> Result<Option<(String, i32)>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT id, quantity FROM cart_items WHERE cart_id = ? AND band_id = ?",
            [cart_id.into(), band_id.into()],
        ))
        .await
        .context("Failed to fetch cart item")?;

    match result {
        Some(row) => Ok(Some((row.try_get("", "id")?, row.try_get("", "quantity")?))),
        None => Ok(None),
    }
}

/// All lines of a cart as (band id, quantity), for merging.
pub async fn list_plain_items<C: ConnectionTrait>(
    conn: &C,
    cart_id: &str,
) -> Result<Vec<(String, i32)>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT band_id, quantity FROM cart_items WHERE cart_id = ? ORDER BY added_at",
            [cart_id.into()],
        ))
        .await
        .context("Failed to fetch cart items")?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push((row.try_get("", "band_id")?, row.try_get("", "quantity")?));
    }
    Ok(items)
}

pub async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    cart_id: &str,
    band_id: &str,
    quantity: i32,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO cart_items (id, cart_id, band_id, quantity, added_at) VALUES (?, ?, ?, ?, ?)",
        [
            Uuid::new_v4().to_string().into(),
            cart_id.into(),
            band_id.into(),
            quantity.into(),
            Utc::now().to_rfc3339().into(),
        ],
    ))
    .await
    .context("Failed to insert cart item")?;

    Ok(())
}

pub async fn set_item_quantity<C: ConnectionTrait>(
    conn: &C,
    item_id: &str,
    quantity: i32,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE cart_items SET quantity = ? WHERE id = ?",
        [quantity.into(), item_id.into()],
    ))
    .await
    .context("Failed to update cart item")?;

    Ok(())
}

/// Add-to-cart increments also refresh `added_at`.
pub async fn refresh_item<C: ConnectionTrait>(
    conn: &C,
    item_id: &str,
    quantity: i32,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE cart_items SET quantity = ?, added_at = ? WHERE id = ?",
        [
            quantity.into(),
            Utc::now().to_rfc3339().into(),
            item_id.into(),
        ],
    ))
    .await
    .context("Failed to update cart item")?;

    Ok(())
}

pub async fn delete_item<C: ConnectionTrait>(conn: &C, item_id: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM cart_items WHERE id = ?",
        [item_id.into()],
    ))
    .await
    .context("Failed to delete cart item")?;

    Ok(())
}

pub async fn delete_items<C: ConnectionTrait>(conn: &C, cart_id: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM cart_items WHERE cart_id = ?",
        [cart_id.into()],
    ))
    .await
    .context("Failed to clear cart items")?;

    Ok(())
}
