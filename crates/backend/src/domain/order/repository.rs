use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use contracts::domain::{OrderItemView, OrderSummary, OrderView};
use contracts::enums::OrderStatus;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};
use uuid::Uuid;

const ORDER_COLUMNS: &str =
    "id, order_number, user_id, total_amount, status, shipping_address, billing_address, \
     payment_method, tracking_number, notes, admin_notes, cancellation_reason, created_at, \
     updated_at";

/// Order row as stored. Addresses are serialized JSON; the amount is TEXT
/// with two decimal places.
#[derive(Debug, Clone, FromQueryResult)]
pub struct OrderRecord {
    pub id: String,
    pub order_number: String,
    pub user_id: Option<String>,
    pub total_amount: String,
    pub status: String,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl OrderRecord {
    pub fn into_view(self, items: Vec<OrderItemView>) -> OrderView {
        OrderView {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            total_amount: self.total_amount.parse().unwrap_or_default(),
            status: OrderStatus::from_code(&self.status).unwrap_or(OrderStatus::Pending),
            shipping_address: decode_address(self.shipping_address),
            billing_address: decode_address(self.billing_address),
            payment_method: self.payment_method,
            tracking_number: self.tracking_number,
            notes: self.notes,
            admin_notes: self.admin_notes,
            cancellation_reason: self.cancellation_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

fn decode_address(raw: Option<String>) -> Option<serde_json::Value> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

/// Cart line joined with the live band at checkout time.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub band_id: String,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, FromQueryResult)]
struct CheckoutLineRow {
    band_id: String,
    name: String,
    quantity: i32,
    price: String,
    stock: i32,
}

#[derive(Debug, FromQueryResult)]
struct ItemViewRow {
    order_id: String,
    id: String,
    band_id: String,
    quantity: i32,
    unit_price: String,
    band_name: Option<String>,
    band_description: Option<String>,
    band_image: Option<String>,
    band_color: Option<String>,
    band_material: Option<String>,
}

/// Plain row for in-service aggregation of the statistics overview.
#[derive(Debug, FromQueryResult)]
pub struct StatRow {
    pub status: String,
    pub total_amount: String,
    pub created_at: String,
}

// ============================================================================
// Checkout
// ============================================================================

/// Cart lines joined with live price/stock, active bands only.
pub async fn load_checkout_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: &str,
) -> Result<Vec<CheckoutLine>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT ci.band_id, b.name, ci.quantity, b.price, b.stock \
         FROM cart_items ci JOIN bands b ON b.id = ci.band_id \
         WHERE ci.cart_id = ? AND b.active = 1 ORDER BY ci.added_at",
        [cart_id.into()],
    );
    let rows = CheckoutLineRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch cart items for checkout")?;

    Ok(rows
        .into_iter()
        .map(|row| CheckoutLine {
            band_id: row.band_id,
            name: row.name,
            quantity: row.quantity,
            price: row.price.parse().unwrap_or_default(),
            stock: row.stock,
        })
        .collect())
}

pub async fn insert<C: ConnectionTrait>(conn: &C, order: &OrderRecord) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO orders (id, order_number, user_id, total_amount, status, shipping_address, \
         billing_address, payment_method, tracking_number, notes, admin_notes, \
         cancellation_reason, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            order.id.clone().into(),
            order.order_number.clone().into(),
            order.user_id.clone().into(),
            order.total_amount.clone().into(),
            order.status.clone().into(),
            order.shipping_address.clone().into(),
            order.billing_address.clone().into(),
            order.payment_method.clone().into(),
            order.tracking_number.clone().into(),
            order.notes.clone().into(),
            order.admin_notes.clone().into(),
            order.cancellation_reason.clone().into(),
            order.created_at.clone().into(),
            order.updated_at.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert order")?;

    Ok(())
}

/// Insert one order line with its unit-price snapshot.
pub async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    order_id: &str,
    band_id: &str,
    quantity: i32,
    unit_price: &str,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO order_items (id, order_id, band_id, quantity, unit_price, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
        [
            Uuid::new_v4().to_string().into(),
            order_id.into(),
            band_id.into(),
            quantity.into(),
            unit_price.into(),
            Utc::now().to_rfc3339().into(),
        ],
    ))
    .await
    .context("Failed to insert order item")?;

    Ok(())
}

// ============================================================================
// Reads
// ============================================================================

pub async fn find_by_number<C: ConnectionTrait>(
    conn: &C,
    order_number: &str,
) -> Result<Option<OrderRecord>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT {} FROM orders WHERE order_number = ?",
            ORDER_COLUMNS
        ),
        [order_number.into()],
    );
    OrderRecord::find_by_statement(stmt)
        .one(conn)
        .await
        .context("Failed to fetch order")
}

/// Join items (with band display fields) onto the given orders, preserving
/// the row order. Bands are LEFT JOINed because a band may have been hard
/// deleted after the order was placed.
pub async fn attach_items<C: ConnectionTrait>(
    conn: &C,
    records: Vec<OrderRecord>,
) -> Result<Vec<OrderView>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    let placeholders = vec!["?"; ids.len()].join(", ");
    let values: Vec<sea_orm::Value> = ids.iter().map(|id| id.clone().into()).collect();

    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT oi.order_id, oi.id, oi.band_id, oi.quantity, oi.unit_price, \
             b.name AS band_name, b.description AS band_description, \
             b.image_url AS band_image, b.color AS band_color, b.material AS band_material \
             FROM order_items oi LEFT JOIN bands b ON b.id = oi.band_id \
             WHERE oi.order_id IN ({}) ORDER BY oi.created_at",
            placeholders
        ),
        values,
    );
    let rows = ItemViewRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch order items")?;

    let mut items: HashMap<String, Vec<OrderItemView>> = HashMap::new();
    for row in rows {
        items
            .entry(row.order_id.clone())
            .or_default()
            .push(OrderItemView {
                id: row.id,
                band_id: row.band_id,
                quantity: row.quantity,
                unit_price: row.unit_price.parse().unwrap_or_default(),
                band_name: row.band_name,
                band_description: row.band_description,
                band_image: row.band_image,
                band_color: row.band_color,
                band_material: row.band_material,
            });
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let order_items = items.remove(&record.id).unwrap_or_default();
            record.into_view(order_items)
        })
        .collect())
}

pub async fn list_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<OrderRecord>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!(
            "SELECT {} FROM orders WHERE user_id = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ORDER_COLUMNS
        ),
        [user_id.into(), limit.into(), offset.into()],
    );
    OrderRecord::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch orders")
}

pub async fn count_for_user<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<i64> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS count FROM orders WHERE user_id = ?",
            [user_id.into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(row.try_get("", "count")?),
        None => Ok(0),
    }
}

pub async fn count_all<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS count FROM orders".to_string(),
        ))
        .await?;

    match result {
        Some(row) => Ok(row.try_get("", "count")?),
        None => Ok(0),
    }
}

/// All order lines as (band id, quantity), for stock restoration.
pub async fn list_plain_items<C: ConnectionTrait>(
    conn: &C,
    order_id: &str,
) -> Result<Vec<(String, i32)>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT band_id, quantity FROM order_items WHERE order_id = ?",
            [order_id.into()],
        ))
        .await
        .context("Failed to fetch order items")?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push((row.try_get("", "band_id")?, row.try_get("", "quantity")?));
    }
    Ok(items)
}

// ============================================================================
// Status changes
// ============================================================================

/// Write a new status plus any supplied tracking number / admin notes.
pub async fn update_status<C: ConnectionTrait>(
    conn: &C,
    order_id: &str,
    status: &str,
    tracking_number: Option<&str>,
    admin_notes: Option<&str>,
) -> Result<()> {
    let mut updates: Vec<&str> = vec!["status = ?"];
    let mut values: Vec<sea_orm::Value> = vec![status.into()];

    if let Some(tracking) = tracking_number {
        updates.push("tracking_number = ?");
        values.push(tracking.into());
    }
    if let Some(notes) = admin_notes {
        updates.push("admin_notes = ?");
        values.push(notes.into());
    }
    updates.push("updated_at = ?");
    values.push(Utc::now().to_rfc3339().into());
    values.push(order_id.into());

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        &format!("UPDATE orders SET {} WHERE id = ?", updates.join(", ")),
        values,
    ))
    .await
    .context("Failed to update order status")?;

    Ok(())
}

pub async fn mark_cancelled<C: ConnectionTrait>(
    conn: &C,
    order_id: &str,
    reason: &str,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE orders SET status = 'cancelled', cancellation_reason = ?, updated_at = ? \
         WHERE id = ?",
        [
            reason.into(),
            Utc::now().to_rfc3339().into(),
            order_id.into(),
        ],
    ))
    .await
    .context("Failed to cancel order")?;

    Ok(())
}

// ============================================================================
// Statistics
// ============================================================================

pub async fn list_stat_rows<C: ConnectionTrait>(conn: &C) -> Result<Vec<StatRow>> {
    let stmt = Statement::from_string(
        DatabaseBackend::Sqlite,
        "SELECT status, total_amount, created_at FROM orders".to_string(),
    );
    StatRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch order statistics")
}

pub async fn list_recent_summaries<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
) -> Result<Vec<OrderSummary>> {
    #[derive(FromQueryResult)]
    struct SummaryRow {
        order_number: String,
        total_amount: String,
        status: String,
        created_at: String,
    }

    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT order_number, total_amount, status, created_at FROM orders \
         ORDER BY created_at DESC LIMIT ?",
        [limit.into()],
    );
    let rows = SummaryRow::find_by_statement(stmt)
        .all(conn)
        .await
        .context("Failed to fetch recent orders")?;

    Ok(rows
        .into_iter()
        .map(|row| OrderSummary {
            order_number: row.order_number,
            total_amount: row.total_amount.parse().unwrap_or_default(),
            status: row.status,
            created_at: row.created_at,
        })
        .collect())
}
