use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use contracts::domain::{
    CancelOrderRequest, CreateOrderRequest, CreateOrderResponse, MonthlyRevenue, OrderStatistics,
    OrderView, RevenueSummary, StatusCount, UpdateOrderStatusRequest,
};
use contracts::enums::OrderStatus;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use super::repository::{self, OrderRecord};
use crate::domain::{band, cart};
use crate::shared::error::ApiError;

/// Orders shown on the statistics overview.
const RECENT_ORDERS: u64 = 10;

/// Months covered by the revenue-by-month series, current month included.
const TRAILING_MONTHS: usize = 6;

/// `PU-<epoch millis>-<6 uppercase hex>`. Collisions are treated as
/// negligible, not deduplicated.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("PU-{}-{:06X}", millis, suffix)
}

// ============================================================================
// Checkout
// ============================================================================

/// The atomic checkout flow: load the cart, check every line against live
/// stock, snapshot prices, insert the order, decrement stock, and empty the
/// cart. Any failure rolls the whole flow back.
pub async fn create_order(
    db: &DatabaseConnection,
    req: CreateOrderRequest,
) -> Result<CreateOrderResponse, ApiError> {
    let cart_id = req.cart_id.as_deref().filter(|s| !s.trim().is_empty());
    let shipping = req.shipping_address.filter(|v| !v.is_null());
    let (cart_id, shipping) = match (cart_id, shipping) {
        (Some(c), Some(s)) => (c, s),
        _ => {
            return Err(ApiError::validation(
                "Cart ID and shipping address are required",
            ))
        }
    };

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e.into()))?;

    let lines = repository::load_checkout_lines(&txn, cart_id)
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e))?;
    if lines.is_empty() {
        return Err(ApiError::validation("Cart is empty"));
    }

    // All lines are checked before any stock is touched.
    for line in &lines {
        if line.stock < line.quantity {
            return Err(ApiError::OutOfStock(format!(
                "Insufficient stock for {}. Only {} available.",
                line.name, line.stock
            )));
        }
    }

    let total: Decimal = lines
        .iter()
        .map(|line| line.price * Decimal::from(line.quantity))
        .sum();

    let billing = req
        .billing_address
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| shipping.clone());
    let shipping_json = serde_json::to_string(&shipping)
        .map_err(|e| ApiError::internal("Failed to create order", e.into()))?;
    let billing_json = serde_json::to_string(&billing)
        .map_err(|e| ApiError::internal("Failed to create order", e.into()))?;

    let now = Utc::now().to_rfc3339();
    let record = OrderRecord {
        id: Uuid::new_v4().to_string(),
        order_number: generate_order_number(),
        user_id: req.user_id.filter(|s| !s.trim().is_empty()),
        total_amount: format!("{:.2}", total),
        status: OrderStatus::Pending.code().to_string(),
        shipping_address: Some(shipping_json),
        billing_address: Some(billing_json),
        payment_method: Some(
            req.payment_method
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "credit_card".to_string()),
        ),
        tracking_number: None,
        notes: req.notes.filter(|s| !s.trim().is_empty()),
        admin_notes: None,
        cancellation_reason: None,
        created_at: now.clone(),
        updated_at: now,
    };

    repository::insert(&txn, &record)
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e))?;

    for line in &lines {
        repository::insert_item(
            &txn,
            &record.id,
            &line.band_id,
            line.quantity,
            &line.price.to_string(),
        )
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e))?;

        // Guarded decrement: a concurrent checkout that got here first makes
        // the update match zero rows instead of driving stock negative.
        let decremented =
            band::repository::decrement_stock_guarded(&txn, &line.band_id, line.quantity)
                .await
                .map_err(|e| ApiError::internal("Failed to create order", e))?;
        if !decremented {
            let stock = band::repository::find_stock(&txn, &line.band_id)
                .await
                .map_err(|e| ApiError::internal("Failed to create order", e))?
                .unwrap_or(0);
            return Err(ApiError::OutOfStock(format!(
                "Insufficient stock for {}. Only {} available.",
                line.name, stock
            )));
        }
    }

    cart::repository::delete_items(&txn, cart_id)
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e))?;
    cart::repository::touch(&txn, cart_id)
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e))?;

    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e.into()))?;

    let order_number = record.order_number.clone();
    let order_id = record.id.clone();
    let mut orders = repository::attach_items(db, vec![record])
        .await
        .map_err(|e| ApiError::internal("Failed to create order", e))?;
    let order = orders.pop().ok_or_else(|| {
        ApiError::internal(
            "Failed to create order",
            anyhow::anyhow!("order vanished after insert"),
        )
    })?;

    Ok(CreateOrderResponse {
        order,
        order_number,
        order_id,
    })
}

// ============================================================================
// Reads
// ============================================================================

pub async fn get_order<C: ConnectionTrait>(
    conn: &C,
    order_number: &str,
) -> Result<OrderView, ApiError> {
    let record = repository::find_by_number(conn, order_number)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch order", e))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let mut orders = repository::attach_items(conn, vec![record])
        .await
        .map_err(|e| ApiError::internal("Failed to fetch order", e))?;
    orders
        .pop()
        .ok_or_else(|| ApiError::not_found("Order not found"))
}

/// Newest first, items included, plus the unpaginated total for metadata.
pub async fn list_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    limit: u64,
    offset: u64,
) -> Result<(Vec<OrderView>, i64), ApiError> {
    let records = repository::list_for_user(conn, user_id, limit, offset)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch orders", e))?;
    let orders = repository::attach_items(conn, records)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch orders", e))?;
    let total = repository::count_for_user(conn, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch orders", e))?;

    Ok((orders, total))
}

// ============================================================================
// Status changes
// ============================================================================

/// Admin status update. Transitions only move forward along the fulfilment
/// path; a same-status update is allowed so tracking numbers and notes can
/// be attached. Cancellation is not reachable from here because it has to
/// restore stock.
pub async fn update_status(
    db: &DatabaseConnection,
    order_number: &str,
    req: UpdateOrderStatusRequest,
) -> Result<OrderView, ApiError> {
    let code = match req.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(code) => code,
        None => return Err(ApiError::validation("Status is required")),
    };
    let next = OrderStatus::from_code(code).ok_or_else(|| {
        ApiError::validation(
            "Invalid status. Must be one of: pending, processing, shipped, delivered, cancelled",
        )
    })?;
    if next == OrderStatus::Cancelled {
        return Err(ApiError::Conflict(
            "Orders are cancelled through the cancel endpoint".to_string(),
        ));
    }

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to update order status", e.into()))?;

    let record = repository::find_by_number(&txn, order_number)
        .await
        .map_err(|e| ApiError::internal("Failed to update order status", e))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let current = OrderStatus::from_code(&record.status).unwrap_or(OrderStatus::Pending);
    match (current.rank(), next.rank()) {
        (None, _) => {
            return Err(ApiError::Conflict(
                "Cancelled orders cannot be updated".to_string(),
            ))
        }
        (Some(from), Some(to)) if to < from => {
            return Err(ApiError::Conflict(format!(
                "Order status cannot move back from {} to {}",
                current.code(),
                next.code()
            )))
        }
        _ => {}
    }

    repository::update_status(
        &txn,
        &record.id,
        next.code(),
        req.tracking_number.as_deref().filter(|s| !s.trim().is_empty()),
        req.notes.as_deref().filter(|s| !s.trim().is_empty()),
    )
    .await
    .map_err(|e| ApiError::internal("Failed to update order status", e))?;

    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to update order status", e.into()))?;

    get_order(db, order_number).await
}

/// Cancel and restore every line's quantity to band stock, atomically.
pub async fn cancel_order(
    db: &DatabaseConnection,
    order_number: &str,
    req: CancelOrderRequest,
) -> Result<(), ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to cancel order", e.into()))?;

    let record = repository::find_by_number(&txn, order_number)
        .await
        .map_err(|e| ApiError::internal("Failed to cancel order", e))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let status = OrderStatus::from_code(&record.status).unwrap_or(OrderStatus::Pending);
    if !status.is_cancellable() {
        let message = if status == OrderStatus::Cancelled {
            "Order is already cancelled"
        } else {
            "Delivered orders cannot be cancelled"
        };
        return Err(ApiError::Conflict(message.to_string()));
    }

    let items = repository::list_plain_items(&txn, &record.id)
        .await
        .map_err(|e| ApiError::internal("Failed to cancel order", e))?;
    for (band_id, quantity) in items {
        band::repository::restore_stock(&txn, &band_id, quantity)
            .await
            .map_err(|e| ApiError::internal("Failed to cancel order", e))?;
    }

    let reason = req
        .reason
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Customer request".to_string());
    repository::mark_cancelled(&txn, &record.id, &reason)
        .await
        .map_err(|e| ApiError::internal("Failed to cancel order", e))?;

    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to cancel order", e.into()))?;

    Ok(())
}

// ============================================================================
// Statistics
// ============================================================================

fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Read-only overview: per-status counts, revenue figures, the most recent
/// orders, and revenue per month over the trailing six months. Cancelled
/// orders count toward `totalOrders` but not toward revenue.
pub async fn statistics<C: ConnectionTrait>(conn: &C) -> Result<OrderStatistics, ApiError> {
    let rows = repository::list_stat_rows(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch order statistics", e))?;

    let mut by_status: HashMap<String, i64> = HashMap::new();
    let mut total = Decimal::ZERO;
    let mut delivered = Decimal::ZERO;
    let mut counted: i64 = 0;
    let mut per_month: HashMap<String, (Decimal, i64)> = HashMap::new();

    for row in &rows {
        *by_status.entry(row.status.clone()).or_default() += 1;

        if row.status == OrderStatus::Cancelled.code() {
            continue;
        }
        let amount: Decimal = row.total_amount.parse().unwrap_or_default();
        total += amount;
        counted += 1;
        if row.status == OrderStatus::Delivered.code() {
            delivered += amount;
        }

        if let Ok(created) = DateTime::parse_from_rfc3339(&row.created_at) {
            let created = created.with_timezone(&Utc);
            let entry = per_month
                .entry(month_key(created.year(), created.month()))
                .or_insert((Decimal::ZERO, 0));
            entry.0 += amount;
            entry.1 += 1;
        }
    }

    let status_counts = OrderStatus::all()
        .into_iter()
        .map(|status| StatusCount {
            status: status.code().to_string(),
            count: by_status.get(status.code()).copied().unwrap_or(0),
        })
        .collect();

    let average_order_value = if counted > 0 {
        (total / Decimal::from(counted)).round_dp(2)
    } else {
        Decimal::ZERO
    };
    let revenue = RevenueSummary {
        total: total.round_dp(2),
        delivered: delivered.round_dp(2),
        average_order_value,
        total_orders: rows.len() as i64,
    };

    let recent_orders = repository::list_recent_summaries(conn, RECENT_ORDERS)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch order statistics", e))?;

    // Trailing months, newest first, zero months included.
    let now = Utc::now();
    let (mut year, mut month) = (now.year(), now.month());
    let mut monthly_revenue = Vec::with_capacity(TRAILING_MONTHS);
    for _ in 0..TRAILING_MONTHS {
        let key = month_key(year, month);
        let (revenue, orders) = per_month.get(&key).copied().unwrap_or((Decimal::ZERO, 0));
        monthly_revenue.push(MonthlyRevenue {
            month: key,
            revenue: revenue.round_dp(2),
            orders,
        });
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    Ok(OrderStatistics {
        status_counts,
        revenue,
        recent_orders,
        monthly_revenue,
    })
}
