use contracts::dashboards::{AdminOverview, EntityCounts, RecentActivity, RevenueTotal};
use contracts::enums::OrderStatus;
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;

use crate::domain::{band, contact, order, watch};
use crate::shared::error::ApiError;
use crate::system::users;

const RECENT_LIMIT: u64 = 5;

/// Snapshot for the admin dashboard landing page: live catalog and
/// subscriber counts, all-time order and user counts, delivered revenue,
/// and the five most recent orders and contact submissions.
pub async fn overview<C: ConnectionTrait>(conn: &C) -> Result<AdminOverview, ApiError> {
    let bands = band::repository::count_active(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;
    let watches = watch::repository::count_active(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;
    let orders = order::repository::count_all(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;
    let users = users::repository::count(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;
    let subscribers = contact::repository::count_active_subscribers(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;

    // Only delivered orders count as realized revenue.
    let mut total = Decimal::ZERO;
    let stat_rows = order::repository::list_stat_rows(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;
    for row in &stat_rows {
        if row.status == OrderStatus::Delivered.code() {
            let amount: Decimal = row.total_amount.parse().unwrap_or_default();
            total += amount;
        }
    }

    let recent_orders = order::repository::list_recent_summaries(conn, RECENT_LIMIT)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;
    let recent_submissions = contact::repository::list_recent_submissions(conn, RECENT_LIMIT)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch admin statistics", e))?;

    Ok(AdminOverview {
        counts: EntityCounts {
            bands,
            watches,
            orders,
            users,
            subscribers,
        },
        revenue: RevenueTotal {
            total: total.round_dp(2),
        },
        recent_activity: RecentActivity {
            orders: recent_orders,
            contact_submissions: recent_submissions,
        },
    })
}

#[cfg(test)]
mod tests {
    use contracts::domain::{
        AddToCartRequest, BandInput, CreateOrderRequest, UpdateOrderStatusRequest, WatchInput,
    };
    use contracts::system::auth::RegisterRequest;
    use sea_orm::DatabaseConnection;
    use serde_json::json;

    use super::*;
    use crate::domain::cart::service as cart_service;
    use crate::domain::order::service as order_service;
    use crate::shared::data::db::test_db;

    async fn seed_band(db: &DatabaseConnection, name: &str, price: &str, stock: i32) -> String {
        band::service::create(
            db,
            BandInput {
                name: Some(name.to_string()),
                price: Some(price.parse().unwrap()),
                stock: Some(stock),
                ..BandInput::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn place_order(db: &DatabaseConnection, session: &str, band_id: &str) -> String {
        let cart_id = cart_service::add_item(
            db,
            AddToCartRequest {
                user_id: None,
                session_id: Some(session.to_string()),
                band_id: Some(band_id.to_string()),
                quantity: 1,
            },
        )
        .await
        .unwrap()
        .cart_id;
        order_service::create_order(
            db,
            CreateOrderRequest {
                user_id: None,
                cart_id: Some(cart_id),
                shipping_address: Some(json!({"city": "Austin"})),
                billing_address: None,
                payment_method: None,
                notes: None,
            },
        )
        .await
        .unwrap()
        .order_number
    }

    #[tokio::test]
    async fn test_overview_on_empty_database() {
        let conn = test_db().await;
        let snapshot = overview(&conn).await.unwrap();
        assert_eq!(snapshot.counts.bands, 0);
        assert_eq!(snapshot.counts.orders, 0);
        assert_eq!(snapshot.revenue.total, Decimal::ZERO);
        assert!(snapshot.recent_activity.orders.is_empty());
        assert!(snapshot.recent_activity.contact_submissions.is_empty());
    }

    #[tokio::test]
    async fn test_overview_counts_live_rows_and_delivered_revenue() {
        let conn = test_db().await;

        let band_id = seed_band(&conn, "Sport Loop", "49.00", 10).await;
        let retired = seed_band(&conn, "Retired Loop", "29.00", 10).await;
        band::service::delete(&conn, &retired).await.unwrap();

        watch::service::create(
            &conn,
            WatchInput {
                name: Some("Pulse One".to_string()),
                price: Some("399.00".parse().unwrap()),
                ..WatchInput::default()
            },
        )
        .await
        .unwrap();

        crate::system::users::service::register(
            &conn,
            "test-secret",
            RegisterRequest {
                email: Some("ana@example.com".to_string()),
                password: Some("longenough".to_string()),
                name: Some("Ana".to_string()),
                apple_id: None,
            },
        )
        .await
        .unwrap();

        contact::repository::insert_subscriber(&conn, "ana@example.com")
            .await
            .unwrap();
        contact::repository::insert_subscriber(&conn, "gone@example.com")
            .await
            .unwrap();
        contact::repository::deactivate_subscriber(&conn, "gone@example.com", "No reason provided")
            .await
            .unwrap();

        let delivered = place_order(&conn, "sess-1", &band_id).await;
        let pending = place_order(&conn, "sess-2", &band_id).await;
        order_service::update_status(
            &conn,
            &delivered,
            UpdateOrderStatusRequest {
                status: Some("delivered".to_string()),
                tracking_number: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        contact::repository::insert_submission(&conn, "Ana", "ana@example.com", None, "hi", None)
            .await
            .unwrap();

        let snapshot = overview(&conn).await.unwrap();
        assert_eq!(snapshot.counts.bands, 1);
        assert_eq!(snapshot.counts.watches, 1);
        assert_eq!(snapshot.counts.orders, 2);
        assert_eq!(snapshot.counts.users, 1);
        assert_eq!(snapshot.counts.subscribers, 1);

        // One delivered order at 49.00; the pending one does not count.
        assert_eq!(snapshot.revenue.total.to_string(), "49.00");

        assert_eq!(snapshot.recent_activity.orders.len(), 2);
        assert_eq!(snapshot.recent_activity.orders[0].order_number, pending);
        assert_eq!(snapshot.recent_activity.contact_submissions.len(), 1);
    }
}
