use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::OrderStatus;

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: String,
    pub order_number: String,
    pub user_id: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
    pub payment_method: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub items: Vec<OrderItemView>,
}

/// Order line joined with live band data. The band fields are optional
/// because the band may have been deleted since the order was placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: String,
    pub band_id: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub band_name: Option<String>,
    pub band_description: Option<String>,
    pub band_image: Option<String>,
    pub band_color: Option<String>,
    pub band_material: Option<String>,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "cartId", default)]
    pub cart_id: Option<String>,
    #[serde(rename = "shippingAddress", default)]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(rename = "billingAddress", default)]
    pub billing_address: Option<serde_json::Value>,
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order: OrderView,
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "trackingNumber", default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Cancellation reason travels in the body, which cancel buttons often
/// omit entirely.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatistics {
    #[serde(rename = "statusCounts")]
    pub status_counts: Vec<StatusCount>,
    pub revenue: RevenueSummary,
    #[serde(rename = "recentOrders")]
    pub recent_orders: Vec<OrderSummary>,
    #[serde(rename = "monthlyRevenue")]
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub total: Decimal,
    pub delivered: Decimal,
    #[serde(rename = "averageOrderValue")]
    pub average_order_value: Decimal,
    #[serde(rename = "totalOrders")]
    pub total_orders: i64,
}

/// Slim row for the recent-orders panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_number: String,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
    pub orders: i64,
}
