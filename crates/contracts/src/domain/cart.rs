use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Ownership
// ============================================================================

/// Cart ownership: a signed-in user or an anonymous session, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    User(String),
    Guest(String),
}

impl CartOwner {
    /// Resolve ownership from optional request identifiers. The user id wins
    /// when both are supplied; `None` when neither is usable.
    pub fn from_ids(user_id: Option<String>, session_id: Option<String>) -> Option<Self> {
        match (user_id, session_id) {
            (Some(u), _) if !u.trim().is_empty() => Some(CartOwner::User(u)),
            (_, Some(s)) if !s.trim().is_empty() => Some(CartOwner::Guest(s)),
            _ => None,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            CartOwner::User(id) => id,
            CartOwner::Guest(id) => id,
        }
    }
}

// ============================================================================
// Views
// ============================================================================

/// Cart as returned by GET /api/cart. `empty()` is the no-cart shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub id: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub items: Vec<CartItemView>,
    pub total: Decimal,
    #[serde(rename = "itemCount")]
    pub item_count: i64,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CartView {
    pub fn empty() -> Self {
        Self {
            id: None,
            user_id: None,
            session_id: None,
            items: Vec::new(),
            total: Decimal::ZERO,
            item_count: 0,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Cart line joined with live band data. `band_stock` is the stock at read
/// time, so clients can cap the quantity picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemView {
    pub id: String,
    pub band_id: String,
    pub quantity: i32,
    pub added_at: String,
    pub band_name: String,
    pub band_price: Decimal,
    pub band_image: Option<String>,
    pub band_color: Option<String>,
    pub band_material: Option<String>,
    pub band_stock: i32,
}

/// Raw cart line as returned by the add-to-cart response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub cart_id: String,
    pub band_id: String,
    pub quantity: i32,
    pub added_at: String,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
}

// ============================================================================
// Requests
// ============================================================================

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(rename = "bandId", default)]
    pub band_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    #[serde(rename = "cartItemId", default)]
    pub cart_item_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCartRequest {
    #[serde(rename = "cartId", default)]
    pub cart_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCartRequest {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartResponse {
    #[serde(rename = "cartId")]
    pub cart_id: String,
    pub items: Vec<CartLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_user_wins_over_session() {
        let owner = CartOwner::from_ids(Some("u1".into()), Some("s1".into()));
        assert_eq!(owner, Some(CartOwner::User("u1".into())));
    }

    #[test]
    fn test_owner_requires_some_identifier() {
        assert_eq!(CartOwner::from_ids(None, None), None);
        assert_eq!(CartOwner::from_ids(Some("  ".into()), None), None);
        assert_eq!(
            CartOwner::from_ids(None, Some("sess-9".into())),
            Some(CartOwner::Guest("sess-9".into()))
        );
    }

    #[test]
    fn test_add_request_defaults_quantity_to_one() {
        let req: AddToCartRequest =
            serde_json::from_str(r#"{"sessionId":"s1","bandId":"b1"}"#).unwrap();
        assert_eq!(req.quantity, 1);
        assert_eq!(req.band_id.as_deref(), Some("b1"));
    }
}
