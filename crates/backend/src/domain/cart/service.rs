use contracts::domain::{
    AddToCartRequest, AddToCartResponse, CartItemView, CartOwner, CartView, ClearCartRequest,
    MergeCartRequest, UpdateCartItemRequest,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::repository::{self, CartRecord};
use crate::domain::band;
use crate::shared::error::ApiError;

fn build_view(cart: CartRecord, items: Vec<CartItemView>) -> CartView {
    let total = items
        .iter()
        .map(|item| item.band_price * Decimal::from(item.quantity))
        .sum();
    let item_count = items.iter().map(|item| i64::from(item.quantity)).sum();

    CartView {
        id: Some(cart.id),
        user_id: cart.user_id,
        session_id: cart.session_id,
        items,
        total,
        item_count,
        created_at: Some(cart.created_at),
        updated_at: Some(cart.updated_at),
    }
}

/// Newest cart for the owner with items joined to live band data. Lines
/// whose band was deactivated are filtered out by the join; owners without
/// a cart get the empty-cart shape rather than an error.
pub async fn get_cart<C: ConnectionTrait>(conn: &C, owner: &CartOwner) -> Result<CartView, ApiError> {
    let cart = repository::find_for_owner(conn, owner)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch cart", e))?;
    let Some(cart) = cart else {
        return Ok(CartView::empty());
    };

    let items = repository::list_items_view(conn, &cart.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch cart", e))?;

    Ok(build_view(cart, items))
}

/// Add a band to the owner's cart, creating the cart on first use. An
/// existing line is incremented (only the added amount is checked against
/// stock) and gets a refreshed `added_at`.
pub async fn add_item(
    db: &DatabaseConnection,
    req: AddToCartRequest,
) -> Result<AddToCartResponse, ApiError> {
    let band_id = match req.band_id.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(id) => id,
        None => return Err(ApiError::validation("Band ID is required")),
    };
    let owner = CartOwner::from_ids(req.user_id, req.session_id)
        .ok_or_else(|| ApiError::validation("User ID or Session ID is required"))?;
    if req.quantity < 1 {
        return Err(ApiError::validation("Quantity must be at least 1"));
    }

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to add item to cart", e.into()))?;

    let band = band::repository::find_active(&txn, band_id)
        .await
        .map_err(|e| ApiError::internal("Failed to add item to cart", e))?
        .ok_or_else(|| ApiError::not_found("Band not found"))?;
    if band.stock < req.quantity {
        return Err(ApiError::OutOfStock(format!(
            "Only {} items available in stock",
            band.stock
        )));
    }

    let cart = match repository::find_for_owner(&txn, &owner)
        .await
        .map_err(|e| ApiError::internal("Failed to add item to cart", e))?
    {
        Some(cart) => cart,
        None => repository::create_for_owner(&txn, &owner)
            .await
            .map_err(|e| ApiError::internal("Failed to add item to cart", e))?,
    };

    match repository::find_line(&txn, &cart.id, band_id)
        .await
        .map_err(|e| ApiError::internal("Failed to add item to cart", e))?
    {
        Some((item_id, current)) => {
            repository::refresh_item(&txn, &item_id, current + req.quantity)
                .await
                .map_err(|e| ApiError::internal("Failed to add item to cart", e))?;
        }
        None => {
            repository::insert_item(&txn, &cart.id, band_id, req.quantity)
                .await
                .map_err(|e| ApiError::internal("Failed to add item to cart", e))?;
        }
    }

    repository::touch(&txn, &cart.id)
        .await
        .map_err(|e| ApiError::internal("Failed to add item to cart", e))?;
    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to add item to cart", e.into()))?;

    let items = repository::list_lines(db, &cart.id)
        .await
        .map_err(|e| ApiError::internal("Failed to add item to cart", e))?;

    Ok(AddToCartResponse {
        cart_id: cart.id,
        items,
    })
}

/// Set a line's quantity. Zero removes the line (returns `true`); any other
/// quantity is checked against current stock.
pub async fn update_item(
    db: &DatabaseConnection,
    req: UpdateCartItemRequest,
) -> Result<bool, ApiError> {
    let item_id = req.cart_item_id.as_deref().filter(|s| !s.trim().is_empty());
    let (item_id, quantity) = match (item_id, req.quantity) {
        (Some(id), Some(q)) => (id, q),
        _ => {
            return Err(ApiError::validation(
                "Cart item ID and quantity are required",
            ))
        }
    };
    if quantity < 0 {
        return Err(ApiError::validation("Quantity cannot be negative"));
    }

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to update cart", e.into()))?;

    let item = repository::find_item_with_stock(&txn, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to update cart", e))?
        .ok_or_else(|| ApiError::not_found("Cart item not found"))?;
    if quantity > item.stock {
        return Err(ApiError::OutOfStock(format!(
            "Only {} items available in stock",
            item.stock
        )));
    }

    if quantity == 0 {
        repository::delete_item(&txn, item_id)
            .await
            .map_err(|e| ApiError::internal("Failed to update cart", e))?;
    } else {
        repository::set_item_quantity(&txn, item_id, quantity)
            .await
            .map_err(|e| ApiError::internal("Failed to update cart", e))?;
    }

    repository::touch(&txn, &item.cart_id)
        .await
        .map_err(|e| ApiError::internal("Failed to update cart", e))?;
    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to update cart", e.into()))?;

    Ok(quantity == 0)
}

pub async fn remove_item(db: &DatabaseConnection, item_id: &str) -> Result<(), ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to remove item from cart", e.into()))?;

    let item = repository::find_item(&txn, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove item from cart", e))?
        .ok_or_else(|| ApiError::not_found("Cart item not found"))?;

    repository::delete_item(&txn, item_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove item from cart", e))?;
    repository::touch(&txn, &item.cart_id)
        .await
        .map_err(|e| ApiError::internal("Failed to remove item from cart", e))?;
    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to remove item from cart", e.into()))?;

    Ok(())
}

/// Delete every line of the cart. Succeeds for unknown cart ids too.
pub async fn clear(db: &DatabaseConnection, req: ClearCartRequest) -> Result<(), ApiError> {
    let cart_id = match req.cart_id.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(id) => id,
        None => return Err(ApiError::validation("Cart ID is required")),
    };

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to clear cart", e.into()))?;

    repository::delete_items(&txn, cart_id)
        .await
        .map_err(|e| ApiError::internal("Failed to clear cart", e))?;
    repository::touch(&txn, cart_id)
        .await
        .map_err(|e| ApiError::internal("Failed to clear cart", e))?;
    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to clear cart", e.into()))?;

    Ok(())
}

/// Fold the guest cart into the user's cart: colliding band ids sum their
/// quantities, the rest move over, and the guest cart is deleted. Returns
/// the user cart id, or `None` when there was no guest cart to merge.
pub async fn merge(
    db: &DatabaseConnection,
    req: MergeCartRequest,
) -> Result<Option<String>, ApiError> {
    let user_id = req.user_id.as_deref().filter(|s| !s.trim().is_empty());
    let session_id = req.session_id.as_deref().filter(|s| !s.trim().is_empty());
    let (user_id, session_id) = match (user_id, session_id) {
        (Some(u), Some(s)) => (u, s),
        _ => {
            return Err(ApiError::validation(
                "User ID and Session ID are required",
            ))
        }
    };
    let user_owner = CartOwner::User(user_id.to_string());
    let guest_owner = CartOwner::Guest(session_id.to_string());

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e.into()))?;

    let guest_cart = repository::find_for_owner(&txn, &guest_owner)
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e))?;
    let Some(guest_cart) = guest_cart else {
        txn.rollback()
            .await
            .map_err(|e| ApiError::internal("Failed to merge carts", e.into()))?;
        return Ok(None);
    };

    let user_cart = match repository::find_for_owner(&txn, &user_owner)
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e))?
    {
        Some(cart) => cart,
        None => repository::create_for_owner(&txn, &user_owner)
            .await
            .map_err(|e| ApiError::internal("Failed to merge carts", e))?,
    };

    let guest_items = repository::list_plain_items(&txn, &guest_cart.id)
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e))?;
    for (band_id, quantity) in guest_items {
        match repository::find_line(&txn, &user_cart.id, &band_id)
            .await
            .map_err(|e| ApiError::internal("Failed to merge carts", e))?
        {
            Some((item_id, current)) => {
                repository::set_item_quantity(&txn, &item_id, current + quantity)
                    .await
                    .map_err(|e| ApiError::internal("Failed to merge carts", e))?;
            }
            None => {
                repository::insert_item(&txn, &user_cart.id, &band_id, quantity)
                    .await
                    .map_err(|e| ApiError::internal("Failed to merge carts", e))?;
            }
        }
    }

    repository::delete_items(&txn, &guest_cart.id)
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e))?;
    repository::delete_cart(&txn, &guest_cart.id)
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e))?;
    repository::touch(&txn, &user_cart.id)
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e))?;
    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to merge carts", e.into()))?;

    Ok(Some(user_cart.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_db;
    use contracts::domain::{Band, BandInput};

    async fn seed_band(db: &DatabaseConnection, name: &str, price: &str, stock: i32) -> Band {
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
    }

    fn add_req(session: &str, band_id: &str, quantity: i32) -> AddToCartRequest {
        AddToCartRequest {
            user_id: None,
            session_id: Some(session.to_string()),
            band_id: Some(band_id.to_string()),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_get_cart_without_cart_is_empty_shape() {
        let db = test_db().await;
        let cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert_eq!(cart.id, None);
        assert!(cart.items.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
        assert_eq!(cart.item_count, 0);
    }

    #[tokio::test]
    async fn test_add_requires_band_and_owner() {
        let db = test_db().await;

        let err = add_item(
            &db,
            AddToCartRequest {
                user_id: None,
                session_id: Some("sess-1".into()),
                band_id: None,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Band ID is required");

        let err = add_item(
            &db,
            AddToCartRequest {
                user_id: None,
                session_id: None,
                band_id: Some("b1".into()),
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "User ID or Session ID is required");
    }

    #[tokio::test]
    async fn test_add_unknown_band_is_not_found() {
        let db = test_db().await;
        let err = add_item(&db, add_req("sess-1", "missing", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "Band not found");
    }

    #[tokio::test]
    async fn test_add_beyond_stock_is_out_of_stock() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 2).await;

        let err = add_item(&db, add_req("sess-1", &band.id, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::OutOfStock(_)));
        assert_eq!(err.to_string(), "Only 2 items available in stock");

        // Nothing was written.
        let cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert_eq!(cart.id, None);
    }

    #[tokio::test]
    async fn test_add_creates_cart_and_totals_follow() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 5).await;

        let added = add_item(&db, add_req("sess-1", &band.id, 3)).await.unwrap();
        assert_eq!(added.items.len(), 1);
        assert_eq!(added.items[0].quantity, 3);

        let cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert_eq!(cart.id, Some(added.cart_id));
        assert_eq!(cart.total.to_string(), "147.00");
        assert_eq!(cart.item_count, 3);
    }

    #[tokio::test]
    async fn test_add_increments_existing_line() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 5).await;

        add_item(&db, add_req("sess-1", &band.id, 2)).await.unwrap();
        let added = add_item(&db, add_req("sess-1", &band.id, 1)).await.unwrap();

        assert_eq!(added.items.len(), 1);
        assert_eq!(added.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 5).await;
        let added = add_item(&db, add_req("sess-1", &band.id, 3)).await.unwrap();

        let removed = update_item(
            &db,
            UpdateCartItemRequest {
                cart_item_id: Some(added.items[0].id.clone()),
                quantity: Some(0),
            },
        )
        .await
        .unwrap();
        assert!(removed);

        let cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
        assert_eq!(cart.item_count, 0);
    }

    #[tokio::test]
    async fn test_update_validates_quantity() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 2).await;
        let added = add_item(&db, add_req("sess-1", &band.id, 1)).await.unwrap();
        let item_id = added.items[0].id.clone();

        let err = update_item(
            &db,
            UpdateCartItemRequest {
                cart_item_id: Some(item_id.clone()),
                quantity: Some(-1),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Quantity cannot be negative");

        let err = update_item(
            &db,
            UpdateCartItemRequest {
                cart_item_id: Some(item_id),
                quantity: Some(5),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Only 2 items available in stock");

        let err = update_item(
            &db,
            UpdateCartItemRequest {
                cart_item_id: Some("missing".into()),
                quantity: Some(1),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_item_then_remove_again() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 5).await;
        let added = add_item(&db, add_req("sess-1", &band.id, 1)).await.unwrap();
        let item_id = added.items[0].id.clone();

        remove_item(&db, &item_id).await.unwrap();
        let cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert!(cart.items.is_empty());

        let err = remove_item(&db, &item_id).await.unwrap_err();
        assert_eq!(err.to_string(), "Cart item not found");
    }

    #[tokio::test]
    async fn test_clear_empties_cart_and_tolerates_unknown_ids() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 5).await;
        let added = add_item(&db, add_req("sess-1", &band.id, 2)).await.unwrap();

        clear(
            &db,
            ClearCartRequest {
                cart_id: Some(added.cart_id),
            },
        )
        .await
        .unwrap();
        let cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert!(cart.items.is_empty());

        clear(
            &db,
            ClearCartRequest {
                cart_id: Some("missing".into()),
            },
        )
        .await
        .unwrap();

        let err = clear(&db, ClearCartRequest { cart_id: None })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cart ID is required");
    }

    #[tokio::test]
    async fn test_inactive_bands_drop_out_of_cart_view() {
        let db = test_db().await;
        let band = seed_band(&db, "Sport Loop", "49.00", 5).await;
        add_item(&db, add_req("sess-1", &band.id, 2)).await.unwrap();

        band::service::delete(&db, &band.id).await.unwrap();

        let cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert!(cart.id.is_some());
        assert!(cart.items.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_merge_unions_quantities_and_deletes_guest_cart() {
        let db = test_db().await;
        let loop_band = seed_band(&db, "Sport Loop", "49.00", 10).await;
        let link_band = seed_band(&db, "Link Bracelet", "349.00", 10).await;

        // User cart: 1 loop. Guest cart: 2 loops and 1 link.
        add_item(
            &db,
            AddToCartRequest {
                user_id: Some("user-1".into()),
                session_id: None,
                band_id: Some(loop_band.id.clone()),
                quantity: 1,
            },
        )
        .await
        .unwrap();
        add_item(&db, add_req("sess-1", &loop_band.id, 2)).await.unwrap();
        add_item(&db, add_req("sess-1", &link_band.id, 1)).await.unwrap();

        let merged = merge(
            &db,
            MergeCartRequest {
                user_id: Some("user-1".into()),
                session_id: Some("sess-1".into()),
            },
        )
        .await
        .unwrap();
        assert!(merged.is_some());

        let user_cart = get_cart(&db, &CartOwner::User("user-1".into()))
            .await
            .unwrap();
        assert_eq!(user_cart.id, merged);
        assert_eq!(user_cart.items.len(), 2);
        assert_eq!(user_cart.item_count, 4);
        let loop_line = user_cart
            .items
            .iter()
            .find(|i| i.band_id == loop_band.id)
            .unwrap();
        assert_eq!(loop_line.quantity, 3);

        let guest_cart = get_cart(&db, &CartOwner::Guest("sess-1".into()))
            .await
            .unwrap();
        assert_eq!(guest_cart.id, None);

        // Nothing left to merge the second time around.
        let again = merge(
            &db,
            MergeCartRequest {
                user_id: Some("user-1".into()),
                session_id: Some("sess-1".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(again, None);
    }

    #[tokio::test]
    async fn test_merge_requires_both_identifiers() {
        let db = test_db().await;
        let err = merge(
            &db,
            MergeCartRequest {
                user_id: Some("user-1".into()),
                session_id: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "User ID and Session ID are required");
    }
}
