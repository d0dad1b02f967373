use chrono::Utc;
use contracts::domain::{Band, BandInput};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use super::repository::{self, BandPatch};
use crate::shared::error::ApiError;

/// Storefront shows at most this many featured bands.
const FEATURED_LIMIT: u64 = 6;

// ============================================================================
// Reads
// ============================================================================

pub async fn list<C: ConnectionTrait>(conn: &C) -> Result<Vec<Band>, ApiError> {
    repository::list_active(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch bands", e))
}

pub async fn featured<C: ConnectionTrait>(conn: &C) -> Result<Vec<Band>, ApiError> {
    repository::list_featured(conn, FEATURED_LIMIT)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch featured bands", e))
}

pub async fn get<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Band, ApiError> {
    repository::find_active(conn, id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch band", e))?
        .ok_or_else(|| ApiError::not_found("Band not found"))
}

pub async fn by_category<C: ConnectionTrait>(conn: &C, category: &str) -> Result<Vec<Band>, ApiError> {
    repository::list_by_category(conn, category)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch bands", e))
}

pub async fn compatible_with<C: ConnectionTrait>(conn: &C, size: &str) -> Result<Vec<Band>, ApiError> {
    repository::list_compatible(conn, size, None)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch compatible bands", e))
}

pub async fn search<C: ConnectionTrait>(conn: &C, query: &str) -> Result<Vec<Band>, ApiError> {
    repository::search(conn, query)
        .await
        .map_err(|e| ApiError::internal("Failed to search bands", e))
}

// ============================================================================
// Admin writes
// ============================================================================

/// Create a band with its feature and compatibility lists in one
/// transaction.
pub async fn create(db: &DatabaseConnection, input: BandInput) -> Result<Band, ApiError> {
    let name = input.name.filter(|s| !s.trim().is_empty());
    let (name, price) = match (name, input.price) {
        (Some(n), Some(p)) => (n, p),
        _ => return Err(ApiError::validation("Name and price are required")),
    };

    let now = Utc::now().to_rfc3339();
    let band = Band {
        id: Uuid::new_v4().to_string(),
        name,
        description: input.description,
        price,
        color: input.color,
        material: input.material,
        stock: input.stock.unwrap_or(0),
        featured: input.featured.unwrap_or(false),
        liquid_glass: input.liquid_glass.unwrap_or(false),
        active: input.active.unwrap_or(true),
        image_url: input.image_url,
        features: input.features.unwrap_or_default(),
        compatibilities: input.compatibilities.unwrap_or_default(),
        created_at: now.clone(),
        updated_at: now,
    };

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to create band", e.into()))?;

    repository::insert(&txn, &band)
        .await
        .map_err(|e| ApiError::internal("Failed to create band", e))?;
    repository::replace_features(&txn, &band.id, &band.features)
        .await
        .map_err(|e| ApiError::internal("Failed to create band", e))?;
    repository::replace_compatibilities(&txn, &band.id, &band.compatibilities)
        .await
        .map_err(|e| ApiError::internal("Failed to create band", e))?;

    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to create band", e.into()))?;

    Ok(band)
}

/// Partial update: only supplied fields are written; supplying a feature or
/// compatibility list replaces the stored list wholesale.
pub async fn update(db: &DatabaseConnection, id: &str, input: BandInput) -> Result<Band, ApiError> {
    let patch = BandPatch {
        name: input.name,
        description: input.description,
        price: input.price.map(|p| p.to_string()),
        color: input.color,
        material: input.material,
        stock: input.stock,
        featured: input.featured,
        liquid_glass: input.liquid_glass,
        image_url: input.image_url,
        active: input.active,
    };

    let txn = db
        .begin()
        .await
        .map_err(|e| ApiError::internal("Failed to update band", e.into()))?;

    // Admin edits also apply to deactivated bands.
    let existing = repository::find_any(&txn, id)
        .await
        .map_err(|e| ApiError::internal("Failed to update band", e))?;
    if existing.is_none() {
        return Err(ApiError::not_found("Band not found"));
    }

    if !patch.is_empty() {
        repository::update_partial(&txn, id, &patch)
            .await
            .map_err(|e| ApiError::internal("Failed to update band", e))?;
    }
    if let Some(features) = &input.features {
        repository::replace_features(&txn, id, features)
            .await
            .map_err(|e| ApiError::internal("Failed to update band", e))?;
    }
    if let Some(compatibilities) = &input.compatibilities {
        repository::replace_compatibilities(&txn, id, compatibilities)
            .await
            .map_err(|e| ApiError::internal("Failed to update band", e))?;
    }

    txn.commit()
        .await
        .map_err(|e| ApiError::internal("Failed to update band", e.into()))?;

    repository::find_any(db, id)
        .await
        .map_err(|e| ApiError::internal("Failed to update band", e))?
        .ok_or_else(|| ApiError::not_found("Band not found"))
}

/// Soft delete; succeeds for unknown ids as well.
pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> Result<(), ApiError> {
    repository::soft_delete(conn, id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete band", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_db;

    fn input(name: &str, price: &str) -> BandInput {
        BandInput {
            name: Some(name.to_string()),
            price: Some(price.parse().unwrap()),
            ..BandInput::default()
        }
    }

    #[tokio::test]
    async fn test_create_requires_name_and_price() {
        let conn = test_db().await;
        let err = create(&conn, BandInput::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Name and price are required");

        let err = create(
            &conn,
            BandInput {
                name: Some("   ".to_string()),
                price: Some("19.99".parse().unwrap()),
                ..BandInput::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Name and price are required");
    }

    #[tokio::test]
    async fn test_create_then_get_keeps_lists_ordered() {
        let conn = test_db().await;
        let created = create(
            &conn,
            BandInput {
                features: Some(vec!["Breathable".into(), "Sweat resistant".into()]),
                compatibilities: Some(vec!["45mm".into(), "49mm".into()]),
                ..input("Sport Loop", "49.00")
            },
        )
        .await
        .unwrap();

        let fetched = get(&conn, &created.id).await.unwrap();
        assert_eq!(fetched.name, "Sport Loop");
        assert_eq!(fetched.features, vec!["Breathable", "Sweat resistant"]);
        assert_eq!(fetched.compatibilities, vec!["45mm", "49mm"]);
        assert!(fetched.active);
    }

    #[tokio::test]
    async fn test_get_unknown_band_is_not_found() {
        let conn = test_db().await;
        let err = get(&conn, "missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "Band not found");
    }

    #[tokio::test]
    async fn test_list_puts_featured_first() {
        let conn = test_db().await;
        create(&conn, input("Plain", "29.00")).await.unwrap();
        create(
            &conn,
            BandInput {
                featured: Some(true),
                ..input("Hero", "59.00")
            },
        )
        .await
        .unwrap();

        let bands = list(&conn).await.unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].name, "Hero");

        let top = featured(&conn).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Hero");
    }

    #[tokio::test]
    async fn test_category_filters() {
        let conn = test_db().await;
        create(
            &conn,
            BandInput {
                material: Some("Silicone".into()),
                stock: Some(50),
                ..input("Runner", "39.00")
            },
        )
        .await
        .unwrap();
        create(
            &conn,
            BandInput {
                material: Some("Premium Leather".into()),
                stock: Some(3),
                ..input("Classic", "99.00")
            },
        )
        .await
        .unwrap();
        create(
            &conn,
            BandInput {
                liquid_glass: Some(true),
                stock: Some(20),
                ..input("Glass", "149.00")
            },
        )
        .await
        .unwrap();

        let sport = by_category(&conn, "sport").await.unwrap();
        assert_eq!(sport.len(), 1);
        assert_eq!(sport[0].name, "Runner");

        let premium = by_category(&conn, "premium").await.unwrap();
        assert_eq!(premium.len(), 1);
        assert_eq!(premium[0].name, "Classic");

        let limited = by_category(&conn, "limited").await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].name, "Classic");

        let glass = by_category(&conn, "liquid-glass").await.unwrap();
        assert_eq!(glass.len(), 1);
        assert_eq!(glass[0].name, "Glass");

        // An unrecognized category applies no extra filter.
        let all = by_category(&conn, "everything").await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_compatible_matches_size_or_all_sizes() {
        let conn = test_db().await;
        create(
            &conn,
            BandInput {
                compatibilities: Some(vec!["41mm".into(), "45mm".into()]),
                ..input("Sized", "49.00")
            },
        )
        .await
        .unwrap();
        create(
            &conn,
            BandInput {
                compatibilities: Some(vec!["All sizes".into()]),
                ..input("Universal", "29.00")
            },
        )
        .await
        .unwrap();
        create(
            &conn,
            BandInput {
                compatibilities: Some(vec!["49mm".into()]),
                ..input("Ultra only", "79.00")
            },
        )
        .await
        .unwrap();

        let mut names: Vec<String> = compatible_with(&conn, "45mm")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Sized", "Universal"]);
    }

    #[tokio::test]
    async fn test_search_matches_color_and_skips_inactive() {
        let conn = test_db().await;
        let hit = create(
            &conn,
            BandInput {
                color: Some("Midnight Blue".into()),
                ..input("Ocean", "49.00")
            },
        )
        .await
        .unwrap();
        create(&conn, input("Desert", "49.00")).await.unwrap();

        let found = search(&conn, "blue").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, hit.id);

        delete(&conn, &hit.id).await.unwrap();
        assert!(search(&conn, "blue").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_writes_only_supplied_fields() {
        let conn = test_db().await;
        let band = create(
            &conn,
            BandInput {
                features: Some(vec!["Original".into()]),
                stock: Some(10),
                ..input("Editable", "49.00")
            },
        )
        .await
        .unwrap();

        let updated = update(
            &conn,
            &band.id,
            BandInput {
                price: Some("59.00".parse().unwrap()),
                features: Some(vec!["Replaced".into(), "Second".into()]),
                ..BandInput::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.price, "59.00".parse().unwrap());
        assert_eq!(updated.name, "Editable");
        assert_eq!(updated.stock, 10);
        assert_eq!(updated.features, vec!["Replaced", "Second"]);

        let err = update(&conn, "missing", BandInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Band not found");
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_idempotent() {
        let conn = test_db().await;
        let band = create(&conn, input("Gone", "49.00")).await.unwrap();

        delete(&conn, &band.id).await.unwrap();
        delete(&conn, &band.id).await.unwrap();

        let err = get(&conn, &band.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Band not found");

        // The row itself survives for admin views.
        let row = repository::find_any(&conn, &band.id).await.unwrap().unwrap();
        assert!(!row.active);
    }
}
