use chrono::{Datelike, Utc};
use contracts::domain::{
    ComparisonSpec, SizeCompatibility, Watch, WatchComparison, WatchCompatibility, WatchInput,
};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use super::repository::{self, WatchPatch};
use crate::domain::band;
use crate::shared::error::ApiError;

/// Band suggestions shown per size on the compatibility panel.
const BANDS_PER_SIZE: u64 = 5;

/// 1 to 4 models fit on the comparison page.
const MAX_COMPARE: usize = 4;

// ============================================================================
// Reads
// ============================================================================

pub async fn list<C: ConnectionTrait>(conn: &C) -> Result<Vec<Watch>, ApiError> {
    repository::list_active(conn)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watches", e))
}

pub async fn get<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Watch, ApiError> {
    repository::find_active(conn, id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watch", e))?
        .ok_or_else(|| ApiError::not_found("Watch not found"))
}

pub async fn by_series<C: ConnectionTrait>(conn: &C, series: &str) -> Result<Vec<Watch>, ApiError> {
    repository::list_by_series(conn, series)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watches", e))
}

/// Band suggestions for every case size of the watch.
pub async fn compatibility<C: ConnectionTrait>(
    conn: &C,
    watch_id: &str,
) -> Result<WatchCompatibility, ApiError> {
    let watch = get(conn, watch_id).await?;

    let mut compatibility = Vec::with_capacity(watch.sizes.len());
    for size in &watch.sizes {
        let bands = band::repository::list_compatible(conn, size, Some(BANDS_PER_SIZE))
            .await
            .map_err(|e| ApiError::internal("Failed to fetch compatible bands", e))?;
        compatibility.push(SizeCompatibility {
            size: size.clone(),
            bands,
        });
    }

    Ok(WatchCompatibility {
        sizes: watch.sizes,
        compatibility,
    })
}

/// Side-by-side comparison for 1 to 4 comma-separated watch ids. Unknown
/// ids are skipped rather than failing the whole request.
pub async fn compare<C: ConnectionTrait>(conn: &C, ids: &str) -> Result<WatchComparison, ApiError> {
    let ids: Vec<String> = ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();

    if ids.is_empty() || ids.len() > MAX_COMPARE {
        return Err(ApiError::validation(
            "Please provide 1-4 watch IDs to compare",
        ));
    }

    let watches = repository::find_many(conn, &ids)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watches", e))?;

    Ok(WatchComparison {
        watches,
        specs: comparison_specs(),
    })
}

/// Rows of the comparison table, in display order.
fn comparison_specs() -> Vec<ComparisonSpec> {
    [
        ("Price", "price", "currency"),
        ("Release Year", "release_year", "number"),
        ("Sizes", "sizes", "list"),
        ("Colors", "colors", "list"),
        ("Features", "features", "list"),
    ]
    .into_iter()
    .map(|(name, key, format)| ComparisonSpec {
        name: name.to_string(),
        key: key.to_string(),
        format: format.to_string(),
    })
    .collect()
}

// ============================================================================
// Admin writes
// ============================================================================

pub async fn create<C: ConnectionTrait>(conn: &C, input: WatchInput) -> Result<Watch, ApiError> {
    let name = input.name.filter(|s| !s.trim().is_empty());
    let (name, price) = match (name, input.price) {
        (Some(n), Some(p)) => (n, p),
        _ => return Err(ApiError::validation("Name and price are required")),
    };

    let watch = Watch {
        id: Uuid::new_v4().to_string(),
        name,
        description: input.description,
        price,
        sizes: input.sizes.unwrap_or_default(),
        colors: input.colors.unwrap_or_default(),
        features: input.features.unwrap_or_default(),
        image_url: input.image_url,
        release_year: Some(input.release_year.unwrap_or_else(|| Utc::now().year())),
        active: input.active.unwrap_or(true),
        created_at: Utc::now().to_rfc3339(),
    };

    repository::insert(conn, &watch)
        .await
        .map_err(|e| ApiError::internal("Failed to create watch", e))?;

    Ok(watch)
}

/// Partial update. Deactivation goes through `active: false` here; watches
/// have no dedicated delete endpoint.
pub async fn update<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    input: WatchInput,
) -> Result<Watch, ApiError> {
    let patch = WatchPatch {
        name: input.name,
        description: input.description,
        price: input.price.map(|p| p.to_string()),
        sizes: input.sizes,
        colors: input.colors,
        features: input.features,
        image_url: input.image_url,
        release_year: input.release_year,
        active: input.active,
    };

    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let updated = repository::update_partial(conn, id, &patch)
        .await
        .map_err(|e| ApiError::internal("Failed to update watch", e))?;
    if !updated {
        return Err(ApiError::not_found("Watch not found"));
    }

    // Read back without the active filter so a deactivating update still
    // returns the stored row.
    repository::find_any(conn, id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch watch", e))?
        .ok_or_else(|| ApiError::not_found("Watch not found"))
}
