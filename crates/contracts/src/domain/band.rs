use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Aggregate
// ============================================================================

/// Catalog band with its ordered feature and compatibility lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub color: Option<String>,
    pub material: Option<String>,
    pub stock: i32,
    pub featured: bool,
    pub liquid_glass: bool,
    pub active: bool,
    pub image_url: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub compatibilities: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================================================
// DTO
// ============================================================================

/// Admin create/update payload. On update only supplied fields are written;
/// supplying `features`/`compatibilities` replaces the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BandInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub liquid_glass: Option<bool>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
    pub features: Option<Vec<String>>,
    pub compatibilities: Option<Vec<String>>,
}
