use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::band::Band;

// ============================================================================
// Aggregate
// ============================================================================

/// Watch model. `sizes`/`colors`/`features` are genuine string lists; their
/// JSON-column encoding is a storage concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watch {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub image_url: Option<String>,
    pub release_year: Option<i32>,
    pub active: bool,
    pub created_at: String,
}

// ============================================================================
// DTO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WatchInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub release_year: Option<i32>,
    pub active: Option<bool>,
}

/// Per-size band suggestions for a watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchCompatibility {
    pub sizes: Vec<String>,
    pub compatibility: Vec<SizeCompatibility>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeCompatibility {
    pub size: String,
    pub bands: Vec<Band>,
}

/// Side-by-side comparison payload: the watches plus the attribute rows the
/// comparison table is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchComparison {
    pub watches: Vec<Watch>,
    pub specs: Vec<ComparisonSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSpec {
    pub name: String,
    pub key: String,
    pub format: String,
}
