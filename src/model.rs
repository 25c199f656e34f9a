// Core structs shared across the client, analyzer and storage layers.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One sold-item sample as delivered by the analytics backend.
/// Read-only once deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    #[serde(rename = "soldDays", default)]
    pub sold_days: f64,
    #[serde(rename = "productName", default)]
    pub product_name: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "listedDate", default)]
    pub listed_date: Option<DateTime<Utc>>,
    #[serde(rename = "soldDate", default)]
    pub sold_date: Option<DateTime<Utc>>,
}

impl PricePoint {
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub code: String,
    #[serde(rename = "brandName_ja")]
    pub brand_name_ja: String,
    #[serde(rename = "brandName_en", default)]
    pub brand_name_en: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceQuartiles {
    #[serde(default)]
    pub q1: f64,
    #[serde(default)]
    pub median: f64,
    #[serde(default)]
    pub q3: f64,
}

/// Per-category aggregate computed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryData {
    pub category: String,
    #[serde(rename = "soldCount", default)]
    pub sold_count: u64,
    #[serde(rename = "listingCount", default)]
    pub listing_count: u64,
    #[serde(rename = "minPrice", default)]
    pub min_price: f64,
    #[serde(rename = "maxPrice", default)]
    pub max_price: f64,
    #[serde(rename = "avgPrice", default)]
    pub avg_price: f64,
    #[serde(rename = "avgSoldDays", default)]
    pub avg_sold_days: f64,
    #[serde(rename = "priceQuartiles", default)]
    pub price_quartiles: PriceQuartiles,
    #[serde(rename = "speedPriceData", default)]
    pub speed_price_data: Vec<PricePoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    #[serde(default)]
    pub count: u64,
    #[serde(rename = "averageRevenue", default)]
    pub average_revenue: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(rename = "percentageChange", default)]
    pub percentage_change: Option<f64>,
    #[serde(rename = "avgPrice", default)]
    pub avg_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: u32,
    #[serde(rename = "averagePrice", default)]
    pub average_price: f64,
    #[serde(rename = "itemCount", default)]
    pub item_count: u64,
    #[serde(default)]
    pub categories: Vec<CategoryStats>,
    #[serde(rename = "soldTimes", default)]
    pub sold_times: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRangeStats {
    #[serde(default)]
    pub count: u64,
    #[serde(rename = "avgDays", default)]
    pub avg_days: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageImpact {
    #[serde(rename = "avgPrice", default)]
    pub avg_price: f64,
    #[serde(rename = "avgDays", default)]
    pub avg_days: f64,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageAnalysis {
    #[serde(rename = "withImage", default)]
    pub with_image: ImageImpact,
    #[serde(rename = "withoutImage", default)]
    pub without_image: ImageImpact,
}

/// Full per-brand payload. Only `categories` is guaranteed present; the
/// fallback report carries a single zeroed all-categories entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandAnalytics {
    #[serde(default)]
    pub categories: Vec<CategoryData>,
    #[serde(rename = "monthlyStats", default)]
    pub monthly_stats: Vec<MonthlyStats>,
    #[serde(rename = "priceRangeAnalysis", default)]
    pub price_range_analysis: HashMap<String, PriceRangeStats>,
    #[serde(rename = "imageAnalysis", default)]
    pub image_analysis: ImageAnalysis,
    #[serde(rename = "totalDataCount", default)]
    pub total_data_count: u64,
}

impl BrandAnalytics {
    /// Zeroed report returned when the backend is unreachable or reports an
    /// error. Matches what the backend sends for a brand with no data.
    pub fn default_report() -> Self {
        BrandAnalytics {
            categories: vec![CategoryData {
                category: "all".to_string(),
                sold_count: 0,
                listing_count: 0,
                min_price: 0.0,
                max_price: 0.0,
                avg_price: 0.0,
                avg_sold_days: 0.0,
                price_quartiles: PriceQuartiles::default(),
                speed_price_data: Vec::new(),
            }],
            monthly_stats: Vec::new(),
            price_range_analysis: HashMap::new(),
            image_analysis: ImageAnalysis::default(),
            total_data_count: 0,
        }
    }
}

/// One band of the price distribution. `upper` is `f64::INFINITY` for the
/// open-ended top band.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBand {
    pub label: &'static str,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone)]
pub struct PriceDistribution {
    pub outliers: Vec<f64>,
    pub bands: Vec<PriceBand>,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone)]
pub struct ReliabilityScore {
    pub score: u8,
    pub confidence: ConfidenceLevel,
    pub warnings: Vec<String>,
}

/// Products clustered by fuzzy name similarity. Always has at least two
/// members; the grouper drops singletons.
#[derive(Debug, Clone)]
pub struct SimilarProductGroup {
    pub base_name: String,
    pub members: Vec<PricePoint>,
    pub avg_price: f64,
}

/// Locally catalogued brand logo. `image_data` holds the base64-encoded
/// image bytes, with or without a data-URL header.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoRecord {
    pub id: String,
    pub brand_name: String,
    pub brand_code: String,
    pub image_data: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("malformed body: {0}")]
    MalformedBody(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
}
