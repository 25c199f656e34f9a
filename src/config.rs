use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_url: String,
    #[serde(default = "default_brand_ttl")]
    pub brand_cache_ttl_secs: u64,
    #[serde(default = "default_analytics_ttl")]
    pub analytics_cache_ttl_secs: u64,
    /// Offset applied when bucketing sale timestamps for display. The
    /// backend stores UTC; the default target zone is UTC+9.
    #[serde(default = "default_display_offset")]
    pub display_utc_offset_hours: i32,
    #[serde(default = "default_logo_db_path")]
    pub logo_db_path: String,
    #[serde(default = "default_logo_threshold")]
    pub logo_match_threshold: f64,
}

fn default_brand_ttl() -> u64 {
    24 * 60 * 60
}

fn default_analytics_ttl() -> u64 {
    30 * 60
}

fn default_display_offset() -> i32 {
    9
}

fn default_logo_db_path() -> String {
    "logos.db".to_string()
}

fn default_logo_threshold() -> f64 {
    60.0
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
