use crate::api::transport::Transport;
use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::model::{ApiError, Brand, BrandAnalytics, MonthlyStats};
use chrono::Duration;
use tracing::{debug, warn};

const BRANDS_CACHE_KEY: &str = "brands";
const ANALYTICS_CACHE_PREFIX: &str = "analytics_";

/// Outcome of a backend query. Distinguishes a live response from a cache
/// hit and, unlike plain defaulting, keeps the failure reason visible so
/// callers can tell "no data" from "fetch failed".
#[derive(Debug)]
pub enum Fetched<T> {
    Fresh(T),
    Cached(T),
    Unavailable { reason: String },
}

impl<T> Fetched<T> {
    pub fn data(self) -> Option<T> {
        match self {
            Fetched::Fresh(v) | Fetched::Cached(v) => Some(v),
            Fetched::Unavailable { .. } => None,
        }
    }

    pub fn data_or(self, fallback: T) -> T {
        self.data().unwrap_or(fallback)
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Fetched::Cached(_))
    }
}

/// Read-only client for the aggregated resale-analytics backend. One
/// attempt per query, no retries; every failure collapses into
/// `Fetched::Unavailable`.
pub struct AnalyticsClient {
    transport: Box<dyn Transport>,
    cache: TtlCache,
    base_url: String,
    brand_ttl: Duration,
    analytics_ttl: Duration,
}

impl AnalyticsClient {
    pub fn new(transport: Box<dyn Transport>, cache: TtlCache, config: &AppConfig) -> Self {
        Self {
            transport,
            cache,
            base_url: config.api_url.clone(),
            brand_ttl: Duration::seconds(config.brand_cache_ttl_secs as i64),
            analytics_ttl: Duration::seconds(config.analytics_cache_ttl_secs as i64),
        }
    }

    /// Full brand directory. Cached for the brand TTL (24 h by default).
    pub async fn get_all_brands(&mut self) -> Fetched<Vec<Brand>> {
        if let Some(cached) = self.cache.get(BRANDS_CACHE_KEY) {
            match serde_json::from_value::<Vec<Brand>>(cached) {
                Ok(brands) => return Fetched::Cached(brands),
                Err(e) => {
                    warn!("dropping unreadable brand cache: {e}");
                    self.cache.remove(BRANDS_CACHE_KEY);
                }
            }
        }

        let raw = match self
            .transport
            .get_text(&self.base_url, &[("action", "search"), ("query", "")])
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("brand list fetch failed: {e}");
                return Fetched::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        let data = match decode_envelope(&raw) {
            Ok(data) => data,
            Err(e) => {
                warn!("brand list body unreadable: {e}");
                return Fetched::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        match serde_json::from_value::<Vec<Brand>>(data.clone()) {
            Ok(brands) => {
                self.cache.put(BRANDS_CACHE_KEY, data, self.brand_ttl);
                debug!("brand cache refreshed: {} entries", brands.len());
                Fetched::Fresh(brands)
            }
            Err(e) => Fetched::Unavailable {
                reason: format!("unexpected brand payload: {e}"),
            },
        }
    }

    /// Case-insensitive substring search over the (cache-first) brand
    /// directory, matching Japanese name, English name and code. An empty
    /// query is a legitimate empty result, not a failure.
    pub async fn search_brands(&mut self, query: &str) -> Fetched<Vec<Brand>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Fetched::Fresh(Vec::new());
        }

        let filter = |brands: Vec<Brand>| -> Vec<Brand> {
            brands
                .into_iter()
                .filter(|b| {
                    b.brand_name_ja.to_lowercase().contains(&needle)
                        || b.brand_name_en
                            .as_deref()
                            .is_some_and(|en| en.to_lowercase().contains(&needle))
                        || b.code.to_lowercase().contains(&needle)
                })
                .collect()
        };

        match self.get_all_brands().await {
            Fetched::Fresh(brands) => Fetched::Fresh(filter(brands)),
            Fetched::Cached(brands) => Fetched::Cached(filter(brands)),
            Fetched::Unavailable { reason } => Fetched::Unavailable { reason },
        }
    }

    /// Per-brand analytics, cached 30 min by default. A backend body that
    /// carries an `error` field counts as unavailable, same as a transport
    /// failure; callers fall back to `BrandAnalytics::default_report()`.
    pub async fn get_brand_analytics(&mut self, brand_code: &str) -> Fetched<BrandAnalytics> {
        let cache_key = format!("{ANALYTICS_CACHE_PREFIX}{brand_code}");

        if let Some(cached) = self.cache.get(&cache_key) {
            match serde_json::from_value::<BrandAnalytics>(cached) {
                Ok(analytics) => return Fetched::Cached(analytics),
                Err(e) => {
                    warn!("dropping unreadable analytics cache for {brand_code}: {e}");
                    self.cache.remove(&cache_key);
                }
            }
        }

        let raw = match self
            .transport
            .get_text(
                &self.base_url,
                &[("action", "analytics"), ("brandName", brand_code)],
            )
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("analytics fetch failed for {brand_code}: {e}");
                return Fetched::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        let data = match decode_envelope(&raw) {
            Ok(data) => data,
            Err(e) => {
                return Fetched::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        if let Some(err) = data.get("error") {
            return Fetched::Unavailable {
                reason: format!("backend error for {brand_code}: {err}"),
            };
        }

        match serde_json::from_value::<BrandAnalytics>(data.clone()) {
            Ok(analytics) => {
                self.cache.put(&cache_key, data, self.analytics_ttl);
                Fetched::Fresh(analytics)
            }
            Err(e) => Fetched::Unavailable {
                reason: format!("unexpected analytics payload: {e}"),
            },
        }
    }

    /// Cross-brand monthly time series. Served uncached; the backend
    /// aggregates this on its side.
    pub async fn get_monthly_analytics(&mut self) -> Fetched<Vec<MonthlyStats>> {
        let raw = match self
            .transport
            .get_text(&self.base_url, &[("action", "monthlyAnalytics")])
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("monthly analytics fetch failed: {e}");
                return Fetched::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        let data = match decode_envelope(&raw) {
            Ok(data) => data,
            Err(e) => {
                return Fetched::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        // The backend has shipped both a bare array and an object wrapping
        // it under `monthlyStats`.
        let stats_value = if data.is_array() {
            data
        } else {
            data.get("monthlyStats").cloned().unwrap_or(data)
        };

        match serde_json::from_value::<Vec<MonthlyStats>>(stats_value) {
            Ok(stats) => Fetched::Fresh(stats),
            Err(e) => Fetched::Unavailable {
                reason: format!("unexpected monthly payload: {e}"),
            },
        }
    }

    pub fn invalidate_brand_analytics(&mut self, brand_code: &str) {
        self.cache
            .remove(&format!("{ANALYTICS_CACHE_PREFIX}{brand_code}"));
    }
}

/// The backend prefixes its JSON with non-JSON noise; everything before the
/// first `{` must be discarded before parsing. The payload proper lives
/// under a `data` key.
fn decode_envelope(raw: &str) -> Result<serde_json::Value, ApiError> {
    let start = raw
        .find('{')
        .ok_or_else(|| ApiError::MalformedBody("no JSON object in body".to_string()))?;
    let value: serde_json::Value = serde_json::from_str(&raw[start..])
        .map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    value
        .get("data")
        .cloned()
        .ok_or_else(|| ApiError::MalformedBody("envelope missing `data`".to_string()))
}
