// Naive pixel-difference logo comparison. Both images are force-scaled to a
// fixed grid (aspect ratio is lost) and compared channel by channel, so the
// score reflects global color difference, not structure: two same-colored
// images with different content still score as near-identical. That
// limitation is inherited on purpose.
use crate::model::{ImagingError, LogoRecord};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::join_all;
use image::imageops::FilterType;
use std::path::Path;
use tracing::warn;

pub const GRID_WIDTH: u32 = 100;
pub const GRID_HEIGHT: u32 = 100;

/// RGB buffer of a rasterized image, always `GRID_WIDTH x GRID_HEIGHT`.
/// Alpha is discarded during rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    pixels: Vec<u8>,
}

impl PixelGrid {
    pub fn channels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Capability for turning an image reference (file path, base64 blob or
/// data URL) into a fixed-size pixel buffer.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, image_ref: &str) -> Result<PixelGrid, ImagingError>;
}

pub struct ImageRasterizer;

impl ImageRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn decode_ref(image_ref: &str) -> Result<Vec<u8>, ImagingError> {
        if let Some((_, payload)) = image_ref.split_once("base64,") {
            return BASE64
                .decode(payload.trim())
                .map_err(|e| ImagingError::Decode(e.to_string()));
        }
        if Path::new(image_ref).exists() {
            return Ok(std::fs::read(image_ref)?);
        }
        BASE64
            .decode(image_ref.trim())
            .map_err(|e| ImagingError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Rasterizer for ImageRasterizer {
    async fn rasterize(&self, image_ref: &str) -> Result<PixelGrid, ImagingError> {
        let bytes = Self::decode_ref(image_ref)?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| ImagingError::Decode(e.to_string()))?;
        let scaled = decoded.resize_exact(GRID_WIDTH, GRID_HEIGHT, FilterType::Triangle);
        Ok(PixelGrid {
            pixels: scaled.to_rgb8().into_raw(),
        })
    }
}

/// 0-100 similarity from summed absolute RGB differences; 100 is a perfect
/// pixel-for-pixel match at grid resolution.
pub fn similarity_score(a: &PixelGrid, b: &PixelGrid) -> f64 {
    let diff: u64 = a
        .channels()
        .iter()
        .zip(b.channels().iter())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();
    let pixels = (GRID_WIDTH * GRID_HEIGHT) as f64;
    100.0 - diff as f64 / (pixels * 3.0 * 255.0) * 100.0
}

#[derive(Debug, Clone)]
pub struct LogoMatch {
    pub record: LogoRecord,
    pub score: f64,
}

/// Scores every catalogued logo against the query image, keeps candidates
/// above the threshold and sorts them best-first. Comparisons are
/// independent and joined before sorting; records whose stored image no
/// longer decodes are skipped with a warning.
pub async fn find_similar_logos(
    rasterizer: &dyn Rasterizer,
    query_ref: &str,
    records: Vec<LogoRecord>,
    threshold: f64,
) -> Result<Vec<LogoMatch>, ImagingError> {
    let query = rasterizer.rasterize(query_ref).await?;

    let comparisons = records.into_iter().map(|record| {
        let query = &query;
        async move {
            match rasterizer.rasterize(&record.image_data).await {
                Ok(grid) => Some(LogoMatch {
                    score: similarity_score(query, &grid),
                    record,
                }),
                Err(e) => {
                    warn!("skipping logo {}: {e}", record.id);
                    None
                }
            }
        }
    });

    let mut matches: Vec<LogoMatch> = join_all(comparisons)
        .await
        .into_iter()
        .flatten()
        .filter(|m| m.score > threshold)
        .collect();
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn data_url(r: u8, g: u8, b: u8) -> String {
        let img = RgbImage::from_pixel(8, 8, Rgb([r, g, b]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(buf.into_inner()))
    }

    fn record(id: &str, image_data: String) -> LogoRecord {
        LogoRecord {
            id: id.to_string(),
            brand_name: id.to_string(),
            brand_code: id.to_string(),
            image_data,
            upload_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn identical_image_scores_one_hundred() {
        let rasterizer = ImageRasterizer::new();
        let url = data_url(37, 114, 200);
        let a = rasterizer.rasterize(&url).await.unwrap();
        let b = rasterizer.rasterize(&url).await.unwrap();
        assert!(similarity_score(&a, &b) >= 99.99);
    }

    #[tokio::test]
    async fn black_versus_white_scores_zero() {
        let rasterizer = ImageRasterizer::new();
        let black = rasterizer.rasterize(&data_url(0, 0, 0)).await.unwrap();
        let white = rasterizer
            .rasterize(&data_url(255, 255, 255))
            .await
            .unwrap();
        let score = similarity_score(&black, &white);
        assert!(score.abs() < 1e-9);
    }

    #[tokio::test]
    async fn grid_is_always_fixed_size() {
        let rasterizer = ImageRasterizer::new();
        let grid = rasterizer.rasterize(&data_url(10, 20, 30)).await.unwrap();
        assert_eq!(
            grid.channels().len(),
            (GRID_WIDTH * GRID_HEIGHT * 3) as usize
        );
    }

    #[tokio::test]
    async fn candidate_search_filters_and_sorts_descending() {
        let records = vec![
            record("far", data_url(250, 250, 250)),
            record("close", data_url(60, 60, 60)),
            record("exact", data_url(50, 50, 50)),
            record("broken", "%%not-base64%%".to_string()),
        ];

        let matches =
            find_similar_logos(&ImageRasterizer::new(), &data_url(50, 50, 50), records, 60.0)
                .await
                .unwrap();
        // `far` is below threshold, `broken` is skipped.
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].record.id, "exact");
        assert_eq!(matches[1].record.id, "close");
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn garbage_reference_is_a_decode_error() {
        let rasterizer = ImageRasterizer::new();
        let result = rasterizer.rasterize("definitely not an image").await;
        assert!(matches!(result, Err(ImagingError::Decode(_))));
    }
}
