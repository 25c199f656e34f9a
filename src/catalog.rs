// CRUD and visual search over locally catalogued brand logos.
use crate::imaging::{LogoMatch, Rasterizer, find_similar_logos};
use crate::model::{CatalogError, LogoRecord, StorageError};
use crate::storage::LogoStore;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct BulkLogoEntry {
    pub brand_name: String,
    pub image_path: String,
}

#[derive(Debug, Default)]
pub struct BulkUploadReport {
    pub uploaded: usize,
    pub failed: Vec<String>,
}

pub struct LogoCatalog {
    store: Box<dyn LogoStore>,
    match_threshold: f64,
    // Tie-breaker for uploads landing on the same millisecond.
    upload_seq: AtomicU64,
}

impl LogoCatalog {
    pub fn new(store: Box<dyn LogoStore>, match_threshold: f64) -> Self {
        Self {
            store,
            match_threshold,
            upload_seq: AtomicU64::new(0),
        }
    }

    /// Reads an image file, encodes it as a data URL and stores it under a
    /// fresh id.
    pub fn upload(
        &self,
        brand_name: &str,
        brand_code: &str,
        image_path: &str,
    ) -> Result<LogoRecord, CatalogError> {
        let bytes = std::fs::read(image_path).map_err(StorageError::Io)?;
        let mime = match Path::new(image_path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            _ => "image/png",
        };

        let record = LogoRecord {
            id: format!(
                "{}-{}",
                Utc::now().timestamp_millis(),
                self.upload_seq.fetch_add(1, Ordering::Relaxed)
            ),
            brand_name: brand_name.to_string(),
            brand_code: brand_code.to_string(),
            image_data: format!("data:{mime};base64,{}", BASE64.encode(&bytes)),
            upload_date: Utc::now(),
        };
        self.store.put(&record)?;
        Ok(record)
    }

    /// Uploads a batch, continuing past per-item failures. Brand name
    /// doubles as the code, matching how bulk imports are prepared.
    pub fn bulk_upload(&self, entries: &[BulkLogoEntry]) -> BulkUploadReport {
        let mut report = BulkUploadReport::default();
        for entry in entries {
            match self.upload(&entry.brand_name, &entry.brand_name, &entry.image_path) {
                Ok(_) => report.uploaded += 1,
                Err(e) => {
                    warn!("bulk upload failed for {}: {e}", entry.brand_name);
                    report.failed.push(entry.brand_name.clone());
                }
            }
        }
        report
    }

    pub fn list(&self) -> Result<Vec<LogoRecord>, StorageError> {
        self.store.get_all()
    }

    pub fn list_for_brand(&self, brand_name: &str) -> Result<Vec<LogoRecord>, StorageError> {
        self.store.get_by_brand(brand_name)
    }

    pub fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.store.delete(id)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.delete_all()
    }

    /// Runs the query image against every catalogued logo and returns the
    /// candidates above the configured threshold, best first.
    pub async fn search_by_image(
        &self,
        rasterizer: &dyn Rasterizer,
        query_ref: &str,
    ) -> Result<Vec<LogoMatch>, CatalogError> {
        let records = self.store.get_all()?;
        let matches =
            find_similar_logos(rasterizer, query_ref, records, self.match_threshold).await?;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImageRasterizer;
    use crate::storage::SqliteLogoStore;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn catalog() -> LogoCatalog {
        LogoCatalog::new(Box::new(SqliteLogoStore::new_in_memory().unwrap()), 60.0)
    }

    fn write_png(name: &str, r: u8, g: u8, b: u8) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "brandscope-test-{}-{}.png",
            std::process::id(),
            name
        ));
        RgbImage::from_pixel(16, 16, Rgb([r, g, b]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn upload_assigns_unique_ids_and_data_urls() {
        let catalog = catalog();
        let path = write_png("upload", 10, 20, 30);

        let a = catalog
            .upload("Nike", "b001", path.to_str().unwrap())
            .unwrap();
        let b = catalog
            .upload("Nike", "b001", path.to_str().unwrap())
            .unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.image_data.starts_with("data:image/png;base64,"));
        assert_eq!(catalog.list().unwrap().len(), 2);
        assert_eq!(catalog.list_for_brand("Nike").unwrap().len(), 2);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn bulk_upload_reports_failures_without_aborting() {
        let catalog = catalog();
        let good = write_png("bulk", 200, 0, 0);

        let report = catalog.bulk_upload(&[
            BulkLogoEntry {
                brand_name: "Nike".to_string(),
                image_path: good.to_str().unwrap().to_string(),
            },
            BulkLogoEntry {
                brand_name: "Ghost".to_string(),
                image_path: "/nonexistent/logo.png".to_string(),
            },
        ]);

        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed, vec!["Ghost".to_string()]);
        assert_eq!(catalog.list().unwrap().len(), 1);

        std::fs::remove_file(good).ok();
    }

    #[test]
    fn delete_and_clear() {
        let catalog = catalog();
        let path = write_png("delete", 0, 0, 200);
        let record = catalog
            .upload("Nike", "b001", path.to_str().unwrap())
            .unwrap();

        catalog.delete(&record.id).unwrap();
        assert!(catalog.list().unwrap().is_empty());

        catalog.upload("Nike", "b001", path.to_str().unwrap()).unwrap();
        catalog.upload("Adidas", "b002", path.to_str().unwrap()).unwrap();
        catalog.clear().unwrap();
        assert!(catalog.list().unwrap().is_empty());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn visual_search_ranks_the_matching_logo_first() {
        let catalog = catalog();
        let navy = write_png("navy", 20, 30, 90);
        let cream = write_png("cream", 240, 235, 220);

        catalog.upload("Navy Brand", "b010", navy.to_str().unwrap()).unwrap();
        catalog.upload("Cream Brand", "b011", cream.to_str().unwrap()).unwrap();

        let rasterizer = ImageRasterizer::new();
        let matches = catalog
            .search_by_image(&rasterizer, navy.to_str().unwrap())
            .await
            .unwrap();

        assert!(!matches.is_empty());
        assert_eq!(matches[0].record.brand_name, "Navy Brand");
        assert!(matches[0].score >= 99.99);

        std::fs::remove_file(navy).ok();
        std::fs::remove_file(cream).ok();
    }
}
