// Local persistence for the logo catalog.

pub mod sqlite;

pub use sqlite::SqliteLogoStore;

use crate::model::{LogoRecord, StorageError};

/// Capability interface over the embedded logo store. Keyed by `id` with a
/// secondary non-unique lookup by brand name; `put` overwrites in place.
pub trait LogoStore: Send {
    fn put(&self, record: &LogoRecord) -> Result<(), StorageError>;
    fn get_all(&self) -> Result<Vec<LogoRecord>, StorageError>;
    fn get_by_brand(&self, brand_name: &str) -> Result<Vec<LogoRecord>, StorageError>;
    fn delete(&self, id: &str) -> Result<(), StorageError>;
    fn delete_all(&self) -> Result<(), StorageError>;
}
