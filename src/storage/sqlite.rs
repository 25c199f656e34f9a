use crate::model::{LogoRecord, StorageError};
use crate::storage::LogoStore;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

pub struct SqliteLogoStore {
    conn: Connection,
}

impl SqliteLogoStore {
    /// Opens the store, creating the schema and running column migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS logos (
                id TEXT PRIMARY KEY,
                brand_name TEXT NOT NULL,
                brand_code TEXT NOT NULL DEFAULT '',
                image_data TEXT NOT NULL,
                upload_date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_logos_brand_name ON logos (brand_name);
            ",
        )?;

        // Schema migrations for databases created before brand_code existed.
        Self::migrate_add_column_if_missing(&conn, "logos", "brand_code", "TEXT NOT NULL DEFAULT ''")?;

        Ok(Self { conn })
    }

    /// Checks for a column and adds it to the table when absent.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    fn map_record(row: &Row) -> Result<LogoRecord, rusqlite::Error> {
        let upload_date_str: String = row.get(4)?;
        let upload_date: DateTime<Utc> = upload_date_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(LogoRecord {
            id: row.get(0)?,
            brand_name: row.get(1)?,
            brand_code: row.get(2)?,
            image_data: row.get(3)?,
            upload_date,
        })
    }
}

impl LogoStore for SqliteLogoStore {
    /// Inserts or overwrites the record with the same id.
    fn put(&self, record: &LogoRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO logos (id, brand_name, brand_code, image_data, upload_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &record.id,
                &record.brand_name,
                &record.brand_code,
                &record.image_data,
                &record.upload_date.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<LogoRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, brand_name, brand_code, image_data, upload_date
             FROM logos ORDER BY upload_date DESC",
        )?;

        let rows = stmt.query_map([], |row| Self::map_record(row))?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }

    fn get_by_brand(&self, brand_name: &str) -> Result<Vec<LogoRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, brand_name, brand_code, image_data, upload_date
             FROM logos WHERE brand_name = ?1 ORDER BY upload_date DESC",
        )?;

        let rows = stmt.query_map(params![brand_name], |row| Self::map_record(row))?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM logos WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn delete_all(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM logos", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, brand: &str) -> LogoRecord {
        LogoRecord {
            id: id.to_string(),
            brand_name: brand.to_string(),
            brand_code: brand.to_lowercase(),
            image_data: "aGVsbG8=".to_string(),
            upload_date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = SqliteLogoStore::new_in_memory().unwrap();
        let logo = record("logo-1", "Nike");
        store.put(&logo).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], logo);
    }

    #[test]
    fn put_with_same_id_overwrites() {
        let store = SqliteLogoStore::new_in_memory().unwrap();
        store.put(&record("logo-1", "Nike")).unwrap();

        let mut updated = record("logo-1", "Nike");
        updated.image_data = "d29ybGQ=".to_string();
        store.put(&updated).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].image_data, "d29ybGQ=");
    }

    #[test]
    fn brand_lookup_is_non_unique() {
        let store = SqliteLogoStore::new_in_memory().unwrap();
        store.put(&record("logo-1", "Nike")).unwrap();
        store.put(&record("logo-2", "Nike")).unwrap();
        store.put(&record("logo-3", "Adidas")).unwrap();

        assert_eq!(store.get_by_brand("Nike").unwrap().len(), 2);
        assert_eq!(store.get_by_brand("Adidas").unwrap().len(), 1);
        assert!(store.get_by_brand("Puma").unwrap().is_empty());
    }

    #[test]
    fn delete_by_id_and_delete_all() {
        let store = SqliteLogoStore::new_in_memory().unwrap();
        store.put(&record("logo-1", "Nike")).unwrap();
        store.put(&record("logo-2", "Adidas")).unwrap();

        store.delete("logo-1").unwrap();
        assert_eq!(store.get_all().unwrap().len(), 1);

        store.delete_all().unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }
}
