use crate::model::{PricePoint, Product, ProductStats, StorageError};
use crate::validate::validate_price;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, Row, params};

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database at the given path, creating the schema on first use.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::bootstrap(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS price_history (
                id TEXT PRIMARY KEY,
                product_id TEXT NOT NULL,
                price REAL NOT NULL,
                date TEXT NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_price_history_product
                ON price_history (product_id, date);

            CREATE TABLE IF NOT EXISTS product_stats (
                product_id TEXT PRIMARY KEY,
                avg_price REAL NOT NULL,
                std_dev REAL NOT NULL,
                last_updated TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self { conn })
    }

    /// Saves (inserts or updates) a tracked product.
    pub fn save_product(&self, product: &Product) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO products (id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &product.id,
                &product.name,
                &product.description,
                &product.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_product(&self, id: &str) -> Result<Option<Product>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at FROM products WHERE id = ?1",
        )?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::map_product(row)?))
        } else {
            Ok(None)
        }
    }

    /// All tracked products, oldest first.
    pub fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at FROM products
             ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map([], Self::map_product)?;
        let mut products = Vec::new();
        for product in rows {
            products.push(product?);
        }

        Ok(products)
    }

    /// Removes a product together with its price history and cached stats.
    pub fn delete_product(&self, id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM price_history WHERE product_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM product_stats WHERE product_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Inserts one observed price. Non-finite and negative prices are
    /// rejected here so the store only ever holds analyzable data.
    pub fn add_price_point(&self, point: &PricePoint) -> Result<(), StorageError> {
        validate_price(point.price)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO price_history (id, product_id, price, date, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &point.id,
                &point.product_id,
                &point.price,
                &point.date.to_string(),
                &point.note,
                &point.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Price history for one product, by date ascending. Same-date points
    /// come back in insertion order so repeated analysis is deterministic.
    pub fn get_history(&self, product_id: &str) -> Result<Vec<PricePoint>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_id, price, date, note, created_at
             FROM price_history WHERE product_id = ?1
             ORDER BY date ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![product_id], Self::map_price_point)?;
        let mut points = Vec::new();
        for point in rows {
            points.push(point?);
        }

        Ok(points)
    }

    pub fn delete_price_point(&self, id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM price_history WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Upserts the cached summary row for a product.
    pub fn update_stats(&self, stats: &ProductStats) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO product_stats (product_id, avg_price, std_dev, last_updated)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &stats.product_id,
                &stats.avg_price,
                &stats.std_dev,
                &stats.last_updated.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_stats(&self, product_id: &str) -> Result<Option<ProductStats>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT avg_price, std_dev, last_updated FROM product_stats WHERE product_id = ?1",
        )?;

        let mut rows = stmt.query(params![product_id])?;
        if let Some(row) = rows.next()? {
            let avg_price: f64 = row.get(0)?;
            let std_dev: f64 = row.get(1)?;
            let last_updated_str: String = row.get(2)?;
            let last_updated: DateTime<Utc> = last_updated_str.parse()?;

            Ok(Some(ProductStats {
                product_id: product_id.to_string(),
                avg_price,
                std_dev,
                last_updated,
            }))
        } else {
            Ok(None)
        }
    }

    fn map_product(row: &Row) -> Result<Product, rusqlite::Error> {
        let created_at_str: String = row.get(3)?;
        let created_at = created_at_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at,
        })
    }

    fn map_price_point(row: &Row) -> Result<PricePoint, rusqlite::Error> {
        let date_str: String = row.get(3)?;
        let date = date_str.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let created_at_str: String = row.get(5)?;
        let created_at = created_at_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(PricePoint {
            id: row.get(0)?,
            product_id: row.get(1)?,
            price: row.get(2)?,
            date,
            note: row.get(4)?,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn product_round_trip() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let product = Product::new("Espresso machine", "kitchen");
        storage.save_product(&product).unwrap();

        let loaded = storage.get_product(&product.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Espresso machine");
        assert_eq!(loaded.description, "kitchen");
        assert_eq!(storage.list_products().unwrap().len(), 1);
    }

    #[test]
    fn missing_product_is_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.get_product("nope").unwrap().is_none());
    }

    #[test]
    fn history_is_keyed_by_product_and_sorted_by_date() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let product = Product::new("Monitor", "");
        storage.save_product(&product).unwrap();

        // Inserted out of order, plus one point for another product.
        storage
            .add_price_point(&PricePoint::new(&product.id, 210.0, date(3), ""))
            .unwrap();
        storage
            .add_price_point(&PricePoint::new(&product.id, 200.0, date(1), ""))
            .unwrap();
        storage
            .add_price_point(&PricePoint::new("other", 999.0, date(2), ""))
            .unwrap();

        let history = storage.get_history(&product.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].price, 200.0);
        assert_eq!(history[1].price, 210.0);
    }

    #[test]
    fn same_date_points_keep_insertion_order() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .add_price_point(&PricePoint::new("p", 10.0, date(1), "first"))
            .unwrap();
        storage
            .add_price_point(&PricePoint::new("p", 11.0, date(1), "second"))
            .unwrap();

        let history = storage.get_history("p").unwrap();
        assert_eq!(history[0].note, "first");
        assert_eq!(history[1].note, "second");
    }

    #[test]
    fn invalid_prices_never_reach_the_store() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let bad = PricePoint::new("p", -5.0, date(1), "");
        let err = storage.add_price_point(&bad).unwrap_err();
        assert!(matches!(err, StorageError::RejectedInput(_)));
        assert!(storage.get_history("p").unwrap().is_empty());
    }

    #[test]
    fn deleting_a_product_cascades() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let product = Product::new("Keyboard", "");
        storage.save_product(&product).unwrap();
        storage
            .add_price_point(&PricePoint::new(&product.id, 45.0, date(1), ""))
            .unwrap();
        storage
            .update_stats(&ProductStats {
                product_id: product.id.clone(),
                avg_price: 45.0,
                std_dev: 0.0,
                last_updated: Utc::now(),
            })
            .unwrap();

        storage.delete_product(&product.id).unwrap();
        assert!(storage.get_product(&product.id).unwrap().is_none());
        assert!(storage.get_history(&product.id).unwrap().is_empty());
        assert!(storage.get_stats(&product.id).unwrap().is_none());
    }

    #[test]
    fn deleting_a_single_point_leaves_the_rest() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let keep = PricePoint::new("p", 10.0, date(1), "");
        let removed = PricePoint::new("p", 12.0, date(2), "");
        storage.add_price_point(&keep).unwrap();
        storage.add_price_point(&removed).unwrap();

        storage.delete_price_point(&removed.id).unwrap();
        let history = storage.get_history("p").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, keep.id);
    }

    #[test]
    fn stats_upsert_overwrites() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut stats = ProductStats {
            product_id: "p".into(),
            avg_price: 10.0,
            std_dev: 1.0,
            last_updated: Utc::now(),
        };
        storage.update_stats(&stats).unwrap();
        stats.avg_price = 12.5;
        storage.update_stats(&stats).unwrap();

        let loaded = storage.get_stats("p").unwrap().unwrap();
        assert!((loaded.avg_price - 12.5).abs() < 1e-9);
        assert!((loaded.std_dev - 1.0).abs() < 1e-9);
    }
}
