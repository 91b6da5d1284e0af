use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, params};

use crate::api::models::Product;
use crate::error::{Result, ShopError};

fn db_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "example", "diyshop")?;
    Some(proj.data_dir().join("cache.sqlite"))
}

// Caching the catalogue so product lists render before the network answers.
pub struct ProductCache {
    conn: Connection,
}

impl ProductCache {
    pub fn open_default() -> Result<Self> {
        let path = db_path().ok_or_else(|| ShopError::Config("no data directory".into()))?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                raw_json TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn upsert_products(&mut self, products: &[Product]) -> Result<()> {
        let now = Utc::now();
        let tx = self.conn.transaction()?;
        for p in products {
            let raw = serde_json::to_string(p)?;
            tx.execute(
                r#"
                INSERT INTO products (id, name, category, updated_at, raw_json)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    name=excluded.name,
                    category=excluded.category,
                    updated_at=excluded.updated_at,
                    raw_json=excluded.raw_json
                "#,
                params![p.id as i64, p.name, p.category, now, raw],
            )?;
        }
        tx.commit()?;
        log::debug!("cached {} products", products.len());
        Ok(())
    }

    /// Cached products ordered by name, optionally limited to one category (case-insensitive).
    pub fn products(&self, category: Option<&str>, limit: Option<usize>) -> Result<Vec<Product>> {
        let lim = limit.unwrap_or(500) as i64;
        let mut stmt = self.conn.prepare(
            "SELECT raw_json FROM products
             WHERE ?1 IS NULL OR lower(category) = lower(?1)
             ORDER BY name COLLATE NOCASE ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![category, lim], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(serde_json::from_str(&raw?)?);
        }
        Ok(out)
    }

    pub fn last_refresh(&self) -> Result<Option<DateTime<Utc>>> {
        let ts: Option<DateTime<Utc>> = self
            .conn
            .query_row("SELECT max(updated_at) FROM products", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(ts)
    }

    pub fn is_fresh(&self, max_age: Duration) -> Result<bool> {
        let Some(last) = self.last_refresh()? else {
            return Ok(false);
        };
        let age = Utc::now().signed_duration_since(last);
        Ok(age.to_std().map_or(true, |age| age <= max_age))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, name: &str, category: &str) -> Product {
        Product {
            id,
            name: name.into(),
            description: format!("{name} description"),
            category: category.into(),
            price: 10.0 * id as f64,
            stock: 3,
            image_url: None,
        }
    }

    #[test]
    fn empty_cache_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProductCache::open(&dir.path().join("cache.sqlite")).unwrap();
        assert!(cache.products(None, None).unwrap().is_empty());
        assert!(cache.last_refresh().unwrap().is_none());
        assert!(!cache.is_fresh(Duration::from_secs(300)).unwrap());
    }

    #[test]
    fn upsert_replaces_and_orders_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ProductCache::open(&dir.path().join("data").join("cache.sqlite")).unwrap();
        cache
            .upsert_products(&[product(1, "saw", "Tools"), product(2, "Brush", "Paint")])
            .unwrap();
        cache.upsert_products(&[product(1, "Hand Saw", "Tools")]).unwrap();

        let all = cache.products(None, None).unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Brush", "Hand Saw"]);
        assert_eq!(all[1].price, 10.0);
        assert!(cache.is_fresh(Duration::from_secs(300)).unwrap());
    }

    #[test]
    fn category_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ProductCache::open(&dir.path().join("cache.sqlite")).unwrap();
        cache
            .upsert_products(&[
                product(1, "Roller", "Paint"),
                product(2, "Brush", "paint"),
                product(3, "Hammer", "Tools"),
            ])
            .unwrap();
        let paint = cache.products(Some("PAINT"), None).unwrap();
        assert_eq!(paint.len(), 2);
        assert_eq!(cache.products(None, Some(1)).unwrap().len(), 1);
    }
}
