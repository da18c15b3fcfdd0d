use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::models::FavoriteRecord;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS favourites (
                    id INTEGER PRIMARY KEY,
                    image_url TEXT NOT NULL DEFAULT '',
                    title TEXT NOT NULL DEFAULT '',
                    ready_in_minutes INTEGER NOT NULL DEFAULT 0,
                    favourited_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    fn favourite_from_row(row: &rusqlite::Row) -> rusqlite::Result<FavoriteRecord> {
        Ok(FavoriteRecord {
            id: row.get("id")?,
            image_url: row.get("image_url")?,
            title: row.get("title")?,
            ready_in_minutes: row.get("ready_in_minutes")?,
            favourited_at: row.get("favourited_at")?,
        })
    }

    /// Insert or replace the record with the same id.
    pub fn insert_favourite(&self, record: &FavoriteRecord) -> Result<FavoriteRecord> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO favourites (id, image_url, title, ready_in_minutes, favourited_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.image_url,
                    record.title,
                    record.ready_in_minutes,
                    now,
                ],
            )
            .with_context(|| format!("Failed to save favourite {}", record.id))?;
        self.get_favourite(record.id)?
            .with_context(|| format!("Favourite {} missing after insert", record.id))
    }

    /// Returns whether a row was removed. Deleting an absent id is not an error.
    pub fn delete_favourite(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM favourites WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to delete favourite {id}"))?;
        Ok(n > 0)
    }

    pub fn get_favourite(&self, id: i64) -> Result<Option<FavoriteRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM favourites WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], Self::favourite_from_row)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    pub fn is_favourite(&self, id: i64) -> Result<bool> {
        Ok(self.get_favourite(id)?.is_some())
    }

    /// All favourites, oldest first. A replaced record moves to the end.
    pub fn list_favourites(&self) -> Result<Vec<FavoriteRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM favourites ORDER BY rowid")?;
        let rows = stmt
            .query_map([], Self::favourite_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_favourite_ids(&self) -> Result<HashSet<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM favourites")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }
}
