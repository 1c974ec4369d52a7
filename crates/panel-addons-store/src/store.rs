use std::path::Path;
use std::sync::Mutex;

use panel_addons::InstalledAddon;

use crate::schema;

/// Errors specific to registry persistence.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),
}

/// SQLite-backed registry of installed addons.
///
/// The registry tracks which addons are installed and whether they are
/// enabled. It is intentionally tolerant of disagreement with the
/// filesystem: removal of an absent row succeeds, and reconciliation is
/// the pipeline's job at reload time.
pub struct AddonRegistry {
    conn: Mutex<rusqlite::Connection>,
}

impl AddonRegistry {
    /// Open a registry backed by a file on disk.
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| RegistryError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory registry (for testing).
    pub fn open_in_memory() -> Result<Self, RegistryError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| RegistryError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: rusqlite::Connection) -> Result<Self, RegistryError> {
        let mut registry = Self {
            conn: Mutex::new(conn),
        };
        registry.migrate()?;
        Ok(registry)
    }

    fn migrate(&mut self) -> Result<(), RegistryError> {
        let conn = self.conn.get_mut().unwrap();
        schema::migrations()
            .to_latest(conn)
            .map_err(|e| RegistryError::Migration(e.to_string()))?;
        Ok(())
    }

    /// All registry records, ordered by slug.
    pub fn list(&self) -> Result<Vec<InstalledAddon>, RegistryError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT slug, name, author, note, enabled
                 FROM addons
                 ORDER BY slug",
            )
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        let addons = stmt
            .query_map([], Self::row_to_addon)
            .map_err(|e| RegistryError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(addons)
    }

    /// Look up one record by slug.
    pub fn get(&self, slug: &str) -> Result<Option<InstalledAddon>, RegistryError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT slug, name, author, note, enabled
             FROM addons
             WHERE slug = ?1",
            [slug],
            Self::row_to_addon,
        );

        match result {
            Ok(addon) => Ok(Some(addon)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RegistryError::Database(e.to_string())),
        }
    }

    /// Insert or replace a record. Used when promotion succeeds.
    pub fn upsert(&self, addon: &InstalledAddon) -> Result<(), RegistryError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR REPLACE INTO addons (slug, name, author, note, enabled, installed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                addon.slug,
                addon.name,
                addon.author,
                addon.note,
                addon.enabled,
                now_epoch_secs(),
            ],
        )
        .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(())
    }

    /// Flip the enabled flag. Returns false when no record exists.
    pub fn set_enabled(&self, slug: &str, enabled: bool) -> Result<bool, RegistryError> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE addons SET enabled = ?2 WHERE slug = ?1",
                rusqlite::params![slug, enabled],
            )
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(changed > 0)
    }

    /// Delete a record. Absence is tolerated; returns whether a row
    /// was actually removed.
    pub fn remove(&self, slug: &str) -> Result<bool, RegistryError> {
        let conn = self.conn.lock().unwrap();

        let removed = conn
            .execute("DELETE FROM addons WHERE slug = ?1", [slug])
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(removed > 0)
    }

    fn row_to_addon(row: &rusqlite::Row) -> rusqlite::Result<InstalledAddon> {
        Ok(InstalledAddon {
            slug: row.get(0)?,
            name: row.get(1)?,
            author: row.get(2)?,
            note: row.get(3)?,
            enabled: row.get(4)?,
        })
    }
}

fn now_epoch_secs() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now.to_string()
}
