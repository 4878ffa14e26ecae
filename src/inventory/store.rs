use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use super::types::{InventoryDraft, InventoryItem, InventoryPatch};

#[cfg(feature = "inventory-sqlite")]
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("failed to serialize item payload: {0}")]
    Serialize(String),
}

pub trait InventoryStore: Send + Sync {
    fn add(&self, draft: InventoryDraft) -> Result<InventoryItem, StoreError>;
    fn list(&self) -> Result<Vec<InventoryItem>, StoreError>;
    fn get(&self, id: &str) -> Result<Option<InventoryItem>, StoreError>;
    fn update(&self, id: &str, patch: &InventoryPatch) -> Result<InventoryItem, StoreError>;
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Default)]
pub struct InMemoryInventoryStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    seq: u64,
    items: Vec<InventoryItem>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(seq: &mut u64) -> String {
        *seq += 1;
        format!("itm-{}-{}", Utc::now().timestamp_millis(), *seq)
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn add(&self, draft: InventoryDraft) -> Result<InventoryItem, StoreError> {
        let mut guard = self.inner.lock().expect("poisoned");
        let id = Self::next_id(&mut guard.seq);
        let item = draft.into_item(id, now_rfc3339());
        guard.items.push(item.clone());
        Ok(item)
    }

    fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        Ok(self.inner.lock().expect("poisoned").items.clone())
    }

    fn get(&self, id: &str) -> Result<Option<InventoryItem>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("poisoned")
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned())
    }

    fn update(&self, id: &str, patch: &InventoryPatch) -> Result<InventoryItem, StoreError> {
        let mut guard = self.inner.lock().expect("poisoned");
        let item = guard
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(item);
        Ok(item.clone())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut guard = self.inner.lock().expect("poisoned");
        let before = guard.items.len();
        guard.items.retain(|item| item.id != id);
        Ok(guard.items.len() != before)
    }
}

// -----------------------------
// SQLite-backed InventoryStore
// -----------------------------

/// Raw row before the JSON columns are parsed back into their types.
#[cfg(feature = "inventory-sqlite")]
struct ItemRow {
    item: InventoryItem,
    tags_json: String,
    box_json: String,
    metadata_json: Option<String>,
}

#[cfg(feature = "inventory-sqlite")]
pub struct SqliteInventoryStore {
    db_path: PathBuf,
}

#[cfg(feature = "inventory-sqlite")]
impl SqliteInventoryStore {
    pub fn new(db_path: PathBuf) -> Result<Self, StoreError> {
        let store = Self { db_path };
        store.with_connection(|_| Ok(()))?;
        Ok(store)
    }

    fn with_connection<T>(
        &self,
        action: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = rusqlite::Connection::open(&self.db_path)
            .map_err(|err| StoreError::Database(err.to_string()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS inventory_items (
                id TEXT PRIMARY KEY,
                image_url TEXT NOT NULL,
                label TEXT NOT NULL,
                category TEXT,
                tags_json TEXT NOT NULL DEFAULT '[]',
                date_added TEXT NOT NULL,
                source_image_url TEXT,
                notes TEXT,
                original_box_json TEXT NOT NULL,
                metadata_json TEXT
            )",
            [],
        )
        .map_err(|err| StoreError::Database(err.to_string()))?;
        action(&conn).map_err(|err| StoreError::Database(err.to_string()))
    }

    fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
        Ok(ItemRow {
            item: InventoryItem {
                id: row.get(0)?,
                image_url: row.get(1)?,
                label: row.get(2)?,
                category: row.get(3)?,
                tags: Vec::new(),
                date_added: row.get(5)?,
                source_image_url: row.get(6)?,
                notes: row.get(7)?,
                original_box: crate::geometry::NormalizedBox {
                    x: 0.0,
                    y: 0.0,
                    width: 0.0,
                    height: 0.0,
                    label: String::new(),
                },
                metadata: None,
            },
            tags_json: row.get(4)?,
            box_json: row.get(8)?,
            metadata_json: row.get(9)?,
        })
    }

    fn hydrate(row: ItemRow) -> Result<InventoryItem, StoreError> {
        let ItemRow {
            mut item,
            tags_json,
            box_json,
            metadata_json,
        } = row;
        item.tags = serde_json::from_str(&tags_json)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        item.original_box = serde_json::from_str(&box_json)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        item.metadata = match metadata_json {
            Some(json) => Some(
                serde_json::from_str(&json)
                    .map_err(|err| StoreError::Serialize(err.to_string()))?,
            ),
            None => None,
        };
        Ok(item)
    }

    fn json_columns(
        item: &InventoryItem,
    ) -> Result<(String, String, Option<String>), StoreError> {
        let tags_json = serde_json::to_string(&item.tags)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        let box_json = serde_json::to_string(&item.original_box)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        let metadata_json = match item.metadata.as_ref() {
            Some(metadata) => Some(
                serde_json::to_string(metadata)
                    .map_err(|err| StoreError::Serialize(err.to_string()))?,
            ),
            None => None,
        };
        Ok((tags_json, box_json, metadata_json))
    }
}

#[cfg(feature = "inventory-sqlite")]
impl InventoryStore for SqliteInventoryStore {
    fn add(&self, draft: InventoryDraft) -> Result<InventoryItem, StoreError> {
        // Use SQLite to generate a random 128-bit id.
        let id: String = self.with_connection(|conn| {
            conn.query_row("SELECT lower(hex(randomblob(16)))", [], |row| row.get(0))
        })?;
        let item = draft.into_item(id, now_rfc3339());
        let (tags_json, box_json, metadata_json) = Self::json_columns(&item)?;

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO inventory_items
                 (id, image_url, label, category, tags_json, date_added,
                  source_image_url, notes, original_box_json, metadata_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    item.id,
                    item.image_url,
                    item.label,
                    item.category,
                    tags_json,
                    item.date_added,
                    item.source_image_url,
                    item.notes,
                    box_json,
                    metadata_json,
                ],
            )
        })?;
        Ok(item)
    }

    fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, image_url, label, category, tags_json, date_added,
                        source_image_url, notes, original_box_json, metadata_json
                 FROM inventory_items ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], Self::row_to_item)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;
        rows.into_iter().map(Self::hydrate).collect()
    }

    fn get(&self, id: &str) -> Result<Option<InventoryItem>, StoreError> {
        use rusqlite::OptionalExtension;
        let row = self.with_connection(|conn| {
            conn.query_row(
                "SELECT id, image_url, label, category, tags_json, date_added,
                        source_image_url, notes, original_box_json, metadata_json
                 FROM inventory_items WHERE id = ?1",
                [id],
                Self::row_to_item,
            )
            .optional()
        })?;
        row.map(Self::hydrate).transpose()
    }

    fn update(&self, id: &str, patch: &InventoryPatch) -> Result<InventoryItem, StoreError> {
        let mut item = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(&mut item);
        let (tags_json, box_json, metadata_json) = Self::json_columns(&item)?;

        self.with_connection(|conn| {
            conn.execute(
                "UPDATE inventory_items
                 SET image_url = ?2, label = ?3, category = ?4, tags_json = ?5,
                     source_image_url = ?6, notes = ?7, original_box_json = ?8,
                     metadata_json = ?9
                 WHERE id = ?1",
                rusqlite::params![
                    item.id,
                    item.image_url,
                    item.label,
                    item.category,
                    tags_json,
                    item.source_image_url,
                    item.notes,
                    box_json,
                    metadata_json,
                ],
            )
        })?;
        Ok(item)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let affected = self.with_connection(|conn| {
            conn.execute("DELETE FROM inventory_items WHERE id = ?1", [id])
        })?;
        Ok(affected > 0)
    }
}
