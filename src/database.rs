use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Item, ItemKind, ItemPatch, ItemPayload, Mood};
use crate::tags::{normalize_tag, normalize_tags};
use crate::utils::{Clock, SystemClock, parse_date};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Item not found: {0}")]
    NotFound(i64),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

const ITEM_COLUMNS: &str = "id, kind, date, title, content, mood, path, preferred_app, \
     checked, deleted, deleted_at, created_at, updated_at";

pub struct Database {
    conn: Connection,
    clock: Box<dyn Clock>,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        Self::with_clock(path, Box::new(SystemClock))
    }

    /// Create a database with an explicit clock (tests pin it)
    pub fn with_clock(path: &str, clock: Box<dyn Clock>) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;

        let db = Database { conn, clock };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        // AUTOINCREMENT keeps rowids monotonic, so ids are never reused
        // even after trash is purged
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS items (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                kind            TEXT NOT NULL,
                date            TEXT NOT NULL,
                title           TEXT,
                content         TEXT,
                mood            TEXT,
                path            TEXT,
                preferred_app   TEXT,
                checked         INTEGER DEFAULT 0,
                deleted         INTEGER DEFAULT 0,
                deleted_at      TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS item_tags (
                item_id         INTEGER NOT NULL,
                tag             TEXT NOT NULL,
                UNIQUE(item_id, tag)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_items_date ON items(date)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_items_deleted ON items(deleted)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag)",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Today according to the injected clock
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    /// Create an item, attached to `date` or to today when `date` is None.
    /// The item row and its tag rows are written in one transaction.
    pub fn create(
        &self,
        date: Option<&str>,
        payload: ItemPayload,
        tags: &[String],
    ) -> Result<Item, DatabaseError> {
        let date = match date {
            Some(d) => {
                parse_date(d).map_err(|_| {
                    DatabaseError::ValidationError(format!(
                        "invalid date '{}', expected YYYY-MM-DD",
                        d
                    ))
                })?;
                d.to_string()
            }
            None => self.clock.today_string(),
        };

        validate_payload(&payload)?;
        let tags = normalize_tags(tags);

        let now = self.clock.timestamp();
        let mut item = Item::new(date, payload, now);
        let (title, content, mood, path, preferred_app, checked) = payload_columns(&item.payload);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO items (kind, date, title, content, mood, path, preferred_app, \
             checked, deleted, deleted_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, ?9, ?10)",
            rusqlite::params![
                item.kind().as_str(),
                item.date,
                title,
                content,
                mood,
                path,
                preferred_app,
                checked,
                item.created_at,
                item.updated_at
            ],
        )?;
        let id = tx.last_insert_rowid();
        for tag in &tags {
            tx.execute(
                "INSERT OR IGNORE INTO item_tags (item_id, tag) VALUES (?1, ?2)",
                rusqlite::params![id, tag],
            )?;
        }
        tx.commit()?;

        item.id = Some(id);
        item.tags = tags;
        Ok(item)
    }

    /// Get a single item by ID. Soft-deleted items are returned; only a
    /// purge makes an id unreachable.
    pub fn get(&self, id: i64) -> Result<Item, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS))?;

        let item = stmt
            .query_row(rusqlite::params![id], row_to_item)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound(id),
                other => DatabaseError::from(other),
            })?;
        self.with_tags(item)
    }

    /// Items in the inclusive date range, ordered by (date, created_at).
    /// `kinds` of None means all kinds.
    pub fn query(
        &self,
        start: &str,
        end: &str,
        kinds: Option<&[ItemKind]>,
        include_deleted: bool,
    ) -> Result<Vec<Item>, DatabaseError> {
        for d in [start, end] {
            parse_date(d).map_err(|_| {
                DatabaseError::ValidationError(format!("invalid date '{}', expected YYYY-MM-DD", d))
            })?;
        }

        let mut sql = format!(
            "SELECT {} FROM items WHERE date >= ?1 AND date <= ?2",
            ITEM_COLUMNS
        );
        if !include_deleted {
            sql.push_str(" AND deleted = 0");
        }
        if let Some(kinds) = kinds {
            if kinds.is_empty() {
                return Ok(Vec::new());
            }
            // kind names come from a closed enum, safe to splice
            let list = kinds
                .iter()
                .map(|k| format!("'{}'", k.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" AND kind IN ({})", list));
        }
        sql.push_str(" ORDER BY date ASC, created_at ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(rusqlite::params![start, end], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        items.into_iter().map(|i| self.with_tags(i)).collect()
    }

    /// All non-deleted items attached to one date
    pub fn items_on(&self, date: &str) -> Result<Vec<Item>, DatabaseError> {
        self.query(date, date, None, false)
    }

    /// Apply a partial update to an item. The patch carries no date or
    /// kind; fields that do not apply to the item's kind are rejected.
    /// Fails with NotFound when the item is absent or soft-deleted.
    pub fn update(&self, id: i64, patch: ItemPatch) -> Result<Item, DatabaseError> {
        let item = self.get(id)?;
        if item.deleted {
            return Err(DatabaseError::NotFound(id));
        }
        if patch.is_empty() {
            return Ok(item);
        }

        let payload = patched_payload(item.payload, &patch)?;
        let (title, content, mood, path, preferred_app, checked) = payload_columns(&payload);
        let now = self.clock.timestamp();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE items SET title = ?1, content = ?2, mood = ?3, path = ?4, \
             preferred_app = ?5, checked = ?6, updated_at = ?7 WHERE id = ?8",
            rusqlite::params![title, content, mood, path, preferred_app, checked, now, id],
        )?;

        // Tag replacement goes through attach/detach so the index and the
        // item can never be observed out of sync
        if let Some(ref new_tags) = patch.tags {
            let new_tags = normalize_tags(new_tags);
            let current = self.tags_for_item(id)?;
            for tag in current.iter().filter(|t| !new_tags.contains(*t)) {
                self.detach_tag(id, tag)?;
            }
            for tag in new_tags.iter().filter(|t| !current.contains(*t)) {
                self.attach_tag(id, tag)?;
            }
        }
        tx.commit()?;

        self.get(id)
    }

    /// Flip a todo's checked flag
    pub fn toggle_todo(&self, id: i64) -> Result<Item, DatabaseError> {
        let item = self.get(id)?;
        match item.payload {
            ItemPayload::Todo { checked, .. } => self.update(
                id,
                ItemPatch {
                    checked: Some(!checked),
                    ..Default::default()
                },
            ),
            _ => Err(DatabaseError::ValidationError(format!(
                "item {} is not a todo",
                id
            ))),
        }
    }

    /// Move an item to the trash. No-op success when already deleted.
    /// The envelope timestamps are left alone so a later restore brings
    /// the item back exactly as it was.
    pub fn soft_delete(&self, id: i64) -> Result<(), DatabaseError> {
        let item = self.get(id)?;
        if item.deleted {
            return Ok(());
        }
        self.conn.execute(
            "UPDATE items SET deleted = 1, deleted_at = ?1 WHERE id = ?2",
            rusqlite::params![self.clock.timestamp(), id],
        )?;
        Ok(())
    }

    /// Bring an item back from the trash. No-op success when not deleted.
    pub fn restore(&self, id: i64) -> Result<(), DatabaseError> {
        let item = self.get(id)?;
        if !item.deleted {
            return Ok(());
        }
        self.conn.execute(
            "UPDATE items SET deleted = 0, deleted_at = NULL WHERE id = ?1",
            rusqlite::params![id],
        )?;
        Ok(())
    }

    /// Everything in the trash, most recently deleted first
    pub fn list_trash(&self) -> Result<Vec<Item>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items WHERE deleted = 1 ORDER BY deleted_at DESC, id DESC",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map([], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        items.into_iter().map(|i| self.with_tags(i)).collect()
    }

    /// Irreversibly remove every trashed item and its tag rows.
    /// Returns the number of items purged.
    pub fn purge_all_trash(&self) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM item_tags WHERE item_id IN (SELECT id FROM items WHERE deleted = 1)",
            [],
        )?;
        let count = tx.execute("DELETE FROM items WHERE deleted = 1", [])?;
        tx.commit()?;
        Ok(count)
    }

    /// Trash-manager alias for purge_all_trash; confirmation is the
    /// caller's responsibility
    pub fn empty_trash(&self) -> Result<usize, DatabaseError> {
        self.purge_all_trash()
    }

    /// Associate a tag with an item. Idempotent; the tag is normalized
    /// first and must be non-empty afterwards.
    pub fn attach_tag(&self, item_id: i64, tag: &str) -> Result<(), DatabaseError> {
        let tag = normalize_tag(tag);
        if tag.is_empty() {
            return Err(DatabaseError::ValidationError(
                "tag is empty after normalization".to_string(),
            ));
        }
        self.ensure_exists(item_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO item_tags (item_id, tag) VALUES (?1, ?2)",
            rusqlite::params![item_id, tag],
        )?;
        Ok(())
    }

    /// Remove a tag from an item. Removing an absent tag is a no-op.
    pub fn detach_tag(&self, item_id: i64, tag: &str) -> Result<(), DatabaseError> {
        let tag = normalize_tag(tag);
        self.conn.execute(
            "DELETE FROM item_tags WHERE item_id = ?1 AND tag = ?2",
            rusqlite::params![item_id, tag],
        )?;
        Ok(())
    }

    /// Items carrying a tag, ordered by (date, created_at)
    pub fn items_with_tag(
        &self,
        tag: &str,
        include_deleted: bool,
    ) -> Result<Vec<Item>, DatabaseError> {
        let tag = normalize_tag(tag);
        let mut sql = String::from(
            "SELECT i.id, i.kind, i.date, i.title, i.content, i.mood, i.path, \
             i.preferred_app, i.checked, i.deleted, i.deleted_at, i.created_at, i.updated_at \
             FROM items i JOIN item_tags t ON t.item_id = i.id WHERE t.tag = ?1",
        );
        if !include_deleted {
            sql.push_str(" AND i.deleted = 0");
        }
        sql.push_str(" ORDER BY i.date ASC, i.created_at ASC, i.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(rusqlite::params![tag], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        items.into_iter().map(|i| self.with_tags(i)).collect()
    }

    /// Tags attached to one item, sorted
    pub fn tags_for_item(&self, item_id: i64) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM item_tags WHERE item_id = ?1 ORDER BY tag ASC")?;
        let tags = stmt
            .query_map(rusqlite::params![item_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(tags)
    }

    /// Distinct tags over all non-deleted items
    pub fn all_tags(&self) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT t.tag FROM item_tags t \
             JOIN items i ON i.id = t.item_id WHERE i.deleted = 0 ORDER BY t.tag ASC",
        )?;
        let tags = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(tags)
    }

    fn ensure_exists(&self, id: i64) -> Result<(), DatabaseError> {
        let found: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM items WHERE id = ?1",
                rusqlite::params![id],
                |row| row.get(0),
            )?;
        if found == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    }

    fn with_tags(&self, mut item: Item) -> Result<Item, DatabaseError> {
        if let Some(id) = item.id {
            item.tags = self.tags_for_item(id)?;
        }
        Ok(item)
    }
}

/// Map an item row (ITEM_COLUMNS order) to an Item. Tags are loaded
/// separately from item_tags.
fn row_to_item(row: &rusqlite::Row) -> Result<Item, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let kind = ItemKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown item kind: {}", kind_str).into(),
        )
    })?;

    let payload = match kind {
        ItemKind::FileLink => ItemPayload::FileLink {
            path: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            preferred_app: row.get(7)?,
        },
        ItemKind::Diary => {
            let mood = match row.get::<_, Option<String>>(5)? {
                Some(m) => Mood::parse(&m).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        format!("unknown mood: {}", m).into(),
                    )
                })?,
                None => Mood::Neutral,
            };
            ItemPayload::Diary {
                title: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                mood,
                content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            }
        }
        ItemKind::Note => ItemPayload::Note {
            content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        },
        ItemKind::Todo => ItemPayload::Todo {
            content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            checked: row.get::<_, i64>(8)? != 0,
        },
    };

    Ok(Item {
        id: Some(row.get(0)?),
        date: row.get(2)?,
        tags: Vec::new(),
        deleted: row.get::<_, i64>(9)? != 0,
        deleted_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        payload,
    })
}

/// Flatten a payload into the nullable kind-specific columns
fn payload_columns(
    payload: &ItemPayload,
) -> (
    Option<&str>,
    Option<&str>,
    Option<&str>,
    Option<&str>,
    Option<&str>,
    i64,
) {
    match payload {
        ItemPayload::FileLink {
            path,
            preferred_app,
        } => (None, None, None, Some(path.as_str()), preferred_app.as_deref(), 0),
        ItemPayload::Diary {
            title,
            mood,
            content,
        } => (
            Some(title.as_str()),
            Some(content.as_str()),
            Some(mood.as_str()),
            None,
            None,
            0,
        ),
        ItemPayload::Note { content } => (None, Some(content.as_str()), None, None, None, 0),
        ItemPayload::Todo { content, checked } => (
            None,
            Some(content.as_str()),
            None,
            None,
            None,
            if *checked { 1 } else { 0 },
        ),
    }
}

fn validate_payload(payload: &ItemPayload) -> Result<(), DatabaseError> {
    match payload {
        ItemPayload::FileLink { path, .. } => {
            let p = Path::new(path);
            if !p.is_absolute() {
                return Err(DatabaseError::ValidationError(format!(
                    "file path must be absolute: {}",
                    path
                )));
            }
            // Existence is checked once, at creation time
            if !p.exists() {
                return Err(DatabaseError::ValidationError(format!(
                    "file does not exist: {}",
                    path
                )));
            }
            Ok(())
        }
        ItemPayload::Diary { title, .. } if title.trim().is_empty() => Err(
            DatabaseError::ValidationError("diary title must not be empty".to_string()),
        ),
        ItemPayload::Note { content } if content.trim().is_empty() => Err(
            DatabaseError::ValidationError("note content must not be empty".to_string()),
        ),
        ItemPayload::Todo { content, .. } if content.trim().is_empty() => Err(
            DatabaseError::ValidationError("todo content must not be empty".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Apply a patch to a payload, rejecting fields that do not belong to the
/// item's kind
fn patched_payload(payload: ItemPayload, patch: &ItemPatch) -> Result<ItemPayload, DatabaseError> {
    let kind = payload.kind();
    let reject = |field: &str| {
        Err(DatabaseError::ValidationError(format!(
            "field '{}' does not apply to {} items",
            field,
            kind.as_str()
        )))
    };

    match payload {
        ItemPayload::FileLink {
            path,
            preferred_app,
        } => {
            if patch.title.is_some() {
                return reject("title");
            }
            if patch.content.is_some() {
                return reject("content");
            }
            if patch.mood.is_some() {
                return reject("mood");
            }
            if patch.checked.is_some() {
                return reject("checked");
            }
            Ok(ItemPayload::FileLink {
                path,
                preferred_app: patch.preferred_app.clone().unwrap_or(preferred_app),
            })
        }
        ItemPayload::Diary {
            title,
            mood,
            content,
        } => {
            if patch.checked.is_some() {
                return reject("checked");
            }
            if patch.preferred_app.is_some() {
                return reject("preferred_app");
            }
            Ok(ItemPayload::Diary {
                title: patch.title.clone().unwrap_or(title),
                mood: patch.mood.unwrap_or(mood),
                content: patch.content.clone().unwrap_or(content),
            })
        }
        ItemPayload::Note { content } => {
            if patch.title.is_some() {
                return reject("title");
            }
            if patch.mood.is_some() {
                return reject("mood");
            }
            if patch.checked.is_some() {
                return reject("checked");
            }
            if patch.preferred_app.is_some() {
                return reject("preferred_app");
            }
            Ok(ItemPayload::Note {
                content: patch.content.clone().unwrap_or(content),
            })
        }
        ItemPayload::Todo { content, checked } => {
            if patch.title.is_some() {
                return reject("title");
            }
            if patch.mood.is_some() {
                return reject("mood");
            }
            if patch.preferred_app.is_some() {
                return reject("preferred_app");
            }
            Ok(ItemPayload::Todo {
                content: patch.content.clone().unwrap_or(content),
                checked: patch.checked.unwrap_or(checked),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::FixedClock;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("app.db");
        let db = Database::with_clock(
            path.to_str().expect("utf-8 temp path"),
            Box::new(FixedClock::new("2024-03-01")),
        )
        .expect("open db");
        (dir, db)
    }

    fn note(content: &str) -> ItemPayload {
        ItemPayload::Note {
            content: content.to_string(),
        }
    }

    fn todo(content: &str) -> ItemPayload {
        ItemPayload::Todo {
            content: content.to_string(),
            checked: false,
        }
    }

    fn diary(title: &str, mood: Mood) -> ItemPayload {
        ItemPayload::Diary {
            title: title.to_string(),
            mood,
            content: "dear diary".to_string(),
        }
    }

    #[test]
    fn create_defaults_to_clock_today() {
        let (_dir, db) = test_db();
        let item = db.create(None, note("hello"), &[]).unwrap();
        assert_eq!(item.date, "2024-03-01");
        assert!(item.id.is_some());
    }

    #[test]
    fn create_rejects_malformed_date() {
        let (_dir, db) = test_db();
        let err = db.create(Some("01-03-2024"), note("hello"), &[]).unwrap_err();
        assert!(matches!(err, DatabaseError::ValidationError(_)));
    }

    #[test]
    fn create_rejects_empty_content() {
        let (_dir, db) = test_db();
        assert!(matches!(
            db.create(None, note("   "), &[]),
            Err(DatabaseError::ValidationError(_))
        ));
        assert!(matches!(
            db.create(None, diary("", Mood::Happy), &[]),
            Err(DatabaseError::ValidationError(_))
        ));
    }

    #[test]
    fn file_link_path_must_be_absolute_and_exist() {
        let (dir, db) = test_db();

        let missing = dir.path().join("nope.pdf");
        let err = db
            .create(
                None,
                ItemPayload::FileLink {
                    path: missing.to_string_lossy().to_string(),
                    preferred_app: None,
                },
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ValidationError(_)));

        let err = db
            .create(
                None,
                ItemPayload::FileLink {
                    path: "relative/file.pdf".to_string(),
                    preferred_app: None,
                },
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ValidationError(_)));

        let real = dir.path().join("real.pdf");
        std::fs::write(&real, b"x").unwrap();
        let item = db
            .create(
                None,
                ItemPayload::FileLink {
                    path: real.to_string_lossy().to_string(),
                    preferred_app: Some("zathura".to_string()),
                },
                &[],
            )
            .unwrap();
        assert_eq!(item.kind(), ItemKind::FileLink);
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(db.get(999), Err(DatabaseError::NotFound(999))));
    }

    #[test]
    fn query_orders_by_date_and_filters_kind() {
        let (_dir, db) = test_db();
        db.create(Some("2024-03-05"), note("later"), &[]).unwrap();
        db.create(Some("2024-03-01"), todo("earlier"), &[]).unwrap();
        db.create(Some("2024-03-03"), note("middle"), &[]).unwrap();

        let all = db.query("2024-03-01", "2024-03-31", None, false).unwrap();
        let dates: Vec<&str> = all.iter().map(|i| i.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-03", "2024-03-05"]);

        let notes = db
            .query("2024-03-01", "2024-03-31", Some(&[ItemKind::Note]), false)
            .unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|i| i.kind() == ItemKind::Note));

        let outside = db.query("2024-04-01", "2024-04-30", None, false).unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn update_patches_matching_fields() {
        let (_dir, db) = test_db();
        let item = db.create(None, diary("Monday", Mood::Stormy), &[]).unwrap();
        let id = item.id.unwrap();

        let updated = db
            .update(
                id,
                ItemPatch {
                    mood: Some(Mood::Happy),
                    content: Some("turned out fine".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        match updated.payload {
            ItemPayload::Diary { mood, content, .. } => {
                assert_eq!(mood, Mood::Happy);
                assert_eq!(content, "turned out fine");
            }
            other => panic!("expected diary payload, got {:?}", other),
        }
    }

    #[test]
    fn update_rejects_fields_of_other_kinds() {
        let (_dir, db) = test_db();
        let item = db.create(None, note("plain"), &[]).unwrap();
        let err = db
            .update(
                item.id.unwrap(),
                ItemPatch {
                    mood: Some(Mood::Happy),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ValidationError(_)));
    }

    #[test]
    fn update_on_deleted_item_is_not_found() {
        let (_dir, db) = test_db();
        let item = db.create(None, note("gone soon"), &[]).unwrap();
        let id = item.id.unwrap();
        db.soft_delete(id).unwrap();
        let err = db
            .update(
                id,
                ItemPatch {
                    content: Some("too late".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn soft_delete_then_restore_round_trips() {
        let (_dir, db) = test_db();
        let created = db
            .create(Some("2024-03-02"), diary("Tuesday", Mood::Happy), &["Work".to_string()])
            .unwrap();
        let id = created.id.unwrap();
        let before = db.get(id).unwrap();

        db.soft_delete(id).unwrap();
        assert!(db.items_on("2024-03-02").unwrap().is_empty());

        db.restore(id).unwrap();
        let after = db.get(id).unwrap();
        assert_eq!(before, after);
        assert_eq!(db.items_on("2024-03-02").unwrap().len(), 1);
    }

    #[test]
    fn soft_delete_and_restore_are_idempotent() {
        let (_dir, db) = test_db();
        let id = db.create(None, note("n"), &[]).unwrap().id.unwrap();

        db.restore(id).unwrap(); // not deleted: no-op success
        db.soft_delete(id).unwrap();
        db.soft_delete(id).unwrap(); // already deleted: no-op success
        assert!(db.get(id).unwrap().deleted);

        assert!(matches!(
            db.soft_delete(999),
            Err(DatabaseError::NotFound(999))
        ));
    }

    #[test]
    fn trash_lists_newest_deletion_first_and_purge_empties_it() {
        let (_dir, db) = test_db();
        let milk = db.create(None, todo("buy milk"), &[]).unwrap().id.unwrap();
        db.soft_delete(milk).unwrap();

        let excluded = db.items_on("2024-03-01").unwrap();
        assert!(excluded.is_empty());

        let trash = db.list_trash().unwrap();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].summary(), "buy milk");

        assert_eq!(db.empty_trash().unwrap(), 1);
        assert!(db.list_trash().unwrap().is_empty());
        assert!(matches!(db.get(milk), Err(DatabaseError::NotFound(_))));
    }

    #[test]
    fn purge_drops_tag_index_rows() {
        let (_dir, db) = test_db();
        let id = db
            .create(None, note("tagged"), &["work".to_string()])
            .unwrap()
            .id
            .unwrap();
        db.soft_delete(id).unwrap();
        assert_eq!(db.items_with_tag("work", true).unwrap().len(), 1);

        db.purge_all_trash().unwrap();
        assert!(db.items_with_tag("work", true).unwrap().is_empty());
        assert!(db.tags_for_item(id).unwrap().is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_purge() {
        let (_dir, db) = test_db();
        let first = db.create(None, note("one"), &[]).unwrap().id.unwrap();
        db.soft_delete(first).unwrap();
        db.purge_all_trash().unwrap();
        let second = db.create(None, note("two"), &[]).unwrap().id.unwrap();
        assert!(second > first);
    }

    #[test]
    fn attach_detach_are_inverse_under_membership() {
        let (_dir, db) = test_db();
        let id = db.create(None, note("n"), &[]).unwrap().id.unwrap();

        db.attach_tag(id, "focus").unwrap();
        assert_eq!(
            db.items_with_tag("focus", false)
                .unwrap()
                .iter()
                .filter_map(|i| i.id)
                .collect::<Vec<_>>(),
            vec![id]
        );

        db.detach_tag(id, "focus").unwrap();
        assert!(db.items_with_tag("focus", false).unwrap().is_empty());
    }

    #[test]
    fn tag_normalization_collapses_case_duplicates() {
        let (_dir, db) = test_db();
        let id = db.create(None, note("n"), &[]).unwrap().id.unwrap();
        db.attach_tag(id, "Work").unwrap();
        db.attach_tag(id, "work").unwrap();
        assert_eq!(db.tags_for_item(id).unwrap(), vec!["work"]);
    }

    #[test]
    fn attach_rejects_empty_tag() {
        let (_dir, db) = test_db();
        let id = db.create(None, note("n"), &[]).unwrap().id.unwrap();
        assert!(matches!(
            db.attach_tag(id, "   "),
            Err(DatabaseError::ValidationError(_))
        ));
    }

    #[test]
    fn items_with_tag_skips_deleted_unless_asked() {
        let (_dir, db) = test_db();
        let id = db
            .create(None, note("n"), &["work".to_string()])
            .unwrap()
            .id
            .unwrap();
        db.soft_delete(id).unwrap();
        assert!(db.items_with_tag("work", false).unwrap().is_empty());
        assert_eq!(db.items_with_tag("work", true).unwrap().len(), 1);
        assert!(db.all_tags().unwrap().is_empty());
    }

    #[test]
    fn toggle_todo_flips_checked() {
        let (_dir, db) = test_db();
        let id = db.create(None, todo("water plants"), &[]).unwrap().id.unwrap();
        let toggled = db.toggle_todo(id).unwrap();
        assert!(matches!(
            toggled.payload,
            ItemPayload::Todo { checked: true, .. }
        ));
        let back = db.toggle_todo(id).unwrap();
        assert!(matches!(
            back.payload,
            ItemPayload::Todo { checked: false, .. }
        ));

        let note_id = db.create(None, note("not a todo"), &[]).unwrap().id.unwrap();
        assert!(matches!(
            db.toggle_todo(note_id),
            Err(DatabaseError::ValidationError(_))
        ));
    }
}
