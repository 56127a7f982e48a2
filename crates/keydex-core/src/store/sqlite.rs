//! SQLite catalog store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::error::StoreError;
use super::models::{dir_prefix, DirectoryEntry, FileRecord, KeywordMatch, KeywordRecord};
use super::CatalogStore;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

const FILE_COLUMNS: &str =
    "f.id, f.path, f.name, f.extension, f.created_at, f.modified_at, f.size_bytes, f.content_hash";

/// Catalog database handle.
///
/// The connection is guarded by a mutex so one handle can be shared by every
/// file pipeline of a run.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a catalog at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Database(format!("{}: {e}", parent.display())))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_file(row: &rusqlite::Row) -> Result<FileRecord, rusqlite::Error> {
        let created: String = row.get(4)?;
        let modified: String = row.get(5)?;
        let size: i64 = row.get(6)?;

        Ok(FileRecord {
            id: Some(row.get(0)?),
            path: row.get(1)?,
            name: row.get(2)?,
            extension: row.get(3)?,
            created_at: parse_timestamp(&created, 4)?,
            modified_at: parse_timestamp(&modified, 5)?,
            size_bytes: size.max(0) as u64,
            content_hash: row.get(7)?,
        })
    }

    fn row_to_directory(row: &rusqlite::Row) -> Result<DirectoryEntry, rusqlite::Error> {
        Ok(DirectoryEntry {
            id: Some(row.get(0)?),
            location: row.get(1)?,
            is_whitelisted: row.get(2)?,
        })
    }

    fn query_directory(
        conn: &Connection,
        location: &str,
    ) -> Result<Option<DirectoryEntry>, StoreError> {
        conn.query_row(
            "SELECT id, location, is_whitelisted FROM directories WHERE location = ?1",
            [location],
            Self::row_to_directory,
        )
        .optional()
        .map_err(Into::into)
    }
}

fn parse_timestamp(value: &str, column: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Initialize or verify the catalog schema.
fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        create_schema_v1(conn)?;
        return Ok(());
    }

    let version: i32 = conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(StoreError::VersionTooNew {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(())
}

fn create_schema_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        CREATE TABLE files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            extension TEXT NOT NULL,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL,
            size_bytes INTEGER NOT NULL CHECK (size_bytes >= 0),
            content_hash TEXT NOT NULL
        );
        CREATE INDEX idx_files_name ON files(name);

        CREATE TABLE keywords (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
            keyword TEXT NOT NULL
        );
        CREATE INDEX idx_keywords_keyword ON keywords(keyword);
        CREATE INDEX idx_keywords_file ON keywords(file_id);

        CREATE TABLE directories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location TEXT NOT NULL UNIQUE,
            is_whitelisted INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )?;
    conn.execute(
        "INSERT INTO schema_version (id, version) VALUES (1, ?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

fn insert_file(conn: &Connection, record: &FileRecord) -> Result<i64, StoreError> {
    let result = conn.execute(
        "INSERT INTO files (path, name, extension, created_at, modified_at, size_bytes, content_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.path,
            record.name,
            record.extension,
            record.created_at.to_rfc3339(),
            record.modified_at.to_rfc3339(),
            record.size_bytes as i64,
            record.content_hash,
        ],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicatePath(record.path.clone())),
        Err(e) => Err(e.into()),
    }
}

impl CatalogStore for SqliteStore {
    fn create_file(&self, record: &FileRecord) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        insert_file(&conn, record)
    }

    fn replace_file(&self, record: &FileRecord) -> Result<i64, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM files WHERE path = ?1", [&record.path])?;
        // Dropping the transaction on error rolls the delete back.
        let id = insert_file(&tx, record)?;
        tx.commit()?;
        Ok(id)
    }

    fn delete_file_by_path(&self, path: &str) -> Result<bool, StoreError> {
        let rows = self.conn()?.execute("DELETE FROM files WHERE path = ?1", [path])?;
        Ok(rows > 0)
    }

    fn create_keywords(&self, batch: &[KeywordRecord]) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO keywords (file_id, keyword) VALUES (?1, ?2)")?;
            for record in batch {
                stmt.execute(params![record.file_id, record.keyword])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_file_by_path(&self, path: &str) -> Result<Option<FileRecord>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.path = ?1"),
            [path],
            Self::row_to_file,
        )
        .optional()
        .map_err(Into::into)
    }

    fn keywords_for_file(&self, file_id: i64) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT keyword FROM keywords WHERE file_id = ?1 ORDER BY id")?;
        let keywords = stmt
            .query_map([file_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keywords)
    }

    fn search_files_by_name(&self, query: &str) -> Result<Vec<FileRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files f
             WHERE instr(lower(f.name), lower(?1)) > 0
             ORDER BY f.path"
        ))?;
        let files = stmt
            .query_map([query], Self::row_to_file)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    fn search_keywords(&self, prefix: &str) -> Result<Vec<KeywordMatch>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS}, k.keyword FROM keywords k
             JOIN files f ON f.id = k.file_id
             WHERE substr(k.keyword, 1, length(?1)) = ?1
             ORDER BY f.path, k.id"
        ))?;
        let matches = stmt
            .query_map([prefix.to_lowercase()], |row| {
                Ok(KeywordMatch {
                    file: Self::row_to_file(row)?,
                    keyword: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn count_files_under(&self, dir: &str) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let prefix = dir_prefix(dir);
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM files
             WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2",
            params![prefix.trim_end_matches(std::path::MAIN_SEPARATOR), prefix],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn delete_files_under(&self, dir: &str) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let prefix = dir_prefix(dir);
        let rows = conn.execute(
            "DELETE FROM files WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2",
            params![prefix.trim_end_matches(std::path::MAIN_SEPARATOR), prefix],
        )?;
        Ok(rows as u64)
    }

    fn add_directory(&self, location: &str) -> Result<DirectoryEntry, StoreError> {
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO directories (location, is_whitelisted) VALUES (?1, 1)",
            [location],
        );

        match result {
            Ok(_) => Ok(DirectoryEntry {
                id: Some(conn.last_insert_rowid()),
                location: location.to_string(),
                is_whitelisted: true,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::DuplicateDirectory(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_directory(&self, location: &str) -> Result<Option<DirectoryEntry>, StoreError> {
        let conn = self.conn()?;
        Self::query_directory(&conn, location)
    }

    fn set_whitelisted(
        &self,
        location: &str,
        whitelisted: bool,
    ) -> Result<DirectoryEntry, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO directories (location, is_whitelisted) VALUES (?1, ?2)
             ON CONFLICT(location) DO UPDATE SET is_whitelisted = excluded.is_whitelisted",
            params![location, whitelisted],
        )?;
        Self::query_directory(&conn, location)?
            .ok_or_else(|| StoreError::NotFound(location.to_string()))
    }

    fn list_directories(&self, whitelisted: bool) -> Result<Vec<DirectoryEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, location, is_whitelisted FROM directories
             WHERE is_whitelisted = ?1 ORDER BY location",
        )?;
        let dirs = stmt
            .query_map([whitelisted], Self::row_to_directory)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dirs)
    }

    fn remove_directory(&self, location: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;
        let prefix = dir_prefix(location);

        let tx = conn.transaction()?;
        let dirs = tx.execute("DELETE FROM directories WHERE location = ?1", [location])?;
        if dirs == 0 {
            return Err(StoreError::NotFound(location.to_string()));
        }
        let files = tx.execute(
            "DELETE FROM files WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2",
            params![prefix.trim_end_matches(std::path::MAIN_SEPARATOR), prefix],
        )?;
        tx.commit()?;

        Ok(files as u64)
    }
}
