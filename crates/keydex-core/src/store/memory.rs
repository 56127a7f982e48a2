//! In-memory catalog store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::error::StoreError;
use super::models::{is_under, DirectoryEntry, FileRecord, KeywordMatch, KeywordRecord};
use super::CatalogStore;

#[derive(Default)]
struct Inner {
    next_file_id: i64,
    next_dir_id: i64,
    files: BTreeMap<i64, FileRecord>,
    by_path: HashMap<String, i64>,
    keywords: Vec<KeywordRecord>,
    dirs: BTreeMap<String, DirectoryEntry>,
}

impl Inner {
    fn remove_file(&mut self, id: i64) {
        if let Some(file) = self.files.remove(&id) {
            self.by_path.remove(&file.path);
        }
        self.keywords.retain(|k| k.file_id != id);
    }
}

/// Catalog kept in process memory.
///
/// Same observable semantics as [`super::SqliteStore`]: unique paths, keyword
/// batches are all-or-nothing, keywords cascade with their file.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
    }

    /// All file records, ordered by id.
    pub fn files(&self) -> Vec<FileRecord> {
        self.lock()
            .map(|inner| inner.files.values().cloned().collect())
            .unwrap_or_default()
    }

    /// All keyword records, in insertion order.
    pub fn keywords(&self) -> Vec<KeywordRecord> {
        self.lock()
            .map(|inner| inner.keywords.clone())
            .unwrap_or_default()
    }
}

impl CatalogStore for MemoryStore {
    fn create_file(&self, record: &FileRecord) -> Result<i64, StoreError> {
        let mut inner = self.lock()?;
        if inner.by_path.contains_key(&record.path) {
            return Err(StoreError::DuplicatePath(record.path.clone()));
        }

        inner.next_file_id += 1;
        let id = inner.next_file_id;

        let mut stored = record.clone();
        stored.id = Some(id);
        inner.by_path.insert(stored.path.clone(), id);
        inner.files.insert(id, stored);

        Ok(id)
    }

    fn replace_file(&self, record: &FileRecord) -> Result<i64, StoreError> {
        let mut inner = self.lock()?;
        if let Some(old) = inner.by_path.get(&record.path).copied() {
            inner.remove_file(old);
        }

        inner.next_file_id += 1;
        let id = inner.next_file_id;

        let mut stored = record.clone();
        stored.id = Some(id);
        inner.by_path.insert(stored.path.clone(), id);
        inner.files.insert(id, stored);

        Ok(id)
    }

    fn delete_file_by_path(&self, path: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        match inner.by_path.get(path).copied() {
            Some(id) => {
                inner.remove_file(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn create_keywords(&self, batch: &[KeywordRecord]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;

        // Validate the whole batch before inserting anything.
        if let Some(orphan) = batch.iter().find(|k| !inner.files.contains_key(&k.file_id)) {
            return Err(StoreError::NotFound(format!("file id {}", orphan.file_id)));
        }

        inner.keywords.extend_from_slice(batch);
        Ok(())
    }

    fn get_file_by_path(&self, path: &str) -> Result<Option<FileRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .by_path
            .get(path)
            .and_then(|id| inner.files.get(id))
            .cloned())
    }

    fn keywords_for_file(&self, file_id: i64) -> Result<Vec<String>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .keywords
            .iter()
            .filter(|k| k.file_id == file_id)
            .map(|k| k.keyword.clone())
            .collect())
    }

    fn search_files_by_name(&self, query: &str) -> Result<Vec<FileRecord>, StoreError> {
        let needle = query.to_lowercase();
        let inner = self.lock()?;
        Ok(inner
            .files
            .values()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn search_keywords(&self, prefix: &str) -> Result<Vec<KeywordMatch>, StoreError> {
        let prefix = prefix.to_lowercase();
        let inner = self.lock()?;
        Ok(inner
            .keywords
            .iter()
            .filter(|k| k.keyword.starts_with(&prefix))
            .filter_map(|k| {
                inner.files.get(&k.file_id).map(|file| KeywordMatch {
                    file: file.clone(),
                    keyword: k.keyword.clone(),
                })
            })
            .collect())
    }

    fn count_files_under(&self, dir: &str) -> Result<u64, StoreError> {
        let inner = self.lock()?;
        Ok(inner.files.values().filter(|f| is_under(&f.path, dir)).count() as u64)
    }

    fn delete_files_under(&self, dir: &str) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let ids: Vec<i64> = inner
            .files
            .values()
            .filter(|f| is_under(&f.path, dir))
            .filter_map(|f| f.id)
            .collect();

        for id in &ids {
            inner.remove_file(*id);
        }
        Ok(ids.len() as u64)
    }

    fn add_directory(&self, location: &str) -> Result<DirectoryEntry, StoreError> {
        let mut inner = self.lock()?;
        if inner.dirs.contains_key(location) {
            return Err(StoreError::DuplicateDirectory(location.to_string()));
        }

        inner.next_dir_id += 1;
        let entry = DirectoryEntry {
            id: Some(inner.next_dir_id),
            location: location.to_string(),
            is_whitelisted: true,
        };
        inner.dirs.insert(location.to_string(), entry.clone());
        Ok(entry)
    }

    fn get_directory(&self, location: &str) -> Result<Option<DirectoryEntry>, StoreError> {
        Ok(self.lock()?.dirs.get(location).cloned())
    }

    fn set_whitelisted(
        &self,
        location: &str,
        whitelisted: bool,
    ) -> Result<DirectoryEntry, StoreError> {
        let mut inner = self.lock()?;
        if !inner.dirs.contains_key(location) {
            inner.next_dir_id += 1;
            let id = inner.next_dir_id;
            inner.dirs.insert(
                location.to_string(),
                DirectoryEntry {
                    id: Some(id),
                    location: location.to_string(),
                    is_whitelisted: whitelisted,
                },
            );
        }

        let entry = inner
            .dirs
            .get_mut(location)
            .ok_or_else(|| StoreError::NotFound(location.to_string()))?;
        entry.is_whitelisted = whitelisted;
        Ok(entry.clone())
    }

    fn list_directories(&self, whitelisted: bool) -> Result<Vec<DirectoryEntry>, StoreError> {
        Ok(self
            .lock()?
            .dirs
            .values()
            .filter(|d| d.is_whitelisted == whitelisted)
            .cloned()
            .collect())
    }

    fn remove_directory(&self, location: &str) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        if inner.dirs.remove(location).is_none() {
            return Err(StoreError::NotFound(location.to_string()));
        }

        let ids: Vec<i64> = inner
            .files
            .values()
            .filter(|f| is_under(&f.path, location))
            .filter_map(|f| f.id)
            .collect();
        for id in &ids {
            inner.remove_file(*id);
        }
        Ok(ids.len() as u64)
    }
}
