//! JSON-file backed course table.

use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Course, CourseChanges};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read or write course table: {0}")]
    Io(#[from] std::io::Error),
    #[error("course table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk layout: the rows plus the highest id ever handed out, so ids of
/// deleted rows are never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CourseTable {
    last_id: u64,
    courses: Vec<Course>,
}

/// Course rows kept in memory and written through to disk on every change.
///
/// Mutations are applied to a copy of the table and only swapped in once the
/// copy is on disk, so a failed write leaves memory and file in agreement.
pub struct CourseStore {
    table: RwLock<CourseTable>,
    persist_path: PathBuf,
}

impl CourseStore {
    pub fn open_or_create(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let table = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            CourseTable::default()
        };

        Ok(Self {
            table: RwLock::new(table),
            persist_path: path.to_path_buf(),
        })
    }

    /// All courses in ascending id order.
    pub fn list(&self) -> Vec<Course> {
        self.table.read().courses.clone()
    }

    pub fn get(&self, id: u64) -> Option<Course> {
        self.table.read().courses.iter().find(|c| c.id == id).cloned()
    }

    /// Insert a new row from validated changes.
    pub fn create(&self, changes: CourseChanges) -> Result<Course, StoreError> {
        let mut table = self.table.write();
        let mut next = table.clone();
        let now = Utc::now();
        next.last_id += 1;

        let course = Course {
            id: next.last_id,
            title: changes.title.unwrap_or_default(),
            summary: changes.summary.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        next.courses.push(course.clone());
        self.persist(&next)?;
        *table = next;
        Ok(course)
    }

    /// Apply the supplied fields to an existing row. Returns `None` when the
    /// id does not exist.
    pub fn update(&self, id: u64, changes: CourseChanges) -> Result<Option<Course>, StoreError> {
        let mut table = self.table.write();
        let mut next = table.clone();
        let Some(course) = next.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            course.title = title;
        }
        if let Some(summary) = changes.summary {
            course.summary = summary;
        }
        course.updated_at = Utc::now();

        let updated = course.clone();
        self.persist(&next)?;
        *table = next;
        Ok(Some(updated))
    }

    /// Remove a row. Returns `false` when the id does not exist.
    pub fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let mut table = self.table.write();
        if !table.courses.iter().any(|c| c.id == id) {
            return Ok(false);
        }

        let mut next = table.clone();
        next.courses.retain(|c| c.id != id);
        self.persist(&next)?;
        *table = next;
        Ok(true)
    }

    pub fn count(&self) -> usize {
        self.table.read().courses.len()
    }

    /// Atomic write via temp file + rename.
    fn persist(&self, table: &CourseTable) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(table)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.persist_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str, summary: &str) -> CourseChanges {
        CourseChanges {
            title: Some(title.into()),
            summary: Some(summary.into()),
        }
    }

    fn open_temp() -> (tempfile::TempDir, CourseStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CourseStore::open_or_create(&dir.path().join("courses.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let (_dir, store) = open_temp();
        let a = store.create(payload("A", "a")).unwrap();
        let b = store.create(payload("B", "b")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_update_changes_only_supplied_fields() {
        let (_dir, store) = open_temp();
        let course = store.create(payload("Sample course", "old")).unwrap();

        let updated = store
            .update(
                course.id,
                CourseChanges {
                    title: None,
                    summary: Some("new".into()),
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Sample course");
        assert_eq!(updated.summary, "new");
        assert_eq!(updated.created_at, course.created_at);
        assert!(updated.updated_at >= course.updated_at);
    }

    #[test]
    fn test_update_missing_returns_none() {
        let (_dir, store) = open_temp();
        assert!(store.update(999, payload("x", "y")).unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_row() {
        let (_dir, store) = open_temp();
        let course = store.create(payload("A", "a")).unwrap();
        assert!(store.delete(course.id).unwrap());
        assert!(store.get(course.id).is_none());
        assert!(!store.delete(course.id).unwrap());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_dir, store) = open_temp();
        store.create(payload("A", "a")).unwrap();
        let b = store.create(payload("B", "b")).unwrap();
        store.delete(b.id).unwrap();
        let c = store.create(payload("C", "c")).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_reopen_loads_persisted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        {
            let store = CourseStore::open_or_create(&path).unwrap();
            store.create(payload("Persisted", "on disk")).unwrap();
        }
        let store = CourseStore::open_or_create(&path).unwrap();
        let courses = store.list();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title, "Persisted");
    }

    #[test]
    fn test_failed_write_leaves_table_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        let store = CourseStore::open_or_create(&path).unwrap();
        let kept = store.create(payload("Kept", "before")).unwrap();

        // A directory where the temp file goes makes every write fail
        std::fs::create_dir(dir.path().join("courses.json.tmp")).unwrap();

        assert!(matches!(store.create(payload("Lost", "x")), Err(StoreError::Io(_))));
        assert_eq!(store.count(), 1);

        assert!(store.update(kept.id, payload("Changed", "after")).is_err());
        assert_eq!(store.get(kept.id), Some(kept.clone()));

        assert!(store.delete(kept.id).is_err());
        assert_eq!(store.list(), vec![kept.clone()]);

        // The next successful write does not skip the id of the failed create
        std::fs::remove_dir(dir.path().join("courses.json.tmp")).unwrap();
        let next = store.create(payload("Next", "n")).unwrap();
        assert_eq!(next.id, kept.id + 1);

        let reopened = CourseStore::open_or_create(&path).unwrap();
        assert_eq!(reopened.list(), vec![kept, next]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            CourseStore::open_or_create(&path),
            Err(StoreError::Json(_))
        ));
    }
}
