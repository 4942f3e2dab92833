//! JSON file draft store
//!
//! One file per namespace (`composer.drafts.<wizard>.json`) holding the JSON
//! array of draft slots; a discarded slot is `null`. Writes go to a temp file
//! and are renamed into place.
//!
//! Every read-modify-write runs under the store's lock. Share one instance
//! (clones share the lock) between all sessions writing the same namespace.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{append, live, namespace_key, tombstone, upsert, Draft, DraftError, DraftStore, Slots};

#[derive(Debug, Clone)]
pub struct JsonFileDraftStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileDraftStore {
    /// Store for `wizard` drafts inside `dir`
    pub fn new(dir: impl AsRef<Path>, wizard: &str) -> Self {
        let path = dir
            .as_ref()
            .join(format!("{}.json", namespace_key(wizard)));
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> Result<Slots, DraftError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, drafts: &[Option<Draft>]) -> Result<(), DraftError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(drafts)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), count = drafts.len(), "drafts written");
        Ok(())
    }
}

impl DraftStore for JsonFileDraftStore {
    fn entries(&self) -> Result<Vec<(usize, Draft)>, DraftError> {
        let _guard = self.guard();
        Ok(live(&self.read()?))
    }

    fn save(&self, index: usize, draft: Draft) -> Result<usize, DraftError> {
        let _guard = self.guard();
        let mut slots = self.read()?;
        let index = upsert(&mut slots, index, draft)?;
        self.write(&slots)?;
        Ok(index)
    }

    fn insert(&self, draft: Draft) -> Result<usize, DraftError> {
        let _guard = self.guard();
        let mut slots = self.read()?;
        let index = append(&mut slots, draft);
        self.write(&slots)?;
        Ok(index)
    }

    fn discard(&self, index: usize) -> Result<(), DraftError> {
        let _guard = self.guard();
        let mut slots = self.read()?;
        if tombstone(&mut slots, index) {
            self.write(&slots)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::value::DraftValue;
    use serde_json::json;
    use tempfile::TempDir;

    fn draft(title: &str) -> Draft {
        let mut value = DraftValue::new();
        value.insert("title".into(), json!(title));
        Draft::new(value, Some("basics".into()))
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileDraftStore::new(temp_dir.path(), "project");
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.insert(draft("first")).unwrap(), 0);
    }

    #[test]
    fn test_save_round_trips_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileDraftStore::new(temp_dir.path(), "project");
        let d = draft("Soup kitchen");

        store.save(0, d.clone()).unwrap();
        store.save(0, d.clone()).unwrap();

        let reopened = JsonFileDraftStore::new(temp_dir.path(), "project");
        assert_eq!(reopened.list().unwrap(), vec![d]);
        assert!(store
            .path()
            .ends_with("composer.drafts.project.json"));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let projects = JsonFileDraftStore::new(temp_dir.path(), "project");
        let orgs = JsonFileDraftStore::new(temp_dir.path(), "organization");

        projects.save(0, draft("p")).unwrap();
        assert!(orgs.list().unwrap().is_empty());
    }

    #[test]
    fn test_discard_leaves_null_slot() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileDraftStore::new(temp_dir.path(), "project");
        store.insert(draft("a")).unwrap();
        store.insert(draft("b")).unwrap();

        store.discard(0).unwrap();

        let reopened = JsonFileDraftStore::new(temp_dir.path(), "project");
        let entries = reopened.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, 1);
        assert_eq!(entries[0].1.value["title"], "b");
        assert_eq!(reopened.insert(draft("c")).unwrap(), 2);

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert!(on_disk[0].is_null());
    }

    #[test]
    fn test_concurrent_inserts_are_serialized() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileDraftStore::new(temp_dir.path(), "organization");

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.insert(draft(&i.to_string())).unwrap())
            })
            .collect();
        let mut indices: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        indices.sort_unstable();

        assert_eq!(indices, (0..6).collect::<Vec<_>>());
        assert_eq!(store.list().unwrap().len(), 6);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileDraftStore::new(temp_dir.path(), "project");
        fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.list(), Err(DraftError::Corrupt(_))));
    }

    #[test]
    fn test_reads_plain_wire_format() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileDraftStore::new(temp_dir.path(), "organization");
        fs::write(
            store.path(),
            r#"[{"value":{"name":"Shelter"},"createdAt":1,"updatedAt":2}]"#,
        )
        .unwrap();

        let drafts = store.list().unwrap();
        assert_eq!(drafts[0].value["name"], "Shelter");
        assert_eq!(drafts[0].updated_at, 2);
        assert!(drafts[0].step_id.is_none());
    }
}
