use anyhow::{Context, Result};

use crate::models::{Job, JobUrl};

pub const BOOKMARKS_KEY: &str = "appliedJobs";

/// String key-value persistence used for client-side state.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyBookmarked,
    /// The posting has no detail URL to key it by.
    MissingIdentifier,
}

/// Postings the user chose to keep, persisted as one JSON array.
///
/// Every mutation rewrites the whole snapshot.
pub struct Bookmarks<S: KeyValueStore> {
    store: S,
    jobs: Vec<Job>,
}

impl<S: KeyValueStore> Bookmarks<S> {
    /// Loads the saved list. A stored value that is not a JSON array of job
    /// records is discarded and the list starts empty.
    pub fn load(store: S) -> Result<Self> {
        let jobs = match store.get(BOOKMARKS_KEY)? {
            None => Vec::new(),
            Some(raw) => match decode(&raw) {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::warn!(error = %e, "discarding corrupt bookmark list");
                    store.remove(BOOKMARKS_KEY)?;
                    Vec::new()
                }
            },
        };
        tracing::debug!(count = jobs.len(), "loaded bookmarks");
        Ok(Self { store, jobs })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, id: Option<&JobUrl>) -> bool {
        match id {
            Some(id) => self.jobs.iter().any(|j| j.id().as_ref() == Some(id)),
            None => false,
        }
    }

    pub fn add(&mut self, job: Job) -> Result<AddOutcome> {
        let Some(id) = job.id() else {
            return Ok(AddOutcome::MissingIdentifier);
        };
        if self.contains(Some(&id)) {
            return Ok(AddOutcome::AlreadyBookmarked);
        }

        let mut next = self.jobs.clone();
        next.push(job);
        self.commit(next)?;
        Ok(AddOutcome::Added)
    }

    pub fn remove(&mut self, id: &JobUrl) -> Result<bool> {
        if !self.contains(Some(id)) {
            return Ok(false);
        }
        let next = self
            .jobs
            .iter()
            .filter(|j| j.id().as_ref() != Some(id))
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.commit(Vec::new())
    }

    /// Persists `next`, and only then makes it the in-memory list.
    fn commit(&mut self, next: Vec<Job>) -> Result<()> {
        let json = serde_json::to_string(&next).context("Failed to encode bookmarks")?;
        self.store.set(BOOKMARKS_KEY, &json)?;
        self.jobs = next;
        Ok(())
    }
}

fn decode(raw: &str) -> Result<Vec<Job>> {
    let value: serde_json::Value = serde_json::from_str(raw).context("not valid JSON")?;
    if !value.is_array() {
        anyhow::bail!("not a JSON array");
    }
    serde_json::from_value(value).context("array holds something other than job records")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        values: RefCell<HashMap<String, String>>,
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.values.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.values.borrow_mut().remove(key);
            Ok(())
        }
    }

    /// Reads succeed, every write fails.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("disk full")
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.0.remove(key)
        }
    }

    fn posting(url: &str) -> Job {
        Job {
            title: format!("Job at {}", url),
            detail_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_same_identifier_twice_stores_once() {
        let store = MemoryStore::default();
        let mut bookmarks = Bookmarks::load(&store).unwrap();

        assert_eq!(bookmarks.add(posting("https://x.io/1")).unwrap(), AddOutcome::Added);
        assert_eq!(
            bookmarks.add(posting("https://x.io/1")).unwrap(),
            AddOutcome::AlreadyBookmarked
        );
        assert_eq!(bookmarks.len(), 1);

        let saved: Vec<Job> =
            serde_json::from_str(&store.get(BOOKMARKS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn test_add_without_identifier_is_refused() {
        let store = MemoryStore::default();
        let mut bookmarks = Bookmarks::load(&store).unwrap();
        assert_eq!(bookmarks.add(Job::default()).unwrap(), AddOutcome::MissingIdentifier);
        assert!(bookmarks.is_empty());
        assert!(!bookmarks.contains(None));
    }

    #[test]
    fn test_corrupt_values_reset_to_empty() {
        for corrupt in ["{not json", r#"{"title": "x"}"#, "42", r#"[1, 2, 3]"#] {
            let store = MemoryStore::default();
            store.set(BOOKMARKS_KEY, corrupt).unwrap();

            let bookmarks = Bookmarks::load(&store).unwrap();
            assert!(bookmarks.is_empty(), "{} should load as empty", corrupt);
            assert_eq!(store.get(BOOKMARKS_KEY).unwrap(), None);
        }
    }

    #[test]
    fn test_bookmarks_survive_reload() {
        let store = MemoryStore::default();
        {
            let mut bookmarks = Bookmarks::load(&store).unwrap();
            bookmarks.add(posting("https://x.io/1")).unwrap();
            bookmarks.add(posting("https://x.io/2")).unwrap();
        }

        let bookmarks = Bookmarks::load(&store).unwrap();
        let urls: Vec<_> = bookmarks
            .jobs()
            .iter()
            .filter_map(|j| j.detail_url.as_deref())
            .collect();
        assert_eq!(urls, vec!["https://x.io/1", "https://x.io/2"]);
        assert!(bookmarks.contains(JobUrl::new("https://x.io/2").as_ref()));
    }

    #[test]
    fn test_remove_and_clear() {
        let store = MemoryStore::default();
        let mut bookmarks = Bookmarks::load(&store).unwrap();
        bookmarks.add(posting("https://x.io/1")).unwrap();
        bookmarks.add(posting("https://x.io/2")).unwrap();

        let first = JobUrl::new("https://x.io/1").unwrap();
        assert!(bookmarks.remove(&first).unwrap());
        assert!(!bookmarks.remove(&first).unwrap());
        assert_eq!(bookmarks.len(), 1);

        bookmarks.clear().unwrap();
        assert_eq!(store.get(BOOKMARKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_sqlite_backed_bookmarks() {
        let db = Database::open_in_memory().unwrap();
        db.set(BOOKMARKS_KEY, "garbage").unwrap();

        let mut bookmarks = Bookmarks::load(db).unwrap();
        assert!(bookmarks.is_empty());
        assert_eq!(bookmarks.add(posting("https://x.io/9")).unwrap(), AddOutcome::Added);
        let saved = bookmarks.store.get(BOOKMARKS_KEY).unwrap().unwrap();
        assert!(saved.contains("https://x.io/9"));
    }

    #[test]
    fn test_failed_write_leaves_list_unchanged() {
        let inner = MemoryStore::default();
        let kept = vec![posting("https://x.io/1")];
        inner.set(BOOKMARKS_KEY, &serde_json::to_string(&kept).unwrap()).unwrap();
        let store = ReadOnlyStore(inner);
        let mut bookmarks = Bookmarks::load(&store).unwrap();
        assert_eq!(bookmarks.len(), 1);

        let new = JobUrl::new("https://x.io/2");
        assert!(bookmarks.add(posting("https://x.io/2")).is_err());
        assert_eq!(bookmarks.len(), 1);
        assert!(!bookmarks.contains(new.as_ref()));

        let old = JobUrl::new("https://x.io/1").unwrap();
        assert!(bookmarks.remove(&old).is_err());
        assert!(bookmarks.contains(Some(&old)));

        assert!(bookmarks.clear().is_err());
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(
            store.get(BOOKMARKS_KEY).unwrap(),
            Some(serde_json::to_string(&kept).unwrap())
        );
    }
}
