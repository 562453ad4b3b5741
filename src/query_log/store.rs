use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

use super::record::OperationRecord;

/// One recorded operation in a screen's query log
#[derive(Debug)]
pub struct QueryLogEntry {
    pub id: Uuid,
    /// Capture time, taken when the entry is appended
    pub timestamp: DateTime<Utc>,
    pub record: OperationRecord,
    pub source: String,
    /// Write-once; filled when the logged operation settles
    duration_ms: OnceLock<u64>,
}

impl QueryLogEntry {
    fn new(record: OperationRecord, source: String) -> Self {
        QueryLogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            record,
            source,
            duration_ms: OnceLock::new(),
        }
    }

    /// Create a detached entry that belongs to no store
    pub fn detached(record: impl Into<OperationRecord>, source: impl Into<String>) -> Self {
        Self::new(record.into(), source.into())
    }

    /// Display text for the recorded operation
    pub fn description(&self) -> String {
        self.record.render()
    }

    pub fn duration_millis(&self) -> Option<u64> {
        self.duration_ms.get().copied()
    }

    /// Record the measured duration. Returns false if one was already recorded.
    pub fn finish(&self, elapsed: Duration) -> bool {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.duration_ms.set(millis).is_ok()
    }
}

struct StoreInner {
    entries: Mutex<VecDeque<Arc<QueryLogEntry>>>,
    changes: watch::Sender<u64>,
}

/// Per-screen, newest-first log of issued operations.
///
/// Cloning yields another handle onto the same log.
#[derive(Clone)]
pub struct QueryLogStore {
    inner: Arc<StoreInner>,
}

impl Default for QueryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryLogStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                entries: Mutex::new(VecDeque::new()),
                changes,
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<Arc<QueryLogEntry>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a new entry at the front of the log and return it
    pub fn append(
        &self,
        record: impl Into<OperationRecord>,
        source: impl Into<String>,
        duration_millis: Option<u64>,
    ) -> Arc<QueryLogEntry> {
        let entry = QueryLogEntry::new(record.into(), source.into());
        if let Some(millis) = duration_millis {
            let _ = entry.duration_ms.set(millis);
        }
        let entry = Arc::new(entry);

        log::debug!("query log [{}]: {}", entry.source, entry.description());
        self.entries().push_front(entry.clone());
        self.inner.changes.send_modify(|version| *version += 1);

        entry
    }

    /// Snapshot of all entries, newest first
    pub fn all(&self) -> Vec<Arc<QueryLogEntry>> {
        self.entries().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries().clear();
        self.inner.changes.send_modify(|version| *version += 1);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Subscribe to change notifications; the value is a change counter
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn entries_come_back_newest_first() {
        let store = QueryLogStore::new();
        for i in 0..5 {
            store.append(format!("query {}", i), "Test", None);
        }

        let descriptions: Vec<String> = store.all().iter().map(|e| e.description()).collect();
        assert_eq!(
            descriptions,
            vec!["query 4", "query 3", "query 2", "query 1", "query 0"]
        );
        let timestamps: Vec<_> = store.all().iter().map(|e| e.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn length_counts_appends_since_last_clear() {
        let store = QueryLogStore::new();
        store.append("a", "Test", None);
        store.append("b", "Test", None);
        store.clear();
        assert!(store.is_empty());

        store.append("c", "Test", None);
        store.append("d", "Test", Some(12));
        store.append("e", "Test", None);
        assert_eq!(store.len(), 3);
        assert_eq!(store.all().len(), 3);
    }

    #[test]
    fn accepts_empty_description_and_source() {
        let store = QueryLogStore::new();
        let entry = store.append("", "", None);
        assert_eq!(entry.description(), "");
        assert_eq!(entry.source, "");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let store = QueryLogStore::new();
        for _ in 0..200 {
            store.append("SELECT 1", "Test", None);
        }
        let ids: HashSet<Uuid> = store.all().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn duration_is_write_once() {
        let store = QueryLogStore::new();
        let entry = store.append("SELECT 1", "Test", None);
        assert_eq!(entry.duration_millis(), None);

        assert!(entry.finish(Duration::from_millis(42)));
        assert!(!entry.finish(Duration::from_millis(7)));
        assert_eq!(store.all()[0].duration_millis(), Some(42));

        let preset = store.append("SELECT 2", "Test", Some(5));
        assert!(!preset.finish(Duration::from_millis(9)));
        assert_eq!(preset.duration_millis(), Some(5));
    }

    #[test]
    fn clones_share_entries() {
        let store = QueryLogStore::new();
        let handle = store.clone();
        handle.append("SELECT 1", "Test", None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_appends_and_clears() {
        let store = QueryLogStore::new();
        let mut changes = store.subscribe();

        store.append("SELECT 1", "Test", None);
        changes.changed().await.expect("store dropped");
        assert_eq!(*changes.borrow_and_update(), 1);

        store.clear();
        changes.changed().await.expect("store dropped");
        assert_eq!(*changes.borrow_and_update(), 2);
    }
}
