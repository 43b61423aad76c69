//! Single-slot holder of the current snapshot.
//!
//! The slot holds an `Arc<Snapshot>` that is swapped whole: readers clone the `Arc`
//! under a short lock and then work on an immutable snapshot, so a filter never
//! sees a half-built or half-enriched state and never waits for a fetch. Writers
//! (load and refresh) are serialized by a separate lock held for the whole
//! build, so a refresh always merges into the latest snapshot. If the writer's
//! build fails, the slot keeps its previous value.
use std::sync::{Arc, Mutex};

use screener_common::Result;

use crate::model::snapshot::Snapshot;

/// Process-wide store for the current snapshot; empty until the first load.
#[derive(Default)]
pub struct SnapshotStore {
    current: Mutex<Option<Arc<Snapshot>>>,
    writer: Mutex<()>,
}

impl SnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if one has been stored.
    pub fn current(&self) -> Result<Option<Arc<Snapshot>>> {
        Ok(self.current.lock()?.clone())
    }

    /// Runs `build` with the current snapshot and stores what it returns.
    ///
    /// Only one update runs at a time. When `build` fails, nothing is stored and the
    /// error is returned.
    pub fn update<F>(&self, build: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce(Option<&Snapshot>) -> Result<Snapshot>,
    {
        let _writer = self.writer.lock()?;
        let previous = self.current()?;
        let next = Arc::new(build(previous.as_deref())?);
        *self.current.lock()? = Some(Arc::clone(&next));
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use screener_common::{QuoteRow, ScreenerError};

    fn snapshot_of(symbols: &[&str]) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());
        for symbol in symbols {
            snapshot.insert(QuoteRow::new(symbol)).unwrap();
        }
        snapshot
    }

    #[test]
    fn starts_empty() {
        assert!(SnapshotStore::new().current().unwrap().is_none());
    }

    #[test]
    fn update_replaces_and_sees_previous() {
        let store = SnapshotStore::new();
        store
            .update(|previous| {
                assert!(previous.is_none());
                Ok(snapshot_of(&["A"]))
            })
            .unwrap();
        store
            .update(|previous| {
                assert_eq!(previous.map(Snapshot::len), Some(1));
                Ok(snapshot_of(&["A", "B"]))
            })
            .unwrap();
        assert_eq!(store.current().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn failed_update_keeps_previous() {
        let store = SnapshotStore::new();
        store.update(|_| Ok(snapshot_of(&["A"]))).unwrap();
        let err = store
            .update(|_| Err(ScreenerError::SourceUnavailable("down".into())))
            .unwrap_err();
        assert!(matches!(err, ScreenerError::SourceUnavailable(_)));
        assert_eq!(store.current().unwrap().unwrap().symbols().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn readers_keep_their_snapshot_across_updates() {
        let store = SnapshotStore::new();
        store.update(|_| Ok(snapshot_of(&["A"]))).unwrap();
        let held = store.current().unwrap().unwrap();
        store.update(|_| Ok(snapshot_of(&["B", "C"]))).unwrap();
        assert_eq!(held.len(), 1);
    }
}
