//! In-process transactional store with optional JSON snapshot persistence
//!
//! Transactions stage their changes privately. On commit the unique file name
//! constraint is re-checked against the committed state, the snapshot file (if
//! any) is rewritten through a temporary file and an atomic rename, and only
//! then is the new state published. A failed commit leaves both the in-memory
//! state and the snapshot file untouched.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::{ResultFilter, ResultStore, StoreTransaction};
use crate::app::models::{Aggregate, AggregateId, Row, RowId, StoredAggregate, StoredRow};
use crate::{Error, Result};

/// Committed store contents
#[derive(Debug, Clone, Default)]
struct StoreState {
    aggregates: BTreeMap<AggregateId, StoredAggregate>,
    rows: BTreeMap<AggregateId, Vec<StoredRow>>,
}

impl StoreState {
    fn live_aggregate_named(&self, file_name: &str) -> Option<&StoredAggregate> {
        self.aggregates
            .values()
            .find(|stored| stored.file_name() == file_name)
    }

    fn row_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }
}

/// On-disk layout of the snapshot file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    aggregates: Vec<StoredAggregate>,
    rows: Vec<StoredRow>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    aggregates: Vec<&'a StoredAggregate>,
    rows: Vec<&'a StoredRow>,
}

/// Transactional in-process store
///
/// Created with [`MemoryStore::new`] it keeps everything in memory; created
/// with [`MemoryStore::open`] it also persists every commit to a JSON file.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    next_aggregate_id: AtomicU64,
    next_row_id: AtomicU64,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an empty store that lives only in memory
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            next_aggregate_id: AtomicU64::new(1),
            next_row_id: AtomicU64::new(1),
            snapshot_path: None,
        }
    }

    /// Open a store backed by the snapshot file at `path`, creating it on first commit
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let file = std::fs::File::open(&path)
                .map_err(|e| Error::io(format!("Failed to open store {}", path.display()), e))?;
            serde_json::from_reader::<_, Snapshot>(BufReader::new(file)).map_err(|e| {
                Error::serialization(format!("Failed to read store {}", path.display()), e)
            })?
        } else {
            Snapshot::default()
        };

        let mut state = StoreState::default();
        for stored in snapshot.aggregates {
            state.aggregates.insert(stored.id, stored);
        }
        for row in snapshot.rows {
            state.rows.entry(row.aggregate_id).or_default().push(row);
        }

        let next_aggregate_id = state.aggregates.keys().map(|id| id.0).max().unwrap_or(0) + 1;
        let next_row_id = state
            .rows
            .values()
            .flatten()
            .map(|row| row.id.0)
            .max()
            .unwrap_or(0)
            + 1;

        info!(
            "Opened store {} with {} aggregates and {} rows",
            path.display(),
            state.aggregates.len(),
            state.row_count()
        );

        Ok(Self {
            state: RwLock::new(state),
            next_aggregate_id: AtomicU64::new(next_aggregate_id),
            next_row_id: AtomicU64::new(next_row_id),
            snapshot_path: Some(path),
        })
    }

    /// Location of the snapshot file, if the store is persistent
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Number of committed aggregates
    pub fn aggregate_count(&self) -> Result<usize> {
        Ok(self.read_state()?.aggregates.len())
    }

    /// Number of committed rows
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.read_state()?.row_count())
    }

    /// Committed rows owned by `id`, in insertion order
    pub fn rows_for(&self, id: AggregateId) -> Result<Vec<StoredRow>> {
        Ok(self
            .read_state()?
            .rows
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| Error::storage("read", "store lock poisoned"))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| Error::storage("write", "store lock poisoned"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    async fn begin(&self) -> Result<MemoryTransaction<'_>> {
        Ok(MemoryTransaction {
            store: self,
            deleted: BTreeSet::new(),
            staged_aggregates: BTreeMap::new(),
            staged_rows: Vec::new(),
            finished: false,
        })
    }

    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<StoredAggregate>> {
        let state = self.read_state()?;
        let mut results: Vec<StoredAggregate> = state
            .aggregates
            .values()
            .filter(|stored| filter.matches(&stored.aggregate))
            .cloned()
            .collect();

        results.sort_by(|a, b| {
            b.aggregate
                .created_at
                .cmp(&a.aggregate.created_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(results)
    }

    async fn latest_rows(&self, file_name: &str, limit: usize) -> Result<Vec<StoredRow>> {
        let state = self.read_state()?;
        let mut rows: Vec<StoredRow> = state
            .live_aggregate_named(file_name)
            .and_then(|stored| state.rows.get(&stored.id))
            .cloned()
            .unwrap_or_default();

        if rows.is_empty() {
            return Err(Error::not_found(file_name));
        }

        rows.sort_by(|a, b| b.row.timestamp.cmp(&a.row.timestamp));
        rows.truncate(limit);
        Ok(rows)
    }
}

/// A unit of work against a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    deleted: BTreeSet<AggregateId>,
    staged_aggregates: BTreeMap<AggregateId, StoredAggregate>,
    staged_rows: Vec<StoredRow>,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn is_live(&self, state: &StoreState, id: AggregateId) -> bool {
        self.staged_aggregates.contains_key(&id)
            || (state.aggregates.contains_key(&id) && !self.deleted.contains(&id))
    }

    fn find_live(&self, state: &StoreState, file_name: &str) -> Option<StoredAggregate> {
        self.staged_aggregates
            .values()
            .find(|stored| stored.file_name() == file_name)
            .or_else(|| {
                state
                    .aggregates
                    .values()
                    .find(|stored| {
                        stored.file_name() == file_name && !self.deleted.contains(&stored.id)
                    })
            })
            .cloned()
    }

    /// Check staged changes against the committed state
    fn check_conflicts(&self, state: &StoreState) -> Result<()> {
        if let Some(missing) = self
            .deleted
            .iter()
            .find(|id| !state.aggregates.contains_key(*id))
        {
            return Err(Error::storage(
                "commit",
                format!("aggregate {} was removed by another transaction", missing),
            ));
        }

        for staged in self.staged_aggregates.values() {
            if let Some(existing) = state.live_aggregate_named(staged.file_name()) {
                if !self.deleted.contains(&existing.id) {
                    return Err(Error::storage(
                        "commit",
                        format!(
                            "unique constraint violated: aggregate for '{}' already exists",
                            staged.file_name()
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn apply(&self, state: &mut StoreState) {
        for id in &self.deleted {
            state.aggregates.remove(id);
            state.rows.remove(id);
        }
        for (id, stored) in &self.staged_aggregates {
            state.aggregates.insert(*id, stored.clone());
        }
        for row in &self.staged_rows {
            state
                .rows
                .entry(row.aggregate_id)
                .or_default()
                .push(row.clone());
        }
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    async fn find_aggregate_by_file_name(
        &mut self,
        file_name: &str,
    ) -> Result<Option<StoredAggregate>> {
        let state = self.store.read_state()?;
        Ok(self.find_live(&state, file_name))
    }

    async fn delete_aggregate_cascade(&mut self, id: AggregateId) -> Result<usize> {
        if self.staged_aggregates.remove(&id).is_some() {
            let before = self.staged_rows.len();
            self.staged_rows.retain(|row| row.aggregate_id != id);
            return Ok(before - self.staged_rows.len());
        }

        let removed_rows = {
            let state = self.store.read_state()?;
            if !self.is_live(&state, id) {
                return Err(Error::storage(
                    "delete_aggregate_cascade",
                    format!("aggregate {} does not exist", id),
                ));
            }
            state.rows.get(&id).map(Vec::len).unwrap_or(0)
        };

        self.deleted.insert(id);
        debug!("Staged removal of aggregate {} and {} rows", id, removed_rows);
        Ok(removed_rows)
    }

    async fn insert_aggregate(&mut self, aggregate: Aggregate) -> Result<AggregateId> {
        {
            let state = self.store.read_state()?;
            if self.find_live(&state, &aggregate.file_name).is_some() {
                return Err(Error::storage(
                    "insert_aggregate",
                    format!(
                        "unique constraint violated: aggregate for '{}' already exists",
                        aggregate.file_name
                    ),
                ));
            }
        }

        let id = AggregateId(self.store.next_aggregate_id.fetch_add(1, Ordering::SeqCst));
        self.staged_aggregates
            .insert(id, StoredAggregate { id, aggregate });
        Ok(id)
    }

    async fn insert_rows(&mut self, rows: Vec<Row>, aggregate_id: AggregateId) -> Result<usize> {
        {
            let state = self.store.read_state()?;
            if !self.is_live(&state, aggregate_id) {
                return Err(Error::storage(
                    "insert_rows",
                    format!("aggregate {} does not exist", aggregate_id),
                ));
            }
        }

        let count = rows.len();
        self.staged_rows.reserve(count);
        for row in rows {
            let id = RowId(self.store.next_row_id.fetch_add(1, Ordering::SeqCst));
            self.staged_rows.push(StoredRow {
                id,
                aggregate_id,
                row,
            });
        }
        Ok(count)
    }

    async fn commit(mut self) -> Result<()> {
        // A failed commit discards the staged changes as well
        self.finished = true;
        let store = self.store;
        let mut state = store.write_state()?;
        self.check_conflicts(&state)?;

        match store.snapshot_path.as_deref() {
            Some(path) => {
                let mut next = state.clone();
                self.apply(&mut next);
                write_snapshot(path, &next)?;
                *state = next;
            }
            None => self.apply(&mut state),
        }

        debug!(
            "Committed {} new aggregates, {} new rows, {} removals",
            self.staged_aggregates.len(),
            self.staged_rows.len(),
            self.deleted.len()
        );
        Ok(())
    }

    async fn rollback(mut self) -> Result<()> {
        debug!(
            "Rolled back {} staged aggregates and {} staged rows",
            self.staged_aggregates.len(),
            self.staged_rows.len()
        );
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && (!self.staged_aggregates.is_empty() || !self.deleted.is_empty()) {
            warn!(
                "Transaction dropped without commit; discarding {} staged aggregates",
                self.staged_aggregates.len()
            );
        }
    }
}

/// Atomically replace the snapshot file with `state`
fn write_snapshot(path: &Path, state: &StoreState) -> Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| Error::storage("snapshot directory", e))?;

    let snapshot = SnapshotRef {
        aggregates: state.aggregates.values().collect(),
        rows: state.rows.values().flatten().collect(),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::storage("snapshot temp file", e))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer(&mut writer, &snapshot)
            .map_err(|e| Error::storage("snapshot encode", e))?;
        writer
            .flush()
            .map_err(|e| Error::storage("snapshot flush", e))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::storage("snapshot sync", e))?;
    temp.persist(path)
        .map_err(|e| Error::storage("snapshot persist", e.error))?;

    debug!("Wrote store snapshot {}", path.display());
    Ok(())
}
