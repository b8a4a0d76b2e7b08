//! Test utilities for ingestion testing
//!
//! Provides upload fixtures, a coordinator over a fresh in-memory store and a
//! store wrapper that fails on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::IngestionCoordinator;
use crate::app::models::{Aggregate, AggregateId, Row, StoredAggregate, StoredRow};
use crate::app::store::{MemoryStore, MemoryTransaction, ResultFilter, ResultStore, StoreTransaction};
use crate::config::IngestConfig;
use crate::{Error, Result};


pub const HEADER: &str = "Date;ExecutionTime;Value";

/// Upload with `count` valid rows, one second apart, values 1..=count
pub fn valid_upload(count: usize) -> String {
    let mut content = String::from(HEADER);
    for i in 0..count {
        content.push_str(&format!(
            "\n2024-01-15T10-{:02}-{:02}.1234Z;1.5;{}",
            (i / 60) % 60,
            i % 60,
            i + 1
        ));
    }
    content
}

pub fn coordinator() -> IngestionCoordinator<MemoryStore> {
    IngestionCoordinator::new(Arc::new(MemoryStore::new()), IngestConfig::default())
        .expect("default config is valid")
}

/// Delegates to a [`MemoryStore`] but can be told to fail `insert_rows`
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_inserts: AtomicBool,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.fail_inserts.store(failing, Ordering::SeqCst);
    }
}

pub struct FlakyTransaction<'a> {
    inner: MemoryTransaction<'a>,
    fail_inserts: bool,
}

impl ResultStore for FlakyStore {
    type Transaction<'a> = FlakyTransaction<'a>;

    async fn begin(&self) -> Result<FlakyTransaction<'_>> {
        Ok(FlakyTransaction {
            inner: self.inner.begin().await?,
            fail_inserts: self.fail_inserts.load(Ordering::SeqCst),
        })
    }

    async fn list_results(&self, filter: &ResultFilter) -> Result<Vec<StoredAggregate>> {
        self.inner.list_results(filter).await
    }

    async fn latest_rows(&self, file_name: &str, limit: usize) -> Result<Vec<StoredRow>> {
        self.inner.latest_rows(file_name, limit).await
    }
}

impl StoreTransaction for FlakyTransaction<'_> {
    async fn find_aggregate_by_file_name(
        &mut self,
        file_name: &str,
    ) -> Result<Option<StoredAggregate>> {
        self.inner.find_aggregate_by_file_name(file_name).await
    }

    async fn delete_aggregate_cascade(&mut self, id: AggregateId) -> Result<usize> {
        self.inner.delete_aggregate_cascade(id).await
    }

    async fn insert_aggregate(&mut self, aggregate: Aggregate) -> Result<AggregateId> {
        self.inner.insert_aggregate(aggregate).await
    }

    async fn insert_rows(&mut self, rows: Vec<Row>, aggregate_id: AggregateId) -> Result<usize> {
        if self.fail_inserts {
            return Err(Error::storage(
                "insert_rows",
                std::io::Error::other("connection reset"),
            ));
        }
        self.inner.insert_rows(rows, aggregate_id).await
    }

    async fn commit(self) -> Result<()> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<()> {
        self.inner.rollback().await
    }
}
