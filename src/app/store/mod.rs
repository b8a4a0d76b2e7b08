//! Transactional persistence for aggregates and their rows
//!
//! The ingestion pipeline talks to storage only through the traits in this
//! module. A [`ResultStore`] hands out [`StoreTransaction`]s; everything done
//! through a transaction becomes visible to other callers on `commit` and is
//! discarded on `rollback` or when the transaction is dropped.
//!
//! - [`memory`] - In-process store with optional JSON snapshot persistence
//! - [`filter`] - Predicates for aggregate queries

pub mod filter;
pub mod memory;

use std::future::Future;

use crate::Result;
use crate::app::models::{Aggregate, AggregateId, Row, StoredAggregate, StoredRow};

pub use filter::ResultFilter;
pub use memory::{MemoryStore, MemoryTransaction};

/// A store of aggregates and rows that supports transactions
pub trait ResultStore: Send + Sync {
    /// Unit of work bound to this store
    type Transaction<'a>: StoreTransaction + 'a
    where
        Self: 'a;

    /// Start a new unit of work
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction<'_>>> + Send;

    /// Committed aggregates matching `filter`, newest first
    fn list_results(
        &self,
        filter: &ResultFilter,
    ) -> impl Future<Output = Result<Vec<StoredAggregate>>> + Send;

    /// Up to `limit` committed rows of `file_name`, latest timestamp first
    ///
    /// Fails with `Error::NotFound` when the file has no stored rows.
    fn latest_rows(
        &self,
        file_name: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<StoredRow>>> + Send;
}

/// Operations available inside one unit of work
pub trait StoreTransaction: Send {
    /// The live aggregate for `file_name`, including changes staged in this transaction
    fn find_aggregate_by_file_name(
        &mut self,
        file_name: &str,
    ) -> impl Future<Output = Result<Option<StoredAggregate>>> + Send;

    /// Remove an aggregate and all of its rows; returns the number of rows removed
    fn delete_aggregate_cascade(
        &mut self,
        id: AggregateId,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Stage a new aggregate and return its identity
    fn insert_aggregate(
        &mut self,
        aggregate: Aggregate,
    ) -> impl Future<Output = Result<AggregateId>> + Send;

    /// Stage rows owned by `aggregate_id`; returns the number of rows staged
    fn insert_rows(
        &mut self,
        rows: Vec<Row>,
        aggregate_id: AggregateId,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Make all staged changes visible atomically
    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    /// Discard all staged changes
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
