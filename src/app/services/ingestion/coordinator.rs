//! Ingestion pipeline orchestration
//!
//! This module contains the IngestionCoordinator, which runs one upload through
//! replace, parse, validate, aggregate and persist inside a single store
//! transaction.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::locks::FileLocks;
use super::stats::{IngestReport, IngestState};
use crate::app::models::{Aggregate, AggregateId};
use crate::app::services::aggregator::aggregate;
use crate::app::services::csv_parser::CsvParser;
use crate::app::services::validator::Validator;
use crate::app::store::{ResultStore, StoreTransaction};
use crate::config::IngestConfig;
use crate::{Error, Result};

/// Coordinates the ingestion of uploads into a result store
///
/// Each call to [`ingest`](Self::ingest) either commits exactly one aggregate
/// with its rows, replacing anything stored earlier under the same file name,
/// or leaves the store as it was.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use timeseries_ingest::{IngestConfig, IngestionCoordinator, MemoryStore};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> timeseries_ingest::Result<()> {
/// let store = Arc::new(MemoryStore::new());
/// let coordinator = IngestionCoordinator::new(store, IngestConfig::default())?;
///
/// let upload: &[u8] = b"Date;ExecutionTime;Value\n2024-01-15T10-30-45.1234Z;1.5;100.25\n";
/// let report = coordinator
///     .ingest(upload, "metrics.csv", &CancellationToken::new())
///     .await?;
/// assert_eq!(report.rows_persisted, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IngestionCoordinator<S> {
    store: Arc<S>,
    config: IngestConfig,
    parser: CsvParser,
    validator: Validator,
    locks: FileLocks,
}

/// What the pipeline staged before commit
struct StagedIngest {
    aggregate_id: AggregateId,
    aggregate: Aggregate,
    rows_persisted: usize,
    replaced_previous: bool,
}

impl<S: ResultStore> IngestionCoordinator<S> {
    /// Create a coordinator over `store`
    ///
    /// Fails if `config` is inconsistent.
    pub fn new(store: Arc<S>, config: IngestConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            parser: CsvParser::new(&config),
            validator: Validator::new(&config),
            store,
            config,
            locks: FileLocks::new(),
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one upload under `file_name`
    ///
    /// Ingestions of the same file name run one after another; different file
    /// names proceed concurrently. Any failure, including cancellation, rolls
    /// back the transaction and returns the first error encountered.
    pub async fn ingest<R>(
        &self,
        reader: R,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestReport>
    where
        R: AsyncRead + Unpin,
    {
        let started = Instant::now();
        let _lock = self.locks.acquire(file_name).await;

        let mut state = IngestState::Start;
        debug!("Ingestion of '{}' entered state {}", file_name, state);

        let mut tx = self.store.begin().await?;

        let staged = match self
            .run_pipeline(&mut tx, reader, file_name, cancel, &mut state)
            .await
        {
            Ok(staged) => staged,
            Err(e) => {
                Self::fail(file_name, state, &e);
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(
                        "Rollback of '{}' failed after {}: {}",
                        file_name, e, rollback_error
                    );
                }
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            Self::fail(file_name, state, &e);
            return Err(e);
        }
        state = IngestState::Committed;
        debug!("Ingestion of '{}' entered state {}", file_name, state);

        let report = IngestReport {
            file_name: file_name.to_string(),
            aggregate_id: staged.aggregate_id,
            rows_persisted: staged.rows_persisted,
            replaced_previous: staged.replaced_previous,
            aggregate: staged.aggregate,
            elapsed: started.elapsed(),
        };

        info!("Ingested {}", report.summary());
        Ok(report)
    }

    async fn run_pipeline<R>(
        &self,
        tx: &mut S::Transaction<'_>,
        reader: R,
        file_name: &str,
        cancel: &CancellationToken,
        state: &mut IngestState,
    ) -> Result<StagedIngest>
    where
        R: AsyncRead + Unpin,
    {
        let previous = tx.find_aggregate_by_file_name(file_name).await?;
        let replaced_previous = match previous {
            Some(existing) => {
                let removed = tx.delete_aggregate_cascade(existing.id).await?;
                debug!(
                    "Staged removal of aggregate {} for '{}' ({} rows)",
                    existing.id, file_name, removed
                );
                true
            }
            None => false,
        };
        Self::advance(file_name, state, IngestState::Replaced);

        let parsed = self.parser.parse_stream(reader, file_name, cancel).await?;
        let rows = parsed.rows;
        self.validator.validate(&rows)?;
        Self::advance(file_name, state, IngestState::Validated);

        let aggregate = aggregate(&rows, file_name, Utc::now())?;
        Self::advance(file_name, state, IngestState::Aggregated);

        if cancel.is_cancelled() {
            return Err(Error::cancelled(parsed.stats.records_read + 1));
        }

        let aggregate_id = tx.insert_aggregate(aggregate.clone()).await?;
        let rows_persisted = tx.insert_rows(rows, aggregate_id).await?;

        Ok(StagedIngest {
            aggregate_id,
            aggregate,
            rows_persisted,
            replaced_previous,
        })
    }

    fn advance(file_name: &str, state: &mut IngestState, next: IngestState) {
        debug!("Ingestion of '{}': {} -> {}", file_name, state, next);
        *state = next;
    }

    fn fail(file_name: &str, state: IngestState, error: &Error) {
        debug!(
            "Ingestion of '{}': {} -> {}",
            file_name,
            state,
            IngestState::Failed
        );
        if error.is_client_error() {
            info!("Rejected upload '{}': {}", file_name, error);
        } else {
            warn!("Ingestion of '{}' failed: {}", file_name, error);
        }
    }
}
