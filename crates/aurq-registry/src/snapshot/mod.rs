//! Resolver that evaluates queries against a full in-memory snapshot.

mod source;

use std::collections::HashSet;

use aurq_events::{next_query_id, null_sink, Backend, EventSinkHandle, QueryEvent, SnapshotStage};
use tracing::debug;

pub use source::{
    parse_snapshot, FileSnapshotSource, HttpSnapshotSource, SnapshotSource, StaticSnapshotSource,
    DEFAULT_SNAPSHOT_URL, ZST_MAGIC_BYTES,
};

use crate::{
    cancel::CancelToken,
    error::{RegistryError, Result},
    outcome::QueryOutcome,
    package::Package,
    pattern::CompiledQuery,
    query::{Query, QueryClient},
};

/// Snapshot-backed resolver.
///
/// The snapshot is loaded lazily on the first non-empty query and kept
/// until [`SnapshotClient::invalidate`] or [`SnapshotClient::refresh`].
pub struct SnapshotClient {
    source: Box<dyn SnapshotSource>,
    snapshot: Option<Vec<Package>>,
    events: EventSinkHandle,
    cancel: CancelToken,
}

impl SnapshotClient {
    pub fn new<S: SnapshotSource + 'static>(source: S) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn SnapshotSource>) -> Self {
        Self {
            source,
            snapshot: None,
            events: null_sink(),
            cancel: CancelToken::default(),
        }
    }

    pub fn events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Number of loaded records, `0` when nothing is loaded.
    pub fn len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads the snapshot unless it is already in memory.
    pub fn load(&mut self) -> Result<&[Package]> {
        if self.snapshot.is_none() {
            let packages = self.source.load(&self.cancel)?;
            self.store(packages);
        }
        Ok(self.snapshot.as_deref().unwrap_or_default())
    }

    /// Reloads the snapshot from its source, bypassing any local copy.
    ///
    /// The previous snapshot is kept when reloading fails.
    pub fn refresh(&mut self) -> Result<usize> {
        let packages = self.source.reload(&self.cancel)?;
        self.store(packages);
        Ok(self.len())
    }

    /// Drops the loaded snapshot; the next query reloads it.
    pub fn invalidate(&mut self) {
        if self.snapshot.take().is_some() {
            self.events.emit(QueryEvent::Snapshot {
                stage: SnapshotStage::Invalidated,
            });
        }
    }

    fn store(&mut self, packages: Vec<Package>) {
        debug!(
            source = %self.source.describe(),
            packages = packages.len(),
            "snapshot loaded"
        );
        self.events.emit(QueryEvent::Snapshot {
            stage: SnapshotStage::Loaded {
                packages: packages.len(),
            },
        });
        self.snapshot = Some(packages);
    }
}

impl QueryClient for SnapshotClient {
    fn get(&mut self, query: &Query) -> Result<QueryOutcome> {
        if query.is_empty() {
            return Ok(QueryOutcome::default());
        }
        if self.cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        let query_id = next_query_id();
        self.events.emit(QueryEvent::QueryStarted {
            query_id,
            backend: Backend::Snapshot,
            needles: query.needles.len(),
            contains: query.contains,
        });

        let compiled = CompiledQuery::compile(query)?;
        self.events.emit(QueryEvent::PatternCompiled {
            query_id,
            pattern: compiled.to_string(),
        });

        let events = self.events.clone();
        let snapshot = self.load()?;

        let mut seen = HashSet::new();
        let packages: Vec<Package> = snapshot
            .iter()
            .filter(|pkg| compiled.matches(pkg) && seen.insert(pkg.name.as_str()))
            .cloned()
            .collect();

        debug!(pattern = %compiled, results = packages.len(), "snapshot query finished");
        events.emit(QueryEvent::QueryFinished {
            query_id,
            results: packages.len(),
            failures: 0,
        });

        Ok(QueryOutcome::from(packages))
    }
}
