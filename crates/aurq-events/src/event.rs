use crate::QueryId;

/// All events emitted while resolving a query.
///
/// Events are purely observational: sinks must never influence how a
/// query is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// A query started resolving.
    QueryStarted {
        query_id: QueryId,
        backend: Backend,
        needles: usize,
        contains: bool,
    },
    /// A query was compiled into a predicate for a snapshot scan.
    PatternCompiled { query_id: QueryId, pattern: String },
    /// A request is about to be sent to the remote service.
    Request { query_id: QueryId, url: String },
    /// A request completed and was decoded.
    Response {
        query_id: QueryId,
        url: String,
        results: usize,
    },
    /// A name was served from the info cache.
    CacheHit { query_id: QueryId, name: String },
    /// An info chunk is being dispatched.
    ChunkDispatched {
        query_id: QueryId,
        index: usize,
        size: usize,
    },
    /// A single needle or chunk failed; siblings keep going.
    UnitFailed {
        query_id: QueryId,
        unit: String,
        error: String,
    },
    /// Decision on whether search hits are refined through info requests.
    Refinement {
        query_id: QueryId,
        hits: usize,
        threshold: usize,
        refined: bool,
    },
    /// Snapshot lifecycle.
    Snapshot { stage: SnapshotStage },
    /// A query finished resolving.
    QueryFinished {
        query_id: QueryId,
        results: usize,
        failures: usize,
    },
}

/// Which resolver produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Rpc,
    Snapshot,
}

/// Snapshot loading stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStage {
    /// Reusing an on-disk copy that is still within its sync interval.
    ReusingCache { path: String },
    /// Downloading a fresh copy.
    Fetching { url: String },
    /// Snapshot is in memory.
    Loaded { packages: usize },
    /// Loaded snapshot was dropped.
    Invalidated,
}

impl QueryEvent {
    /// Identifier of the query this event belongs to, if any.
    pub fn query_id(&self) -> Option<QueryId> {
        match self {
            QueryEvent::QueryStarted { query_id, .. }
            | QueryEvent::PatternCompiled { query_id, .. }
            | QueryEvent::Request { query_id, .. }
            | QueryEvent::Response { query_id, .. }
            | QueryEvent::CacheHit { query_id, .. }
            | QueryEvent::ChunkDispatched { query_id, .. }
            | QueryEvent::UnitFailed { query_id, .. }
            | QueryEvent::Refinement { query_id, .. }
            | QueryEvent::QueryFinished { query_id, .. } => Some(*query_id),
            QueryEvent::Snapshot { .. } => None,
        }
    }
}
