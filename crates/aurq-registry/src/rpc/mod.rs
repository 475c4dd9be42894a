//! Batched resolver backed by the remote RPC interface.
//!
//! Exact queries are answered with `info` requests, served from a per-client
//! cache where possible and chunked to respect the service's argument
//! limit. Containment queries issue one `search` request per needle; when
//! the hit count is small the hits are refined into full records with a
//! follow-up `info` batch.

mod request;
mod response;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use aurq_events::{next_query_id, null_sink, Backend, EventSinkHandle, QueryEvent, QueryId};
use tracing::debug;

pub use request::{build_request_url, normalize_base_url, RequestKind, DEFAULT_RPC_URL, RPC_VERSION};
pub use response::{parse_rpc_response, RpcResponse};

use crate::{
    cancel::CancelToken,
    error::{RegistryError, Result},
    http_client::{ClientConfig, Transport, UreqTransport},
    outcome::{QueryOutcome, Unit},
    package::Package,
    query::{Query, QueryClient},
    search_by::SearchBy,
};

/// Maximum number of names per `info` request.
pub const DEFAULT_BATCH_SIZE: usize = 125;

/// Containment queries with fewer than `batch_size * multiplier` hits are
/// refined with `info` requests.
pub const DEFAULT_REFINE_MULTIPLIER: usize = 4;

pub struct RpcClientBuilder {
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
    client_config: ClientConfig,
    batch_size: usize,
    refine_multiplier: usize,
    events: EventSinkHandle,
    cancel: CancelToken,
}

impl Default for RpcClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RPC_URL.to_string(),
            transport: None,
            client_config: ClientConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            refine_multiplier: DEFAULT_REFINE_MULTIPLIER,
            events: null_sink(),
            cancel: CancelToken::default(),
        }
    }
}

impl RpcClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Uses `transport` instead of a `ureq` agent built from the client
    /// configuration.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// `0` disables chunking and refinement.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn refine_multiplier(mut self, multiplier: usize) -> Self {
        self.refine_multiplier = multiplier;
        self
    }

    pub fn events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(self) -> Result<RpcClient> {
        let base_url = normalize_base_url(&self.base_url)?;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new(&self.client_config)));

        Ok(RpcClient {
            base_url,
            transport,
            batch_size: self.batch_size,
            refine_multiplier: self.refine_multiplier,
            cache: HashMap::new(),
            events: self.events,
            cancel: self.cancel,
        })
    }
}

/// Remote resolver with a per-client info cache.
///
/// The cache only grows; records are keyed by name and written by
/// successful `info` responses.
pub struct RpcClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    batch_size: usize,
    refine_multiplier: usize,
    cache: HashMap<String, Package>,
    events: EventSinkHandle,
    cancel: CancelToken,
}

impl RpcClient {
    pub fn builder() -> RpcClientBuilder {
        RpcClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn cached(&self, name: &str) -> Option<&Package> {
        self.cache.get(name)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Runs a single `search` request.
    pub fn search(&self, term: &str, by: SearchBy) -> Result<Vec<Package>> {
        self.request(next_query_id(), RequestKind::Search { term, by })
    }

    /// Runs a single `info` request for `names`, bypassing the cache.
    pub fn info(&self, names: &[String]) -> Result<Vec<Package>> {
        self.request(next_query_id(), RequestKind::Info { names })
    }

    /// One `search` per needle. Hits are concatenated without dedup.
    pub fn batch_search(&self, needles: &[String], by: SearchBy) -> QueryOutcome {
        self.batch_search_with(next_query_id(), needles, by)
    }

    /// Resolves `names` from the cache, fetching misses in chunks.
    pub fn batch_info(&mut self, names: &[String]) -> QueryOutcome {
        self.batch_info_with(next_query_id(), names)
    }

    fn request(&self, query_id: QueryId, kind: RequestKind<'_>) -> Result<Vec<Package>> {
        let url = build_request_url(&self.base_url, kind);
        debug!(url = url.as_str(), "rpc request");
        self.events.emit(QueryEvent::Request {
            query_id,
            url: url.clone(),
        });

        let resp = self.transport.get(&url, &self.cancel)?;
        let packages = parse_rpc_response(&resp)?;

        self.events.emit(QueryEvent::Response {
            query_id,
            url,
            results: packages.len(),
        });
        Ok(packages)
    }

    fn record_failure(
        &self,
        query_id: QueryId,
        outcome: &mut QueryOutcome,
        unit: Unit,
        error: RegistryError,
    ) {
        debug!(unit = %unit, error = %error, "unit failed");
        self.events.emit(QueryEvent::UnitFailed {
            query_id,
            unit: unit.to_string(),
            error: error.to_string(),
        });
        outcome.push_failure(unit, error);
    }

    fn batch_search_with(&self, query_id: QueryId, needles: &[String], by: SearchBy) -> QueryOutcome {
        let mut outcome = QueryOutcome::default();

        for needle in needles {
            let unit = Unit::Needle(needle.clone());
            if self.cancel.is_cancelled() {
                self.record_failure(query_id, &mut outcome, unit, RegistryError::Cancelled);
                break;
            }

            match self.request(query_id, RequestKind::Search { term: needle, by }) {
                Ok(packages) => outcome.packages.extend(packages),
                Err(err) => {
                    let interrupted = matches!(err, RegistryError::Cancelled);
                    self.record_failure(query_id, &mut outcome, unit, err);
                    if interrupted {
                        break;
                    }
                }
            }
        }

        outcome
    }

    fn batch_info_with(&mut self, query_id: QueryId, names: &[String]) -> QueryOutcome {
        let mut outcome = QueryOutcome::with_capacity(names.len());
        let mut misses = Vec::new();

        for name in names {
            match self.cache.get(name) {
                Some(pkg) => {
                    self.events.emit(QueryEvent::CacheHit {
                        query_id,
                        name: name.clone(),
                    });
                    outcome.packages.push(pkg.clone());
                }
                None => misses.push(name.clone()),
            }
        }

        if misses.is_empty() {
            return outcome;
        }

        let chunk_size = if self.batch_size == 0 {
            misses.len()
        } else {
            self.batch_size
        };

        for (index, chunk) in misses.chunks(chunk_size).enumerate() {
            let unit = Unit::Chunk {
                index,
                names: chunk.to_vec(),
            };
            if self.cancel.is_cancelled() {
                self.record_failure(query_id, &mut outcome, unit, RegistryError::Cancelled);
                break;
            }

            self.events.emit(QueryEvent::ChunkDispatched {
                query_id,
                index,
                size: chunk.len(),
            });

            match self.request(query_id, RequestKind::Info { names: chunk }) {
                Ok(packages) => {
                    for pkg in &packages {
                        self.cache.insert(pkg.name.clone(), pkg.clone());
                    }
                    outcome.packages.extend(packages);
                }
                Err(err) => {
                    let interrupted = matches!(err, RegistryError::Cancelled);
                    self.record_failure(query_id, &mut outcome, unit, err);
                    if interrupted {
                        break;
                    }
                }
            }
        }

        outcome
    }

    fn resolve_contains(&mut self, query_id: QueryId, query: &Query) -> QueryOutcome {
        let search = self.batch_search_with(query_id, &query.needles, query.by);

        let hits = search.packages.len();
        let threshold = self.batch_size.saturating_mul(self.refine_multiplier);
        let refine = self.batch_size != 0 && hits < threshold && !self.cancel.is_cancelled();

        self.events.emit(QueryEvent::Refinement {
            query_id,
            hits,
            threshold,
            refined: refine,
        });
        if !refine {
            return search;
        }

        let mut seen = HashSet::with_capacity(hits);
        let names: Vec<String> = search
            .packages
            .into_iter()
            .filter_map(|pkg| seen.insert(pkg.name.clone()).then_some(pkg.name))
            .collect();

        let info = self.batch_info_with(query_id, &names);
        let mut failures = search.failures;
        failures.extend(info.failures);

        QueryOutcome {
            packages: info.packages,
            failures,
        }
    }
}

impl QueryClient for RpcClient {
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
            backend: Backend::Rpc,
            needles: query.needles.len(),
            contains: query.contains,
        });

        let outcome = if query.contains {
            self.resolve_contains(query_id, query)
        } else {
            self.batch_info_with(query_id, &query.needles)
        };

        debug!(
            results = outcome.packages.len(),
            failures = outcome.failures.len(),
            "rpc query finished"
        );
        self.events.emit(QueryEvent::QueryFinished {
            query_id,
            results: outcome.packages.len(),
            failures: outcome.failures.len(),
        });

        Ok(outcome)
    }
}
