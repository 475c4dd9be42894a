//! Package metadata query resolution.
//!
//! A [`Query`] (needles, a [`SearchBy`] field selector and an exact or
//! containment flag) is resolved by one of two interchangeable clients,
//! both implementing [`QueryClient`]:
//!
//! - [`RpcClient`] talks to the RPC interface, batching `info` requests,
//!   caching records by name and refining `search` hits.
//! - [`SnapshotClient`] compiles the query into a predicate and scans a
//!   full metadata dump held in memory.
//!
//! Both return a [`QueryOutcome`]: the records that resolved plus one
//! [`UnitFailure`] per needle or chunk that did not.
//!
//! # Example
//!
//! ```no_run
//! use aurq_registry::{Query, QueryClient, RpcClient, SearchBy};
//!
//! fn find_helpers() -> aurq_registry::Result<()> {
//!     let mut client = RpcClient::builder().batch_size(100).build()?;
//!     let outcome = client.get(&Query::contains(["yay"]).by(SearchBy::Name))?;
//!     for pkg in &outcome.packages {
//!         println!("{} {}", pkg.name, pkg.version);
//!     }
//!     for failure in &outcome.failures {
//!         eprintln!("{failure}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod error;
pub mod http_client;
pub mod outcome;
pub mod package;
pub mod pattern;
pub mod query;
pub mod rpc;
pub mod search_by;
pub mod snapshot;

#[cfg(test)]
mod test_utils;

pub use cancel::CancelToken;
pub use error::{BatchError, ErrorContext, RegistryError, Result};
pub use http_client::{ClientConfig, HttpResponse, Transport, UreqTransport};
pub use outcome::{QueryOutcome, Unit, UnitFailure};
pub use package::Package;
pub use pattern::CompiledQuery;
pub use query::{Query, QueryClient};
pub use rpc::{RpcClient, RpcClientBuilder, DEFAULT_BATCH_SIZE, DEFAULT_REFINE_MULTIPLIER, DEFAULT_RPC_URL};
pub use search_by::SearchBy;
pub use snapshot::{
    FileSnapshotSource, HttpSnapshotSource, SnapshotClient, SnapshotSource, StaticSnapshotSource,
    DEFAULT_SNAPSHOT_URL,
};
