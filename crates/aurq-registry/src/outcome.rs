//! Partial-success results.
//!
//! Batch operations keep going when a needle or a chunk fails. The records
//! that did resolve are returned together with one [`UnitFailure`] per
//! failed unit, in the order the units were attempted.

use std::fmt;

use crate::{
    error::{BatchError, RegistryError, Result},
    package::Package,
};

/// A unit of work inside a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// A single search request for one needle.
    Needle(String),
    /// A single info request for a chunk of names.
    Chunk { index: usize, names: Vec<String> },
    /// Loading the full snapshot.
    Snapshot,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Needle(needle) => write!(f, "needle `{needle}`"),
            Unit::Chunk { index, names } => {
                write!(
                    f,
                    "chunk #{index} ({} name{})",
                    names.len(),
                    if names.len() == 1 { "" } else { "s" }
                )
            }
            Unit::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// A failed unit and the error it failed with.
#[derive(Debug)]
pub struct UnitFailure {
    pub unit: Unit,
    pub error: RegistryError,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.unit, self.error)
    }
}

/// Records resolved by a query plus the units that failed.
///
/// `packages` is usable even when `failures` is not empty.
#[derive(Debug, Default)]
pub struct QueryOutcome {
    pub packages: Vec<Package>,
    pub failures: Vec<UnitFailure>,
}

impl QueryOutcome {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packages: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    /// True when every unit succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn push_failure(&mut self, unit: Unit, error: RegistryError) {
        self.failures.push(UnitFailure { unit, error });
    }

    /// Names of the resolved packages, in result order.
    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|pkg| pkg.name.as_str()).collect()
    }

    /// Converts into a plain `Result`, dropping the partial records when any
    /// unit failed.
    pub fn into_result(self) -> Result<Vec<Package>> {
        if self.failures.is_empty() {
            Ok(self.packages)
        } else {
            Err(RegistryError::Batch(BatchError {
                failures: self.failures,
            }))
        }
    }

    /// Splits into the records and the aggregated error, if any.
    pub fn into_parts(self) -> (Vec<Package>, Option<BatchError>) {
        let error = (!self.failures.is_empty()).then_some(BatchError {
            failures: self.failures,
        });
        (self.packages, error)
    }
}

impl From<Vec<Package>> for QueryOutcome {
    fn from(packages: Vec<Package>) -> Self {
        Self {
            packages,
            failures: Vec::new(),
        }
    }
}
