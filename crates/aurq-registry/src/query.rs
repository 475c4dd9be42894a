use serde::{Deserialize, Serialize};

use crate::{error::Result, outcome::QueryOutcome, search_by::SearchBy};

/// A structured package query.
///
/// A package matches when any needle matches any of the fields selected by
/// `by`. With `contains` set the needle is matched as a substring (regular
/// expression) instead of by exact equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub needles: Vec<String>,
    pub by: SearchBy,
    pub contains: bool,
}

impl Query {
    pub fn new<I, S>(needles: I, by: SearchBy, contains: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            needles: needles.into_iter().map(Into::into).collect(),
            by,
            contains,
        }
    }

    /// Exact-match query on package names.
    pub fn exact<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(needles, SearchBy::Name, false)
    }

    /// Substring query using the service's default fields.
    pub fn contains<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(needles, SearchBy::None, true)
    }

    pub fn by(mut self, by: SearchBy) -> Self {
        self.by = by;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.needles.is_empty()
    }
}

/// Uniform entry point implemented by every resolver.
///
/// `Ok` carries whatever resolved plus any per-unit failures; callers must
/// inspect [`QueryOutcome::failures`]. `Err` is reserved for failures that
/// leave nothing to return.
///
/// Resolvers mutate internal caches, so `get` takes `&mut self`.
pub trait QueryClient {
    fn get(&mut self, query: &Query) -> Result<QueryOutcome>;
}

impl<T: QueryClient + ?Sized> QueryClient for Box<T> {
    fn get(&mut self, query: &Query) -> Result<QueryOutcome> {
        (**self).get(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let query = Query::exact(["yay", "paru"]);
        assert_eq!(query.needles, vec!["yay", "paru"]);
        assert_eq!(query.by, SearchBy::Name);
        assert!(!query.contains);

        let query = Query::contains(vec!["jack-audio".to_string()]).by(SearchBy::Provides);
        assert_eq!(query.by, SearchBy::Provides);
        assert!(query.contains);
        assert!(!query.is_empty());

        assert!(Query::default().is_empty());
    }
}
