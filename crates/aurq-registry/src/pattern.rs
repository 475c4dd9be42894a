//! Compilation of a [`Query`] into a predicate over [`Package`] records.
//!
//! Each selector maps to a fixed set of fields. A compiled query is a flat
//! list of `(field, matcher)` terms; a record matches when any term does.
//! Regular expressions are compiled once, so evaluating the predicate over
//! a full snapshot performs no per-record allocation.

use std::fmt;

use regex::Regex;

use crate::{
    error::{RegistryError, Result},
    package::Package,
    query::Query,
    search_by::SearchBy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
    Maintainer,
    Submitter,
    Depends,
    MakeDepends,
    OptDepends,
    CheckDepends,
    Provides,
    Conflicts,
    Replaces,
    Keywords,
    Groups,
    CoMaintainers,
}

enum FieldValue<'a> {
    Scalar(Option<&'a str>),
    List(&'a [String]),
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Maintainer => "maintainer",
            Field::Submitter => "submitter",
            Field::Depends => "depends",
            Field::MakeDepends => "makedepends",
            Field::OptDepends => "optdepends",
            Field::CheckDepends => "checkdepends",
            Field::Provides => "provides",
            Field::Conflicts => "conflicts",
            Field::Replaces => "replaces",
            Field::Keywords => "keywords",
            Field::Groups => "groups",
            Field::CoMaintainers => "comaintainers",
        }
    }

    fn is_list(self) -> bool {
        !matches!(
            self,
            Field::Name | Field::Description | Field::Maintainer | Field::Submitter
        )
    }

    fn value(self, pkg: &Package) -> FieldValue<'_> {
        match self {
            Field::Name => FieldValue::Scalar(Some(&pkg.name)),
            Field::Description => FieldValue::Scalar(pkg.description.as_deref()),
            Field::Maintainer => FieldValue::Scalar(pkg.maintainer.as_deref()),
            Field::Submitter => FieldValue::Scalar(pkg.submitter.as_deref()),
            Field::Depends => FieldValue::List(&pkg.depends),
            Field::MakeDepends => FieldValue::List(&pkg.make_depends),
            Field::OptDepends => FieldValue::List(&pkg.opt_depends),
            Field::CheckDepends => FieldValue::List(&pkg.check_depends),
            Field::Provides => FieldValue::List(&pkg.provides),
            Field::Conflicts => FieldValue::List(&pkg.conflicts),
            Field::Replaces => FieldValue::List(&pkg.replaces),
            Field::Keywords => FieldValue::List(&pkg.keywords),
            Field::Groups => FieldValue::List(&pkg.groups),
            Field::CoMaintainers => FieldValue::List(&pkg.co_maintainers),
        }
    }
}

/// Fields consulted by `by`.
///
/// `Provides` consults `name` and `provides` in containment mode but only
/// `provides` in exact mode, so a package named after the needle without
/// listing it in `provides` does not match an exact lookup.
fn fields(by: SearchBy, contains: bool) -> &'static [Field] {
    match by {
        SearchBy::Name => &[Field::Name],
        SearchBy::NameDesc | SearchBy::None => &[Field::Name, Field::Description],
        SearchBy::Provides if contains => &[Field::Name, Field::Provides],
        SearchBy::Provides => &[Field::Provides],
        SearchBy::Maintainer => &[Field::Maintainer],
        SearchBy::Submitter => &[Field::Submitter],
        SearchBy::Depends => &[Field::Depends],
        SearchBy::MakeDepends => &[Field::MakeDepends],
        SearchBy::OptDepends => &[Field::OptDepends],
        SearchBy::CheckDepends => &[Field::CheckDepends],
        SearchBy::Conflicts => &[Field::Conflicts],
        SearchBy::Replaces => &[Field::Replaces],
        SearchBy::Keywords => &[Field::Keywords],
        SearchBy::Groups => &[Field::Groups],
        SearchBy::CoMaintainers => &[Field::CoMaintainers],
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Regex(Regex),
}

impl Matcher {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Matcher::Exact(needle) => needle == value,
            Matcher::Regex(re) => re.is_match(value),
        }
    }
}

#[derive(Debug, Clone)]
struct Term {
    field: Field,
    matcher: Matcher,
}

impl Term {
    fn matches(&self, pkg: &Package) -> bool {
        match self.field.value(pkg) {
            FieldValue::Scalar(value) => value.is_some_and(|v| self.matcher.is_match(v)),
            FieldValue::List(values) => values.iter().any(|v| self.matcher.is_match(v)),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.field.is_list() { "[]" } else { "" };
        match &self.matcher {
            Matcher::Exact(needle) => write!(f, "{}{suffix} == {needle:?}", self.field.label()),
            Matcher::Regex(re) => write!(f, "{}{suffix} ~ /{}/", self.field.label(), re.as_str()),
        }
    }
}

/// A query compiled into a reusable predicate.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    terms: Vec<Term>,
}

impl CompiledQuery {
    /// Compiles `query`.
    ///
    /// Fails with [`RegistryError::InvalidPattern`] when a needle of a
    /// containment query is not a valid regular expression.
    pub fn compile(query: &Query) -> Result<Self> {
        let fields = fields(query.by, query.contains);
        let mut terms = Vec::with_capacity(query.needles.len() * fields.len());

        for needle in &query.needles {
            let regex = if query.contains {
                Some(Regex::new(needle).map_err(|source| {
                    RegistryError::InvalidPattern {
                        pattern: needle.clone(),
                        source,
                    }
                })?)
            } else {
                None
            };

            for &field in fields {
                // Provides entries are capability names and always compare exactly.
                let matcher = match &regex {
                    Some(re) if field != Field::Provides => Matcher::Regex(re.clone()),
                    _ => Matcher::Exact(needle.clone()),
                };
                terms.push(Term { field, matcher });
            }
        }

        Ok(Self { terms })
    }

    pub fn matches(&self, pkg: &Package) -> bool {
        self.terms.iter().any(|term| term.matches(pkg))
    }

    /// True when no record can match.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("false");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}
