use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Which package field(s) a needle is matched against.
///
/// The set is closed: values coming from outside the program (numeric
/// codes, strings) are converted with [`TryFrom<i32>`] or [`FromStr`] and
/// rejected with [`RegistryError::InvalidSelector`] when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SearchBy {
    Name,
    NameDesc,
    Maintainer,
    Submitter,
    Depends,
    MakeDepends,
    OptDepends,
    CheckDepends,
    /// Service default (name and description).
    #[default]
    None,
    Provides,
    Conflicts,
    Replaces,
    Keywords,
    Groups,
    CoMaintainers,
}

impl SearchBy {
    pub const ALL: [SearchBy; 15] = [
        SearchBy::Name,
        SearchBy::NameDesc,
        SearchBy::Maintainer,
        SearchBy::Submitter,
        SearchBy::Depends,
        SearchBy::MakeDepends,
        SearchBy::OptDepends,
        SearchBy::CheckDepends,
        SearchBy::None,
        SearchBy::Provides,
        SearchBy::Conflicts,
        SearchBy::Replaces,
        SearchBy::Keywords,
        SearchBy::Groups,
        SearchBy::CoMaintainers,
    ];

    /// Value of the `by` request parameter. Empty for [`SearchBy::None`].
    pub fn as_str(self) -> &'static str {
        match self {
            SearchBy::Name => "name",
            SearchBy::NameDesc => "name-desc",
            SearchBy::Maintainer => "maintainer",
            SearchBy::Submitter => "submitter",
            SearchBy::Depends => "depends",
            SearchBy::MakeDepends => "makedepends",
            SearchBy::OptDepends => "optdepends",
            SearchBy::CheckDepends => "checkdepends",
            SearchBy::None => "",
            SearchBy::Provides => "provides",
            SearchBy::Conflicts => "conflicts",
            SearchBy::Replaces => "replaces",
            SearchBy::Keywords => "keywords",
            SearchBy::Groups => "groups",
            SearchBy::CoMaintainers => "comaintainers",
        }
    }

    /// Stable numeric code, starting at 1.
    pub fn code(self) -> i32 {
        match self {
            SearchBy::Name => 1,
            SearchBy::NameDesc => 2,
            SearchBy::Maintainer => 3,
            SearchBy::Submitter => 4,
            SearchBy::Depends => 5,
            SearchBy::MakeDepends => 6,
            SearchBy::OptDepends => 7,
            SearchBy::CheckDepends => 8,
            SearchBy::None => 9,
            SearchBy::Provides => 10,
            SearchBy::Conflicts => 11,
            SearchBy::Replaces => 12,
            SearchBy::Keywords => 13,
            SearchBy::Groups => 14,
            SearchBy::CoMaintainers => 15,
        }
    }
}

impl TryFrom<i32> for SearchBy {
    type Error = RegistryError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        SearchBy::ALL
            .into_iter()
            .find(|by| by.code() == code)
            .ok_or_else(|| RegistryError::InvalidSelector(code.to_string()))
    }
}

impl FromStr for SearchBy {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "default" => Ok(SearchBy::None),
            "namedesc" => Ok(SearchBy::NameDesc),
            value => {
                SearchBy::ALL
                    .into_iter()
                    .find(|by| by.as_str() == value)
                    .ok_or_else(|| RegistryError::InvalidSelector(s.to_string()))
            }
        }
    }
}

impl TryFrom<String> for SearchBy {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SearchBy> for String {
    fn from(by: SearchBy) -> Self {
        by.as_str().to_string()
    }
}

impl fmt::Display for SearchBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings() {
        let cases = [
            (SearchBy::Name, "name"),
            (SearchBy::NameDesc, "name-desc"),
            (SearchBy::Maintainer, "maintainer"),
            (SearchBy::Submitter, "submitter"),
            (SearchBy::Depends, "depends"),
            (SearchBy::MakeDepends, "makedepends"),
            (SearchBy::OptDepends, "optdepends"),
            (SearchBy::CheckDepends, "checkdepends"),
            (SearchBy::None, ""),
            (SearchBy::Provides, "provides"),
            (SearchBy::Conflicts, "conflicts"),
            (SearchBy::Replaces, "replaces"),
            (SearchBy::Keywords, "keywords"),
            (SearchBy::Groups, "groups"),
            (SearchBy::CoMaintainers, "comaintainers"),
        ];

        for (by, expected) in cases {
            assert_eq!(by.as_str(), expected);
            assert_eq!(by.to_string(), expected);
            assert_eq!(expected.parse::<SearchBy>().unwrap(), by);
        }
    }

    #[test]
    fn test_codes() {
        for by in SearchBy::ALL {
            assert_eq!(SearchBy::try_from(by.code()).unwrap(), by);
        }
        assert_eq!(SearchBy::try_from(1).unwrap(), SearchBy::Name);
        assert_eq!(SearchBy::try_from(9).unwrap(), SearchBy::None);
    }

    #[test]
    fn test_out_of_range_code_is_rejected() {
        for code in [-10, 0, 16, 23] {
            let err = SearchBy::try_from(code).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidSelector(ref v) if v == &code.to_string()));
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert!(matches!(
            "description".parse::<SearchBy>(),
            Err(RegistryError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_aliases() {
        assert_eq!("NAME".parse::<SearchBy>().unwrap(), SearchBy::Name);
        assert_eq!("none".parse::<SearchBy>().unwrap(), SearchBy::None);
        assert_eq!("namedesc".parse::<SearchBy>().unwrap(), SearchBy::NameDesc);
        assert_eq!(SearchBy::default(), SearchBy::None);
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&SearchBy::MakeDepends).unwrap();
        assert_eq!(json, "\"makedepends\"");
        let by: SearchBy = serde_json::from_str("\"provides\"").unwrap();
        assert_eq!(by, SearchBy::Provides);
        assert!(serde_json::from_str::<SearchBy>("\"bogus\"").is_err());
    }
}
