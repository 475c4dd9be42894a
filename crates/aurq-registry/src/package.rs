//! Package metadata as served by the RPC interface and the snapshot dump.
//!
//! Both sources share one wire shape. The decoder is lenient in the same
//! places the service is inconsistent: optional strings may be `null`,
//! missing or empty, list fields may be `null` or missing, and the
//! out-of-date timestamp may be `null`, a number or a numeric string.

use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};

fn empty_is_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.is_empty()))
}

fn null_is_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(list.unwrap_or_default())
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OptTimestampVisitor;

    impl<'de> Visitor<'de> for OptTimestampVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a unix timestamp, numeric string, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::custom("timestamp out of range"))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_empty() {
                return Ok(None);
            }
            v.parse::<i64>()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(OptTimestampVisitor)
}

/// A package record.
///
/// `name` is the natural key. Records are never mutated after decoding;
/// result lists hold clones.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    #[serde(rename = "ID", default)]
    pub id: u64,

    pub name: String,

    #[serde(rename = "PackageBaseID", default)]
    pub package_base_id: u64,

    #[serde(default)]
    pub package_base: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub description: Option<String>,

    #[serde(rename = "URL", default, deserialize_with = "empty_is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub num_votes: u64,

    #[serde(default)]
    pub popularity: f64,

    #[serde(default, deserialize_with = "optional_timestamp")]
    pub out_of_date: Option<i64>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub maintainer: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub submitter: Option<String>,

    #[serde(default)]
    pub first_submitted: i64,

    #[serde(default)]
    pub last_modified: i64,

    #[serde(rename = "URLPath", default, deserialize_with = "empty_is_none")]
    pub url_path: Option<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub depends: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub make_depends: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub check_depends: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub opt_depends: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub conflicts: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub provides: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub replaces: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub groups: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub license: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, deserialize_with = "null_is_empty")]
    pub co_maintainers: Vec<String>,
}

impl Package {
    /// Packages without a maintainer are orphaned.
    pub fn is_orphan(&self) -> bool {
        self.maintainer.is_none()
    }

    pub fn is_out_of_date(&self) -> bool {
        self.out_of_date.is_some()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_deserialization() {
        let json = r#"{
            "ID": 229417,
            "Name": "cower",
            "PackageBaseID": 44921,
            "PackageBase": "cower",
            "Version": "14-2",
            "Description": "A simple AUR agent with a pretentious name",
            "URL": "http:\/\/github.com\/falconindy\/cower",
            "NumVotes": 590,
            "Popularity": 24.595536,
            "OutOfDate": null,
            "Maintainer": "falconindy",
            "Submitter": "someone",
            "FirstSubmitted": 1293676237,
            "LastModified": 1441804093,
            "URLPath": "\/cgit\/aur.git\/snapshot\/cower.tar.gz",
            "Depends": ["curl", "openssl", "pacman", "yajl"],
            "MakeDepends": ["perl"],
            "License": ["MIT"],
            "Keywords": []
        }"#;

        let pkg: Package = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.id, 229417);
        assert_eq!(pkg.name, "cower");
        assert_eq!(pkg.package_base_id, 44921);
        assert_eq!(pkg.url.as_deref(), Some("http://github.com/falconindy/cower"));
        assert_eq!(pkg.num_votes, 590);
        assert_eq!(pkg.out_of_date, None);
        assert_eq!(pkg.depends, vec!["curl", "openssl", "pacman", "yajl"]);
        assert_eq!(pkg.make_depends, vec!["perl"]);
        assert!(pkg.provides.is_empty());
        assert!(pkg.keywords.is_empty());
        assert_eq!(pkg.to_string(), "cower");
    }

    #[test]
    fn test_orphan_and_nulls() {
        let json = r#"{
            "Name": "orphaned",
            "Maintainer": null,
            "Description": "",
            "Provides": null,
            "OutOfDate": 1700000000
        }"#;

        let pkg: Package = serde_json::from_str(json).unwrap();
        assert!(pkg.is_orphan());
        assert!(pkg.description.is_none());
        assert!(pkg.provides.is_empty());
        assert!(pkg.is_out_of_date());
        assert_eq!(pkg.out_of_date, Some(1700000000));
    }

    #[test]
    fn test_out_of_date_as_string() {
        let pkg: Package =
            serde_json::from_str(r#"{"Name": "x", "OutOfDate": "1600000000"}"#).unwrap();
        assert_eq!(pkg.out_of_date, Some(1600000000));

        let pkg: Package = serde_json::from_str(r#"{"Name": "x", "OutOfDate": ""}"#).unwrap();
        assert_eq!(pkg.out_of_date, None);

        assert!(serde_json::from_str::<Package>(r#"{"Name": "x", "OutOfDate": "soon"}"#).is_err());
    }

    #[test]
    fn test_name_is_required() {
        assert!(serde_json::from_str::<Package>(r#"{"Version": "1-1"}"#).is_err());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let pkg: Package =
            serde_json::from_str(r#"{"Name": "x", "Something": [1, 2, 3]}"#).unwrap();
        assert_eq!(pkg.name, "x");
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let pkg = Package {
            id: 1,
            name: "yay".to_string(),
            url_path: Some("/cgit/aur.git/snapshot/yay.tar.gz".to_string()),
            co_maintainers: vec!["someone".to_string()],
            ..Default::default()
        };
        let value = serde_json::to_value(&pkg).unwrap();
        assert_eq!(value["ID"], 1);
        assert_eq!(value["Name"], "yay");
        assert_eq!(value["URLPath"], "/cgit/aur.git/snapshot/yay.tar.gz");
        assert_eq!(value["CoMaintainers"][0], "someone");
    }
}
