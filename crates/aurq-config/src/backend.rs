use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Resolver used to answer queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Live requests against the RPC interface.
    #[default]
    Rpc,
    /// Scans of the full metadata dump.
    Snapshot,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rpc" => Ok(Backend::Rpc),
            "snapshot" => Ok(Backend::Snapshot),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Rpc => f.write_str("rpc"),
            Backend::Snapshot => f.write_str("snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("rpc".parse::<Backend>().unwrap(), Backend::Rpc);
        assert_eq!("Snapshot".parse::<Backend>().unwrap(), Backend::Snapshot);
        assert!(matches!(
            "sqlite".parse::<Backend>(),
            Err(ConfigError::InvalidBackend(_))
        ));
        assert_eq!(Backend::Snapshot.to_string(), "snapshot");
    }
}
