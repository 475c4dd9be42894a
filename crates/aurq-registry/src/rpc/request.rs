use url::{form_urlencoded, Url};

use crate::{
    error::{RegistryError, Result},
    search_by::SearchBy,
};

/// Default RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://aur.archlinux.org/rpc?";

/// Protocol version sent with every request.
pub const RPC_VERSION: &str = "5";

/// Ensures `base` ends in `rpc?`, adding a `/` separator when missing.
///
/// The result must still parse as an absolute URL.
pub fn normalize_base_url(base: &str) -> Result<String> {
    let mut base = base.trim().to_string();
    if !base.ends_with("rpc?") {
        if !base.ends_with('/') {
            base.push('/');
        }
        base.push_str("rpc?");
    }

    Url::parse(&base).map_err(|err| RegistryError::InvalidUrl(format!("{base}: {err}")))?;
    Ok(base)
}

/// Request kinds understood by the RPC interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind<'a> {
    Search { term: &'a str, by: SearchBy },
    Info { names: &'a [String] },
}

/// Builds the full request URL for `kind` against a normalized `base`.
///
/// Parameters are sorted by key, keeping repeated `arg[]` values in input
/// order, and always carry `v=5`.
pub fn build_request_url(base: &str, kind: RequestKind<'_>) -> String {
    let mut params: Vec<(&str, &str)> = Vec::new();
    match kind {
        RequestKind::Search { term, by } => {
            params.push(("type", "search"));
            params.push(("arg", term));
            if by != SearchBy::None {
                params.push(("by", by.as_str()));
            }
        }
        RequestKind::Info { names } => {
            params.push(("type", "info"));
            params.extend(names.iter().map(|name| ("arg[]", name.as_str())));
        }
    }
    params.push(("v", RPC_VERSION));
    params.sort_by_key(|(key, _)| *key);

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{base}{query}")
}
