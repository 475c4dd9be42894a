use std::time::Duration;

use tracing::trace;
use ureq::{http::HeaderMap, Agent, Proxy};

use crate::{
    cancel::CancelToken,
    error::{RegistryError, Result},
};

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("aurq/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub headers: Option<HeaderMap>,
    pub proxy: Option<Proxy>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    /// Sets the `aurq/<version>` user agent and leaves proxy, headers and
    /// timeout unset.
    fn default() -> Self {
        Self {
            user_agent: Some(DEFAULT_USER_AGENT.into()),
            proxy: None,
            headers: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Builds an `Agent` from this configuration.
    ///
    /// HTTP error statuses are returned as regular responses so the caller
    /// can map them itself.
    pub fn build(&self) -> Agent {
        let mut config = Agent::config_builder()
            .http_status_as_error(false)
            .proxy(self.proxy.clone())
            .timeout_global(self.timeout);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

/// Status code and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests on behalf of the resolvers.
///
/// Any status code is a successful transport result; only network-level
/// failures are errors. A request still running when the token's deadline
/// passes fails with [`RegistryError::Cancelled`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, cancel: &CancelToken) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    headers: Option<HeaderMap>,
    timeout: Option<Duration>,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            agent: config.build(),
            headers: config.headers.clone(),
            timeout: config.timeout,
        }
    }

    /// The agent timeout, shortened to what is left on the token.
    fn request_timeout(&self, cancel: &CancelToken) -> Option<Duration> {
        match (self.timeout, cancel.remaining()) {
            (Some(timeout), Some(left)) => Some(timeout.min(left)),
            (timeout, left) => timeout.or(left),
        }
    }
}

fn map_error(err: ureq::Error, cancel: &CancelToken) -> RegistryError {
    match err {
        ureq::Error::Timeout(_) if cancel.is_cancelled() => RegistryError::Cancelled,
        err => err.into(),
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, cancel: &CancelToken) -> Result<HttpResponse> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        let mut req = self
            .agent
            .get(url)
            .config()
            .timeout_global(self.request_timeout(cancel))
            .build();
        if let Some(headers) = &self.headers {
            for (key, value) in headers.iter() {
                req = req.header(key, value);
            }
        }

        let resp = req.call().map_err(|err| map_error(err, cancel))?;
        let status = resp.status().as_u16();

        // Snapshot dumps exceed the default body limit.
        let body = resp
            .into_body()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|err| map_error(err, cancel))?;

        trace!(url = url, status = status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}
