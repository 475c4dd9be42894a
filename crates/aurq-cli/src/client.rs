use std::sync::Arc;

use aurq_config::{backend::Backend, config::Config};
use aurq_events::{EventSinkHandle, NullSink, TracingSink};
use aurq_registry::{
    CancelToken, ClientConfig, HttpSnapshotSource, QueryClient, RpcClient, SnapshotClient,
    UreqTransport,
};
use tracing::debug;
use ureq::{
    http::{HeaderMap, HeaderName, HeaderValue},
    Proxy,
};

use crate::{
    cli::Args,
    error::{CliError, CliResult},
    utils::split_header,
};

/// Everything needed to build a resolver, with command line flags applied
/// over the loaded configuration.
pub struct QueryContext {
    pub config: Config,
    pub backend: Backend,
    pub http: ClientConfig,
    pub events: EventSinkHandle,
    pub cancel: CancelToken,
}

impl QueryContext {
    pub fn new(args: &Args, config: Config, cancel: CancelToken) -> CliResult<Self> {
        let backend = match &args.backend {
            Some(backend) => backend.parse()?,
            None => config.get_backend(),
        };

        let mut config = config;
        if let Some(batch_size) = args.batch_size {
            config.batch_size = Some(batch_size);
        }

        let http = http_config(args, &config)?;

        let events: EventSinkHandle = if args.verbose > 0 {
            Arc::new(TracingSink)
        } else {
            Arc::new(NullSink)
        };

        Ok(Self {
            config,
            backend,
            http,
            events,
            cancel,
        })
    }

    pub fn rpc_client(&self) -> CliResult<RpcClient> {
        Ok(RpcClient::builder()
            .base_url(self.config.get_rpc_url())
            .client_config(self.http.clone())
            .batch_size(self.config.get_batch_size())
            .refine_multiplier(self.config.get_refine_multiplier())
            .events(self.events.clone())
            .cancel_token(self.cancel.clone())
            .build()?)
    }

    pub fn snapshot_client(&self) -> CliResult<SnapshotClient> {
        let cache_path = self.config.get_snapshot_path()?;
        debug!("Snapshot cache at {}", cache_path.display());

        let source = HttpSnapshotSource::new(self.config.get_snapshot_url())?
            .transport(Arc::new(UreqTransport::new(&self.http)))
            .cache_path(cache_path)
            .sync_interval(self.config.get_snapshot_sync_interval())
            .events(self.events.clone());

        Ok(SnapshotClient::new(source)
            .events(self.events.clone())
            .cancel_token(self.cancel.clone()))
    }

    /// Resolver for the selected backend.
    pub fn client(&self) -> CliResult<Box<dyn QueryClient + Send>> {
        Ok(match self.backend {
            Backend::Rpc => Box::new(self.rpc_client()?),
            Backend::Snapshot => Box::new(self.snapshot_client()?),
        })
    }
}

fn http_config(args: &Args, config: &Config) -> CliResult<ClientConfig> {
    let mut http = ClientConfig {
        timeout: config.get_timeout(),
        ..ClientConfig::default()
    };

    if let Some(user_agent) = args.user_agent.clone().or_else(|| config.user_agent.clone()) {
        http.user_agent = Some(user_agent);
    }

    if let Some(proxy) = args.proxy.as_deref() {
        let proxy = Proxy::new(proxy).map_err(|_| CliError::InvalidProxy(proxy.to_string()))?;
        http.proxy = Some(proxy);
    }

    if let Some(headers) = &args.header {
        http.headers = Some(parse_headers(headers)?);
    }

    Ok(http)
}

fn parse_headers(headers: &[String]) -> CliResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for header in headers {
        let invalid = || CliError::InvalidHeader(header.clone());
        let (key, value) = split_header(header).ok_or_else(invalid)?;
        let name: HeaderName = key.parse().map_err(|_| invalid())?;
        let value: HeaderValue = value.parse().map_err(|_| invalid())?;
        map.append(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn context(argv: &[&str]) -> CliResult<QueryContext> {
        QueryContext::new(
            &Args::parse_from(argv),
            Config::default_config(),
            CancelToken::new(),
        )
    }

    #[test]
    fn test_flags_override_config() {
        let ctx = context(&[
            "aurq",
            "--backend",
            "snapshot",
            "--batch-size",
            "10",
            "-A",
            "custom/2.0",
            "-H",
            "X-Token: abc",
            "search",
            "yay",
        ])
        .unwrap();

        assert_eq!(ctx.backend, Backend::Snapshot);
        assert_eq!(ctx.config.get_batch_size(), 10);
        assert_eq!(ctx.http.user_agent.as_deref(), Some("custom/2.0"));
        let headers = ctx.http.headers.unwrap();
        assert_eq!(headers.get("x-token").unwrap(), "abc");
        assert_eq!(ctx.http.timeout, Some(std::time::Duration::from_secs(30)));
    }

    #[test]
    fn test_defaults_from_config() {
        let ctx = context(&["aurq", "search", "yay"]).unwrap();
        assert_eq!(ctx.backend, Backend::Rpc);
        assert_eq!(ctx.config.get_batch_size(), 125);

        let client = ctx.rpc_client().unwrap();
        assert_eq!(client.base_url(), "https://aur.archlinux.org/rpc?");
        assert_eq!(client.batch_size(), 125);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            context(&["aurq", "--backend", "sqlite", "search", "yay"]),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            context(&["aurq", "-H", "missing-colon", "search", "yay"]),
            Err(CliError::InvalidHeader(_))
        ));
        assert!(matches!(
            context(&["aurq", "-H", "bad header: x", "search", "yay"]),
            Err(CliError::InvalidHeader(_))
        ));
    }
}
