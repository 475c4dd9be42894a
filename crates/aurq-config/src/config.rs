use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, PoisonError, RwLock},
    time::Duration,
};

use aurq_registry::{
    rpc::normalize_base_url, SearchBy, DEFAULT_BATCH_SIZE, DEFAULT_REFINE_MULTIPLIER,
    DEFAULT_RPC_URL, DEFAULT_SNAPSHOT_URL,
};
use aurq_utils::{
    path::{resolve_path, xdg_cache_home, xdg_config_home},
    time::{parse_interval, parse_timeout},
};
use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::info;
use url::Url;

use crate::{
    annotations::annotate_toml_table,
    backend::Backend,
    error::{ConfigError, Result},
};

const DEFAULT_SYNC_INTERVAL: &str = "1d";
const DEFAULT_TIMEOUT: &str = "30s";
const SNAPSHOT_FILE_NAME: &str = "packages-meta-ext-v1.json";

/// aurq configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Resolver used to answer queries: `rpc` or `snapshot`.
    /// Default: rpc
    pub backend: Option<Backend>,

    /// Base URL of the RPC interface. `rpc?` is appended when missing.
    /// Default: https://aur.archlinux.org/rpc?
    pub rpc_url: Option<String>,

    /// Maximum number of names per info request. 0 sends all names in
    /// one request and disables refinement of search results.
    /// Default: 125
    pub batch_size: Option<usize>,

    /// Search results are refined with info requests while there are
    /// fewer than `batch_size * refine_multiplier` hits. Must be at least 1.
    /// Default: 4
    pub refine_multiplier: Option<usize>,

    /// URL of the full metadata dump used by the snapshot backend.
    /// Default: https://aur.archlinux.org/packages-meta-ext-v1.json.gz
    pub snapshot_url: Option<String>,

    /// Where the downloaded metadata dump is kept. `AURQ_SNAPSHOT`
    /// overrides it.
    /// Default: $XDG_CACHE_HOME/aurq/packages-meta-ext-v1.json
    pub snapshot_path: Option<String>,

    /// How long a downloaded dump is reused before fetching a new one.
    /// Accepts durations like `12h` or `1d`, `always` or `never`.
    /// Default: 1d
    pub snapshot_sync_interval: Option<String>,

    /// Timeout for a whole HTTP request, e.g. `30s`. `0s` disables it.
    /// Default: 30s
    pub timeout: Option<String>,

    /// User agent sent with every request.
    /// Default: aurq/<version>
    pub user_agent: Option<String>,

    /// Field selector used when none is given on the command line.
    /// Default: name-desc
    pub default_search_by: Option<String>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("AURQ_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("aurq").join("config.toml"),
    })
});

pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn set_config_path(path: PathBuf) {
    *CONFIG_PATH.write().unwrap_or_else(PoisonError::into_inner) = path;
}

pub fn init() -> Result<()> {
    let config = Config::new()?;
    *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
    Ok(())
}

/// Returns the loaded configuration, or the defaults when [`init`] has
/// not run.
pub fn get_config() -> Config {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(Config::default_config)
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            backend: Some(Backend::default()),
            rpc_url: Some(DEFAULT_RPC_URL.to_string()),
            batch_size: Some(DEFAULT_BATCH_SIZE),
            refine_multiplier: Some(DEFAULT_REFINE_MULTIPLIER),
            snapshot_url: Some(DEFAULT_SNAPSHOT_URL.to_string()),
            snapshot_path: None,
            snapshot_sync_interval: Some(DEFAULT_SYNC_INTERVAL.to_string()),
            timeout: Some(DEFAULT_TIMEOUT.to_string()),
            user_agent: None,
            default_search_by: Some(SearchBy::NameDesc.to_string()),
        }
    }

    /// Loads the configuration file.
    ///
    /// A missing file yields the defaults. `AURQ_STEALTH` skips the file
    /// entirely.
    pub fn new() -> Result<Self> {
        if std::env::var("AURQ_STEALTH").is_ok() {
            return Ok(Self::default_config());
        }
        Self::from_path(config_path())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = match fs::read_to_string(path.as_ref()) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default_config(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    /// Fills unset fields with defaults and validates the rest.
    pub fn resolve(&mut self) -> Result<()> {
        self.backend.get_or_insert_with(Backend::default);
        self.batch_size.get_or_insert(DEFAULT_BATCH_SIZE);
        self.refine_multiplier.get_or_insert(DEFAULT_REFINE_MULTIPLIER);
        self.snapshot_sync_interval
            .get_or_insert_with(|| DEFAULT_SYNC_INTERVAL.to_string());
        self.timeout.get_or_insert_with(|| DEFAULT_TIMEOUT.to_string());

        if self.get_refine_multiplier() == 0 {
            return Err(ConfigError::invalid("refine_multiplier", "must be at least 1"));
        }

        normalize_base_url(self.get_rpc_url())
            .map_err(|err| ConfigError::invalid("rpc_url", err.to_string()))?;
        Url::parse(self.get_snapshot_url())
            .map_err(|err| ConfigError::invalid("snapshot_url", err.to_string()))?;

        if let Some(interval) = &self.snapshot_sync_interval {
            parse_interval(interval).ok_or_else(|| {
                ConfigError::invalid(
                    "snapshot_sync_interval",
                    format!("`{interval}` is not a duration, `always` or `never`"),
                )
            })?;
        }
        if let Some(timeout) = &self.timeout {
            parse_timeout(timeout).ok_or_else(|| {
                ConfigError::invalid("timeout", format!("`{timeout}` is not a duration"))
            })?;
        }
        if let Some(by) = &self.default_search_by {
            by.parse::<SearchBy>()
                .map_err(|err| ConfigError::invalid("default_search_by", err.to_string()))?;
        }

        Ok(())
    }

    pub fn get_backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(DEFAULT_RPC_URL)
    }

    pub fn get_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn get_refine_multiplier(&self) -> usize {
        self.refine_multiplier.unwrap_or(DEFAULT_REFINE_MULTIPLIER)
    }

    pub fn get_snapshot_url(&self) -> &str {
        self.snapshot_url.as_deref().unwrap_or(DEFAULT_SNAPSHOT_URL)
    }

    pub fn get_snapshot_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("AURQ_SNAPSHOT") {
            return Ok(resolve_path(&env_path)?);
        }
        if let Some(path) = &self.snapshot_path {
            return Ok(resolve_path(path)?);
        }
        Ok(xdg_cache_home().join("aurq").join(SNAPSHOT_FILE_NAME))
    }

    /// Snapshot reuse window in milliseconds.
    pub fn get_snapshot_sync_interval(&self) -> u128 {
        self.snapshot_sync_interval
            .as_deref()
            .and_then(parse_interval)
            .or_else(|| parse_interval(DEFAULT_SYNC_INTERVAL))
            .unwrap_or(0)
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
            .as_deref()
            .and_then(parse_timeout)
            .unwrap_or(Some(Duration::from_secs(30)))
    }

    pub fn get_default_search_by(&self) -> SearchBy {
        self.default_search_by
            .as_deref()
            .and_then(|by| by.parse().ok())
            .unwrap_or(SearchBy::NameDesc)
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        Ok(doc)
    }
}

/// Writes the annotated default configuration to the configured path.
pub fn generate_default_config() -> Result<PathBuf> {
    let config_path = config_path();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        config_path.display()
    );
    Ok(config_path)
}
