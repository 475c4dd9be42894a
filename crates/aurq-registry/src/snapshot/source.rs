//! Where snapshot records come from.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use aurq_events::{null_sink, EventSinkHandle, QueryEvent, SnapshotStage};
use tracing::debug;
use url::Url;

use crate::{
    cancel::CancelToken,
    error::{ErrorContext, RegistryError, Result},
    http_client::{Transport, UreqTransport},
    package::Package,
};

/// Magic bytes for Zstandard compressed files.
pub const ZST_MAGIC_BYTES: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Default location of the full metadata dump.
pub const DEFAULT_SNAPSHOT_URL: &str = "https://aur.archlinux.org/packages-meta-ext-v1.json.gz";

/// Decodes a snapshot: a JSON array of records, optionally zstd-compressed.
pub fn parse_snapshot(content: &[u8]) -> Result<Vec<Package>> {
    if content.starts_with(&ZST_MAGIC_BYTES) {
        let decoded =
            zstd::decode_all(content).with_context(|| "decoding zstd snapshot".to_string())?;
        return Ok(serde_json::from_slice(&decoded)?);
    }
    Ok(serde_json::from_slice(content)?)
}

/// Supplies the full record set to a [`super::SnapshotClient`].
pub trait SnapshotSource: Send + Sync {
    /// Loads the snapshot, reusing any local copy the source considers
    /// fresh.
    fn load(&self, cancel: &CancelToken) -> Result<Vec<Package>>;

    /// Loads the snapshot, bypassing any local copy.
    fn reload(&self, cancel: &CancelToken) -> Result<Vec<Package>> {
        self.load(cancel)
    }

    /// Human readable origin, used in logs.
    fn describe(&self) -> String;
}

/// Reads a snapshot from a local file.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn load(&self, cancel: &CancelToken) -> Result<Vec<Package>> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        let content = fs::read(&self.path)
            .with_context(|| format!("reading snapshot {}", self.path.display()))?;
        parse_snapshot(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource {
    packages: Vec<Package>,
}

impl StaticSnapshotSource {
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }
}

impl SnapshotSource for StaticSnapshotSource {
    fn load(&self, cancel: &CancelToken) -> Result<Vec<Package>> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        Ok(self.packages.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory records", self.packages.len())
    }
}

/// Downloads the metadata dump, optionally keeping an on-disk copy.
///
/// The on-disk copy is reused while its modification time is within
/// `sync_interval` milliseconds. `0` always refetches and `u128::MAX`
/// never does once a copy exists.
pub struct HttpSnapshotSource {
    url: String,
    transport: Arc<dyn Transport>,
    cache_path: Option<PathBuf>,
    sync_interval: u128,
    events: EventSinkHandle,
}

impl HttpSnapshotSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Url::parse(&url).map_err(|err| RegistryError::InvalidUrl(format!("{url}: {err}")))?;

        Ok(Self {
            url,
            transport: Arc::new(UreqTransport::default()),
            cache_path: None,
            sync_interval: 0,
            events: null_sink(),
        })
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn cache_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn sync_interval(mut self, interval_ms: u128) -> Self {
        self.sync_interval = interval_ms;
        self
    }

    pub fn events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    fn fresh_cache(&self) -> Option<&Path> {
        let path = self.cache_path.as_deref()?;
        if self.sync_interval == 0 {
            return None;
        }

        let modified = path.metadata().ok()?.modified().ok()?;
        if self.sync_interval == u128::MAX {
            return Some(path);
        }
        let age = modified.elapsed().ok()?.as_millis();
        (age <= self.sync_interval).then_some(path)
    }

    fn fetch(&self, cancel: &CancelToken) -> Result<Vec<Package>> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        debug!("Fetching snapshot from {}", self.url);
        self.events.emit(QueryEvent::Snapshot {
            stage: SnapshotStage::Fetching {
                url: self.url.clone(),
            },
        });

        let resp = self.transport.get(&self.url, cancel)?;
        if !resp.is_success() {
            return Err(RegistryError::FailedToFetchRemote(format!(
                "{} [{}]",
                self.url, resp.status
            )));
        }

        let packages = parse_snapshot(&resp.body)?;
        if let Some(path) = &self.cache_path {
            write_cache(path, &resp.body)?;
        }
        Ok(packages)
    }
}

/// Writes `content` next to `path` and renames it into place.
fn write_cache(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let tmp_path = PathBuf::from(format!("{}.part", path.display()));
    fs::write(&tmp_path, content)
        .with_context(|| format!("writing temporary file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} to {}", tmp_path.display(), path.display()))?;
    Ok(())
}

impl SnapshotSource for HttpSnapshotSource {
    fn load(&self, cancel: &CancelToken) -> Result<Vec<Package>> {
        if let Some(path) = self.fresh_cache() {
            if cancel.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }

            debug!("Reusing snapshot at {}", path.display());
            self.events.emit(QueryEvent::Snapshot {
                stage: SnapshotStage::ReusingCache {
                    path: path.display().to_string(),
                },
            });
            let content =
                fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
            return parse_snapshot(&content);
        }
        self.fetch(cancel)
    }

    fn reload(&self, cancel: &CancelToken) -> Result<Vec<Package>> {
        self.fetch(cancel)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use aurq_events::CollectorSink;
    use tempfile::{tempdir, NamedTempFile};

    use super::*;
    use crate::{
        http_client::HttpResponse,
        test_utils::{serve_once, MockTransport},
    };

    const FIXTURE: &str = include_str!("../../testdata/snapshot.json");

    #[test]
    fn test_parse_plain_and_zstd() {
        let plain = parse_snapshot(FIXTURE.as_bytes()).unwrap();
        assert_eq!(plain.len(), 12);

        let compressed = zstd::encode_all(FIXTURE.as_bytes(), 3).unwrap();
        assert_eq!(compressed[..4], ZST_MAGIC_BYTES);
        let decoded = parse_snapshot(&compressed).unwrap();
        assert_eq!(decoded, plain);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_snapshot(br#"{"Name": "yay"}"#),
            Err(RegistryError::Decode(_))
        ));
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let source = FileSnapshotSource::new(file.path());
        let packages = source.load(&CancelToken::new()).unwrap();
        assert_eq!(packages[0].name, "yay");
    }

    #[test]
    fn test_file_source_missing() {
        let dir = tempdir().unwrap();
        let source = FileSnapshotSource::new(dir.path().join("missing.json"));
        assert!(matches!(
            source.load(&CancelToken::new()),
            Err(RegistryError::IoError { .. })
        ));
    }

    #[test]
    fn test_http_source_writes_and_reuses_cache() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("nested").join("snapshot.json");
        let transport = MockTransport::queued([HttpResponse::new(200, FIXTURE)]);
        let sink = Arc::new(CollectorSink::default());

        let source = HttpSnapshotSource::new(DEFAULT_SNAPSHOT_URL)
            .unwrap()
            .transport(transport.clone())
            .cache_path(&cache)
            .sync_interval(u128::MAX)
            .events(sink.clone());

        let first = source.load(&CancelToken::new()).unwrap();
        assert_eq!(first.len(), 12);
        assert!(cache.exists());
        assert!(!PathBuf::from(format!("{}.part", cache.display())).exists());

        let second = source.load(&CancelToken::new()).unwrap();
        assert_eq!(second, first);
        assert_eq!(transport.request_count(), 1);

        let events = sink.events();
        assert!(matches!(
            &events[0],
            QueryEvent::Snapshot {
                stage: SnapshotStage::Fetching { .. }
            }
        ));
        assert!(matches!(
            &events[1],
            QueryEvent::Snapshot {
                stage: SnapshotStage::ReusingCache { .. }
            }
        ));
    }

    #[test]
    fn test_http_source_reload_bypasses_cache() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("snapshot.json");
        let transport = MockTransport::queued([
            HttpResponse::new(200, FIXTURE),
            HttpResponse::new(200, r#"[{"Name": "only"}]"#),
        ]);

        let source = HttpSnapshotSource::new(DEFAULT_SNAPSHOT_URL)
            .unwrap()
            .transport(transport.clone())
            .cache_path(&cache)
            .sync_interval(u128::MAX);

        source.load(&CancelToken::new()).unwrap();
        let reloaded = source.reload(&CancelToken::new()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(transport.request_count(), 2);

        let cached = parse_snapshot(&fs::read(&cache).unwrap()).unwrap();
        assert_eq!(cached[0].name, "only");
    }

    #[test]
    fn test_http_source_always_refetches() {
        let transport = MockTransport::queued([
            HttpResponse::new(200, FIXTURE),
            HttpResponse::new(200, FIXTURE),
        ]);
        let dir = tempdir().unwrap();
        let source = HttpSnapshotSource::new(DEFAULT_SNAPSHOT_URL)
            .unwrap()
            .transport(transport.clone())
            .cache_path(dir.path().join("snapshot.json"))
            .sync_interval(0);

        source.load(&CancelToken::new()).unwrap();
        source.load(&CancelToken::new()).unwrap();
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_http_source_error_status() {
        let transport = MockTransport::queued([HttpResponse::new(404, "not found")]);
        let source = HttpSnapshotSource::new(DEFAULT_SNAPSHOT_URL)
            .unwrap()
            .transport(transport);

        let err = source.load(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, RegistryError::FailedToFetchRemote(ref msg) if msg.ends_with("[404]")));
    }

    #[test]
    fn test_http_source_network_failure_is_transient() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("snapshot.json");
        let source = HttpSnapshotSource::new(DEFAULT_SNAPSHOT_URL)
            .unwrap()
            .transport(MockTransport::queued([]))
            .cache_path(&cache);

        let err = source.load(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, RegistryError::Transport(_)));
        assert!(err.is_transient());
        assert!(!cache.exists());
    }

    #[test]
    fn test_http_source_truncated_body_is_transient() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 4096\r\n\r\n[{\"Name\":",
            Duration::ZERO,
        );
        let source = HttpSnapshotSource::new(&url).unwrap();

        let err = source.load(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, RegistryError::Transport(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_http_source_rejects_invalid_url() {
        assert!(matches!(
            HttpSnapshotSource::new("not a url"),
            Err(RegistryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_cancelled_source() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let source = StaticSnapshotSource::new(Vec::new());
        assert!(matches!(source.load(&cancel), Err(RegistryError::Cancelled)));
    }
}
