//! Composition root for a harvest run
//!
//! The [`Manager`] owns every shared collaborator: the configuration snapshot,
//! the storage backend, the limiter registry, the HTTP client (with its
//! response cache), the progress counters and the media sink. Crawlers hold an
//! `Arc<Manager>` and only ever read from it.

use crate::config::Config;
use crate::crawler::{builtin_sites, MediaSink, SiteKind};
use crate::http::{HttpClient, ResponseCache};
use crate::limiter::LimiterRegistry;
use crate::progress::ScrapeProgress;
use crate::storage::{open_storage, StorageBackend};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;

pub struct Manager {
    config: Arc<Config>,
    storage: Arc<dyn StorageBackend>,
    limiters: LimiterRegistry,
    client: HttpClient,
    progress: Arc<ScrapeProgress>,
    sink: Arc<dyn MediaSink>,
}

impl Manager {
    /// Opens the SQLite database named in the configuration and builds a manager
    ///
    /// The caller must call [`Manager::close`] when the run ends, on success
    /// and on failure alike.
    pub fn open(config: Config, sink: Arc<dyn MediaSink>) -> Result<Arc<Self>, HarvestError> {
        let storage = open_storage(Path::new(&config.storage.database_path))?;
        tracing::info!("Opened database at {}", config.storage.database_path);
        Self::with_storage(config, Arc::new(storage), sink)
    }

    /// Builds a manager over an already opened backend
    pub fn with_storage(
        config: Config,
        storage: Arc<dyn StorageBackend>,
        sink: Arc<dyn MediaSink>,
    ) -> Result<Arc<Self>, HarvestError> {
        let limiters = LimiterRegistry::new(&config.rate_limiting);

        let mut cache = ResponseCache::new(Arc::clone(&storage), &config.cache);
        for site in builtin_sites() {
            let ttl = match site.kind {
                SiteKind::FileHost => config.rate_limiting.file_host_cache_length(),
                SiteKind::Forum => config.rate_limiting.forum_cache_length(),
            };
            for pattern in site.host_patterns {
                cache = cache.with_scope(*pattern, ttl);
            }
        }

        let client = HttpClient::new(&config, cache, limiters.global())?;

        Ok(Arc::new(Self {
            config: Arc::new(config),
            storage,
            limiters,
            client,
            progress: Arc::new(ScrapeProgress::new()),
            sink,
        }))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn limiters(&self) -> &LimiterRegistry {
        &self.limiters
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn progress(&self) -> &Arc<ScrapeProgress> {
        &self.progress
    }

    pub fn sink(&self) -> &dyn MediaSink {
        self.sink.as_ref()
    }

    /// Flushes and closes the storage backend
    ///
    /// Safe to call more than once.
    pub fn close(&self) -> Result<(), HarvestError> {
        self.storage.close()?;
        tracing::debug!("Manager closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::ChannelSink;
    use crate::storage::{MemoryStorage, ProgressStore, ProgressValue, StorageError};
    use std::time::Duration;
    use url::Url;

    fn create_test_manager(config: Config) -> Arc<Manager> {
        let (sink, _rx) = ChannelSink::new();
        Manager::with_storage(config, Arc::new(MemoryStorage::new()), Arc::new(sink)).unwrap()
    }

    #[test]
    fn test_file_host_scopes_use_file_host_cache_length() {
        let mut config = Config::default();
        config.rate_limiting.file_host_cache_secs = 3600;
        let manager = create_test_manager(config);

        let ttl = manager
            .client()
            .cache()
            .ttl_for(&Url::parse("https://www.tokyomotion.net/video/1").unwrap());
        assert_eq!(ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_close_rejects_later_use() {
        let manager = create_test_manager(Config::default());
        manager
            .storage()
            .save("completed:x", ProgressValue::Bool(true))
            .unwrap();

        manager.close().unwrap();
        assert!(matches!(
            manager.storage().get("completed:x"),
            Err(StorageError::Closed)
        ));
        assert!(manager.close().is_ok());
    }

    #[test]
    fn test_open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = dir.path().join("h.db").to_string_lossy().into_owned();

        let (sink, _rx) = ChannelSink::new();
        let manager = Manager::open(config, Arc::new(sink)).unwrap();
        manager.close().unwrap();
        assert!(dir.path().join("h.db").exists());
    }
}
