use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::error::DirectoryError;
use super::model::Directory;
use super::source::DirectorySource;

/// How long a loaded directory is served before it is fetched again.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Loads the directory from a remote source, falling back to a local one.
#[derive(Clone, Default)]
pub struct DirectoryLoader {
    remote: Option<Arc<dyn DirectorySource>>,
    local: Option<Arc<dyn DirectorySource>>,
}

impl DirectoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote(mut self, source: impl DirectorySource + 'static) -> Self {
        self.remote = Some(Arc::new(source));
        self
    }

    pub fn with_local(mut self, source: impl DirectorySource + 'static) -> Self {
        self.local = Some(Arc::new(source));
        self
    }

    pub fn has_sources(&self) -> bool {
        self.remote.is_some() || self.local.is_some()
    }

    /// Remote first, then local. Fails with [`DirectoryError::Unavailable`]
    /// only when neither source yields a valid directory.
    pub async fn load(&self) -> Result<Directory, DirectoryError> {
        let remote_err = match Self::try_source(self.remote.as_deref(), "remote").await {
            Ok(directory) => return Ok(directory),
            Err(e) => e,
        };
        if self.remote.is_some() {
            warn!("Remote directory unavailable, trying local copy: {remote_err}");
        }

        let local_err = match Self::try_source(self.local.as_deref(), "local").await {
            Ok(directory) => return Ok(directory),
            Err(e) => e,
        };

        Err(DirectoryError::Unavailable {
            remote: remote_err.to_string(),
            local: local_err.to_string(),
        })
    }

    /// Serves from `cache` while it is fresh, otherwise loads and refreshes it.
    pub async fn load_cached(
        &self,
        cache: &mut DirectoryCache,
    ) -> Result<Arc<Directory>, DirectoryError> {
        if let Some(directory) = cache.get_fresh(Instant::now()) {
            debug!("Serving directory from cache");
            return Ok(directory);
        }

        let directory = Arc::new(self.load().await?);
        cache.store(directory.clone(), Instant::now());
        Ok(directory)
    }

    async fn try_source(
        source: Option<&dyn DirectorySource>,
        label: &'static str,
    ) -> Result<Directory, DirectoryError> {
        let source = source.ok_or(DirectoryError::NotConfigured(label))?;
        let directory = source.fetch().await?;

        for issue in directory.validate() {
            warn!("Directory entry from {}: {issue}", source.describe());
        }
        info!(
            "Loaded {} countries ({} channels) from {label} source {}",
            directory.len(),
            directory.channel_count(),
            source.describe()
        );
        Ok(directory)
    }
}

/// Explicit time-bounded cache for the directory snapshot.
#[derive(Debug, Clone)]
pub struct DirectoryCache {
    ttl: Duration,
    last_fetched: Option<Instant>,
    data: Option<Arc<Directory>>,
}

impl DirectoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_fetched: None,
            data: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get_fresh(&self, now: Instant) -> Option<Arc<Directory>> {
        let fetched = self.last_fetched?;
        if now.saturating_duration_since(fetched) < self.ttl {
            self.data.clone()
        } else {
            None
        }
    }

    pub fn store(&mut self, data: Arc<Directory>, now: Instant) {
        self.data = Some(data);
        self.last_fetched = Some(now);
    }

    pub fn invalidate(&mut self) {
        self.data = None;
        self.last_fetched = None;
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
