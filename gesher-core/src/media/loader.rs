//! Buffering wait for resolved media URLs.
//!
//! The loader is the server-side analog of a detached media element with
//! aggressive preloading: it pulls bytes from the resolved URL until enough
//! data is cached for an uninterrupted playback start. The store bounds the
//! wait with a timeout, so a loader that never finishes cannot stall
//! readiness forever.

use crate::config::MediaConfig;
use crate::media::MediaError;

/// Prefetches asset bytes until the asset counts as buffered.
///
/// `prefetch` returns once enough data has been fetched; the caller applies
/// the liveness timeout. Terminal fetch errors surface as `MediaError`.
#[async_trait::async_trait]
pub trait MediaLoader: Send + Sync {
    /// Fetches bytes from `url` until the buffering target is met.
    ///
    /// # Errors
    ///
    /// - `MediaError::LoadFailed` - The fetch failed before the target was
    ///   reached (connection error, non-success status, stream abort)
    async fn prefetch(&self, url: &str) -> Result<(), MediaError>;
}

/// Loader that streams the asset over HTTP up to a byte target.
///
/// Stops early at end of body; an asset smaller than the target is simply
/// fully buffered.
pub struct HttpPrefetchLoader {
    client: reqwest::Client,
    prefetch_target: u64,
}

impl HttpPrefetchLoader {
    /// Creates a loader with the configured prefetch target.
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            prefetch_target: config.prefetch_target,
        }
    }
}

#[async_trait::async_trait]
impl MediaLoader for HttpPrefetchLoader {
    async fn prefetch(&self, url: &str) -> Result<(), MediaError> {
        let mut response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| MediaError::LoadFailed {
                    reason: format!("prefetch request failed: {e}"),
                })?;

        if !response.status().is_success() {
            return Err(MediaError::LoadFailed {
                reason: format!("prefetch returned {}", response.status()),
            });
        }

        let mut fetched: u64 = 0;
        while fetched < self.prefetch_target {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    fetched += chunk.len() as u64;
                }
                Ok(None) => break, // body smaller than target, fully buffered
                Err(e) => {
                    return Err(MediaError::LoadFailed {
                        reason: format!("prefetch stream aborted after {fetched} bytes: {e}"),
                    });
                }
            }
        }

        tracing::debug!("prefetched {} bytes from {}", fetched, url);
        Ok(())
    }
}

/// Loader that declares every asset buffered immediately.
///
/// Development-mode stand-in when assets are served locally and buffering
/// is not worth waiting for.
pub struct NoopLoader;

#[async_trait::async_trait]
impl MediaLoader for NoopLoader {
    async fn prefetch(&self, _url: &str) -> Result<(), MediaError> {
        Ok(())
    }
}
