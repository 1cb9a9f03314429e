//! Download URL resolution against the storage backend.
//!
//! The store never talks to storage directly; it asks a [`UrlResolver`] for
//! a fetchable URL and treats any failure as terminal for that key.

use serde::Deserialize;

use crate::config::MediaConfig;
use crate::media::MediaError;

/// Resolves a storage object key into a fetchable download URL.
///
/// Implementations map a logical asset key (e.g. `videos/hero.mp4`) to a
/// URL the loader can fetch bytes from. Resolution failures are descriptive
/// and terminal for the requesting preload attempt.
#[async_trait::async_trait]
pub trait UrlResolver: Send + Sync {
    /// Resolves `key` to a download URL.
    ///
    /// # Errors
    ///
    /// - `MediaError::InvalidKey` - Empty or malformed key
    /// - `MediaError::ResolutionFailed` - Storage lookup failed or the
    ///   object does not exist
    async fn resolve(&self, key: &str) -> Result<String, MediaError>;
}

/// Object metadata subset returned by the storage API.
#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(rename = "downloadTokens")]
    download_tokens: Option<String>,
}

/// Resolver backed by a Firebase-style storage object API.
///
/// Fetches object metadata to obtain a download token, then constructs the
/// `alt=media` download URL the same way the storage SDK does.
pub struct StorageUrlResolver {
    client: reqwest::Client,
    config: MediaConfig,
}

impl StorageUrlResolver {
    /// Creates a resolver for the configured bucket.
    pub fn new(config: MediaConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.resolve_timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.config.storage_api_base,
            self.config.storage_bucket,
            urlencoding::encode(key)
        )
    }
}

#[async_trait::async_trait]
impl UrlResolver for StorageUrlResolver {
    async fn resolve(&self, key: &str) -> Result<String, MediaError> {
        if key.is_empty() {
            return Err(MediaError::InvalidKey {
                key: key.to_string(),
            });
        }

        let object_url = self.object_url(key);
        let response = self.client.get(&object_url).send().await.map_err(|e| {
            MediaError::ResolutionFailed {
                reason: format!("storage metadata request failed: {e}"),
            }
        })?;

        if !response.status().is_success() {
            return Err(MediaError::ResolutionFailed {
                reason: format!("storage returned {} for {key}", response.status()),
            });
        }

        let metadata: ObjectMetadata =
            response
                .json()
                .await
                .map_err(|e| MediaError::ResolutionFailed {
                    reason: format!("invalid storage metadata: {e}"),
                })?;

        // Tokens can be comma-separated; any one of them is valid.
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MediaError::ResolutionFailed {
                reason: format!("no download token for {key}"),
            })?;

        Ok(format!("{object_url}?alt=media&token={token}"))
    }
}

/// Resolver that maps keys straight onto a static base URL.
///
/// Used in development mode where assets are served from a local directory
/// or a plain HTTP server instead of the storage backend.
pub struct StaticUrlResolver {
    base_url: String,
}

impl StaticUrlResolver {
    /// Creates a resolver rooted at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl UrlResolver for StaticUrlResolver {
    async fn resolve(&self, key: &str) -> Result<String, MediaError> {
        if key.is_empty() {
            return Err(MediaError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(format!("{}/{key}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_joins_base_and_key() {
        let resolver = StaticUrlResolver::new("http://localhost:8080/media");
        let url = resolver.resolve("videos/hero.mp4").await.unwrap();
        assert_eq!(url, "http://localhost:8080/media/videos/hero.mp4");
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let resolver = StaticUrlResolver::new("http://localhost:8080");
        let err = resolver.resolve("").await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidKey { .. }));
    }

    #[test]
    fn test_storage_object_url_encodes_key() {
        let resolver = StorageUrlResolver::new(MediaConfig::default());
        let url = resolver.object_url("videos/hero.mp4");
        assert!(url.ends_with("/o/videos%2Fhero.mp4"));
    }
}
