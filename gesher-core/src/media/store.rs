//! Process-wide media readiness store.
//!
//! Guarantees that an expensive media asset is fetched and buffered at most
//! once per attempt, and exposes one authoritative readiness signal to
//! arbitrarily many consumers. Independent call sites (splash screen,
//! inline players) can all request the same key; only the first request
//! starts a fetch, the rest join it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::config::MediaConfig;
use crate::media::loader::MediaLoader;
use crate::media::resolver::UrlResolver;
use crate::media::state::{MediaError, MediaReadiness, MediaState};

/// Broadcast capacity for state transition events. Each preload emits at
/// most three transitions, so slow subscribers only lag under heavy churn.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of a preload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadTicket {
    /// A new preload attempt was started for this key
    Started,
    /// An attempt for this key already exists (or finished); no new fetch
    /// was triggered. Carries the readiness observed at request time.
    Joined(MediaReadiness),
}

/// Shared store tracking readiness of media assets by storage key.
///
/// All mutation goes through the internal transition function; reads via
/// [`state`](Self::state) and [`subscribe`](Self::subscribe) never mutate.
pub struct MediaReadinessStore {
    states: Mutex<HashMap<String, MediaState>>,
    events: broadcast::Sender<MediaState>,
    resolver: Arc<dyn UrlResolver>,
    loader: Arc<dyn MediaLoader>,
    buffer_timeout: Duration,
}

impl MediaReadinessStore {
    /// Creates a store over the given resolver and loader collaborators.
    pub fn new(
        resolver: Arc<dyn UrlResolver>,
        loader: Arc<dyn MediaLoader>,
        config: &MediaConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            states: Mutex::new(HashMap::new()),
            events,
            resolver,
            loader,
            buffer_timeout: config.buffer_timeout,
        })
    }

    /// Requests preloading of `key`, starting a fetch only if none exists.
    ///
    /// Safe to call from multiple call sites concurrently: the check and
    /// the claim happen under one lock, so exactly one underlying resolver
    /// invocation occurs per attempt. A key in `Resolving`, `Buffering` or
    /// `Ready` joins the existing attempt. A `Failed` key also joins (its
    /// terminal state); retry requires an explicit [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// - `MediaError::InvalidKey` - `key` is empty
    pub fn request_preload(self: &Arc<Self>, key: &str) -> Result<PreloadTicket, MediaError> {
        if key.is_empty() {
            return Err(MediaError::InvalidKey {
                key: key.to_string(),
            });
        }

        let snapshot = {
            let mut states = self.states.lock();
            let entry = states
                .entry(key.to_string())
                .or_insert_with(|| MediaState::idle(key));

            if entry.readiness.joins_existing() {
                return Ok(PreloadTicket::Joined(entry.readiness));
            }

            // Claim the attempt while still holding the lock - this is the
            // single-flight guard.
            entry.readiness = MediaReadiness::Resolving;
            entry.clone()
        };
        let _ = self.events.send(snapshot);

        let store = Arc::clone(self);
        let key = key.to_string();
        tokio::spawn(async move {
            store.run_preload(key).await;
        });

        Ok(PreloadTicket::Started)
    }

    /// Returns the current state for `key` (`Idle` for unknown keys).
    ///
    /// Pure read; never triggers a fetch or mutation.
    pub fn state(&self, key: &str) -> MediaState {
        self.states
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(|| MediaState::idle(key))
    }

    /// Subscribes to state transitions.
    ///
    /// Every transition is published exactly once; all subscribers observe
    /// the same transitions in the same order.
    pub fn subscribe(&self) -> broadcast::Receiver<MediaState> {
        self.events.subscribe()
    }

    /// Resets a terminal key back to `Idle`, enabling a fresh preload.
    ///
    /// Returns `false` (and does nothing) while an attempt is in flight;
    /// only `Ready` and `Failed` keys can be reset.
    pub fn reset(&self, key: &str) -> bool {
        let snapshot = {
            let mut states = self.states.lock();
            let Some(entry) = states.get_mut(key) else {
                return false;
            };
            if !entry.readiness.is_terminal() {
                return false;
            }
            *entry = MediaState::idle(key);
            entry.clone()
        };
        let _ = self.events.send(snapshot);
        true
    }

    /// Drives one preload attempt through resolution and buffering.
    async fn run_preload(self: Arc<Self>, key: String) {
        tracing::info!("preloading media asset {}", key);

        let url = match self.resolver.resolve(&key).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("URL resolution failed for {}: {}", key, e);
                self.advance(&key, MediaReadiness::Failed, None, Some(e.to_string()));
                return;
            }
        };

        if !self.advance(&key, MediaReadiness::Buffering, Some(url.clone()), None) {
            return;
        }

        match tokio::time::timeout(self.buffer_timeout, self.loader.prefetch(&url)).await {
            Ok(Ok(())) => {
                tracing::info!("media asset {} fully buffered", key);
                self.advance(&key, MediaReadiness::Ready, None, None);
            }
            Ok(Err(e)) => {
                tracing::warn!("media load failed for {}: {}", key, e);
                self.advance(&key, MediaReadiness::Failed, None, Some(e.to_string()));
            }
            Err(_) => {
                // Liveness over completeness: a loader that never signals
                // completion must not hang readiness forever. Declaring
                // ready here is a soft success, not a failure.
                tracing::warn!(
                    "buffering timeout ({:?}) for {}; declaring ready",
                    self.buffer_timeout,
                    key
                );
                self.advance(&key, MediaReadiness::Ready, None, None);
            }
        }
    }

    /// The one authoritative transition function.
    ///
    /// Applies `next` only if it is a legal successor of the current state,
    /// maintains the state invariants, and publishes the new snapshot.
    /// Out-of-order transitions (e.g. from a task outliving a reset) are
    /// refused and dropped.
    fn advance(
        &self,
        key: &str,
        next: MediaReadiness,
        resolved_url: Option<String>,
        error_detail: Option<String>,
    ) -> bool {
        let snapshot = {
            let mut states = self.states.lock();
            let Some(entry) = states.get_mut(key) else {
                return false;
            };
            if !entry.readiness.may_advance_to(next) {
                tracing::error!(
                    "refused transition {} -> {} for {}",
                    entry.readiness,
                    next,
                    key
                );
                return false;
            }

            entry.readiness = next;
            if let Some(url) = resolved_url {
                entry.resolved_url = Some(url);
            }
            entry.error_detail = error_detail;
            entry.clone()
        };

        // Publish outside the lock; a send error only means no subscribers.
        let _ = self.events.send(snapshot);
        true
    }
}

impl std::fmt::Debug for MediaReadinessStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaReadinessStore")
            .field("tracked_keys", &self.states.lock().len())
            .field("buffer_timeout", &self.buffer_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::media::test_support::{MockLoader, MockResolver};

    fn test_config(buffer_timeout: Duration) -> MediaConfig {
        MediaConfig {
            buffer_timeout,
            ..MediaConfig::default()
        }
    }

    async fn wait_for(
        store: &Arc<MediaReadinessStore>,
        key: &str,
        readiness: MediaReadiness,
    ) -> MediaState {
        for _ in 0..100 {
            let state = store.state(key);
            if state.readiness == readiness {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "key {key} never reached {readiness}, stuck at {}",
            store.state(key).readiness
        );
    }

    #[tokio::test]
    async fn test_preload_reaches_ready() {
        let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver,
            loader,
            &test_config(Duration::from_secs(5)),
        );

        let ticket = store.request_preload("videos/hero.mp4").unwrap();
        assert_eq!(ticket, PreloadTicket::Started);

        let state = wait_for(&store, "videos/hero.mp4", MediaReadiness::Ready).await;
        assert_eq!(state.resolved_url.as_deref(), Some("http://cdn/hero.mp4"));
        assert!(state.error_detail.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_requests_share_one_resolution() {
        let resolver = Arc::new(MockResolver::succeeds_with_delay(
            "http://cdn/hero.mp4",
            Duration::from_millis(50),
        ));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver.clone(),
            loader,
            &test_config(Duration::from_secs(5)),
        );

        let first = store.request_preload("videos/hero.mp4").unwrap();
        let second = store.request_preload("videos/hero.mp4").unwrap();

        assert_eq!(first, PreloadTicket::Started);
        assert_eq!(second, PreloadTicket::Joined(MediaReadiness::Resolving));

        wait_for(&store, "videos/hero.mp4", MediaReadiness::Ready).await;
        assert_eq!(resolver.invocations(), 1);

        // Ready keys also join instead of re-fetching
        let third = store.request_preload("videos/hero.mp4").unwrap();
        assert_eq!(third, PreloadTicket::Joined(MediaReadiness::Ready));
        assert_eq!(resolver.invocations(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_observe_ordered_transitions() {
        let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver,
            loader,
            &test_config(Duration::from_secs(5)),
        );

        let mut events = store.subscribe();
        store.request_preload("videos/hero.mp4").unwrap();

        let mut observed = Vec::new();
        while observed.last() != Some(&MediaReadiness::Ready) {
            let state = tokio::time::timeout(Duration::from_secs(1), events.recv())
                .await
                .expect("transition stream stalled")
                .expect("event channel closed");
            observed.push(state.readiness);
        }

        assert_eq!(
            observed,
            vec![
                MediaReadiness::Resolving,
                MediaReadiness::Buffering,
                MediaReadiness::Ready
            ]
        );
    }

    #[tokio::test]
    async fn test_timeout_declares_ready() {
        let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
        let loader = Arc::new(MockLoader::never_completes());
        let store = MediaReadinessStore::new(
            resolver,
            loader,
            &test_config(Duration::from_millis(100)),
        );

        store.request_preload("videos/hero.mp4").unwrap();

        let state = wait_for(&store, "videos/hero.mp4", MediaReadiness::Ready).await;
        assert!(state.error_detail.is_none());
    }

    #[tokio::test]
    async fn test_resolution_failure_is_terminal() {
        let resolver = Arc::new(MockResolver::fails_with("object not found"));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver.clone(),
            loader,
            &test_config(Duration::from_secs(5)),
        );

        store.request_preload("videos/missing.mp4").unwrap();

        let state = wait_for(&store, "videos/missing.mp4", MediaReadiness::Failed).await;
        assert!(state.resolved_url.is_none());
        assert!(
            state
                .error_detail
                .as_deref()
                .unwrap()
                .contains("object not found")
        );

        // No automatic retry: the failed key joins, resolver is not re-hit
        let ticket = store.request_preload("videos/missing.mp4").unwrap();
        assert_eq!(ticket, PreloadTicket::Joined(MediaReadiness::Failed));
        assert_eq!(resolver.invocations(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_resolved_url() {
        let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
        let loader = Arc::new(MockLoader::fails_with("stream aborted"));
        let store = MediaReadinessStore::new(
            resolver,
            loader,
            &test_config(Duration::from_secs(5)),
        );

        store.request_preload("videos/hero.mp4").unwrap();

        let state = wait_for(&store, "videos/hero.mp4", MediaReadiness::Failed).await;
        assert_eq!(state.resolved_url.as_deref(), Some("http://cdn/hero.mp4"));
        assert!(
            state
                .error_detail
                .as_deref()
                .unwrap()
                .contains("stream aborted")
        );
    }

    #[tokio::test]
    async fn test_reset_enables_retry() {
        let resolver = Arc::new(MockResolver::fails_with("transient outage"));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver.clone(),
            loader,
            &test_config(Duration::from_secs(5)),
        );

        store.request_preload("videos/hero.mp4").unwrap();
        wait_for(&store, "videos/hero.mp4", MediaReadiness::Failed).await;

        assert!(store.reset("videos/hero.mp4"));
        assert_eq!(
            store.state("videos/hero.mp4").readiness,
            MediaReadiness::Idle
        );

        resolver.recover_with("http://cdn/hero.mp4");
        let ticket = store.request_preload("videos/hero.mp4").unwrap();
        assert_eq!(ticket, PreloadTicket::Started);

        wait_for(&store, "videos/hero.mp4", MediaReadiness::Ready).await;
        assert_eq!(resolver.invocations(), 2);
    }

    #[tokio::test]
    async fn test_reset_refused_while_in_flight() {
        let resolver = Arc::new(MockResolver::succeeds_with_delay(
            "http://cdn/hero.mp4",
            Duration::from_millis(100),
        ));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver,
            loader,
            &test_config(Duration::from_secs(5)),
        );

        store.request_preload("videos/hero.mp4").unwrap();
        assert!(!store.reset("videos/hero.mp4"));

        wait_for(&store, "videos/hero.mp4", MediaReadiness::Ready).await;
        assert!(store.reset("videos/hero.mp4"));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/x"));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver,
            loader,
            &test_config(Duration::from_secs(5)),
        );

        let err = store.request_preload("").unwrap_err();
        assert!(matches!(err, MediaError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn test_independent_keys_do_not_interfere() {
        let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/asset"));
        let loader = Arc::new(MockLoader::instant());
        let store = MediaReadinessStore::new(
            resolver.clone(),
            loader,
            &test_config(Duration::from_secs(5)),
        );

        store.request_preload("videos/hero.mp4").unwrap();
        store.request_preload("videos/testimonial-1.mp4").unwrap();

        wait_for(&store, "videos/hero.mp4", MediaReadiness::Ready).await;
        wait_for(&store, "videos/testimonial-1.mp4", MediaReadiness::Ready).await;
        assert_eq!(resolver.invocations(), 2);
    }
}
