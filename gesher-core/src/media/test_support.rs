//! Mock collaborators for testing the media readiness store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::media::loader::MediaLoader;
use crate::media::resolver::UrlResolver;
use crate::media::state::MediaError;

/// Mock URL resolver with a scriptable outcome and an invocation counter.
#[derive(Clone)]
pub struct MockResolver {
    outcome: Arc<Mutex<Result<String, String>>>,
    delay: Duration,
    invocations: Arc<AtomicUsize>,
}

impl MockResolver {
    /// Creates a resolver that always returns `url`.
    pub fn succeeds_with(url: &str) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(Ok(url.to_string()))),
            delay: Duration::ZERO,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a resolver that returns `url` after `delay`.
    pub fn succeeds_with_delay(url: &str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::succeeds_with(url)
        }
    }

    /// Creates a resolver that always fails with `reason`.
    pub fn fails_with(reason: &str) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(Err(reason.to_string()))),
            delay: Duration::ZERO,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Switches a failing resolver to succeed with `url` from now on.
    pub fn recover_with(&self, url: &str) {
        *self.outcome.lock() = Ok(url.to_string());
    }

    /// Number of times `resolve` was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlResolver for MockResolver {
    async fn resolve(&self, key: &str) -> Result<String, MediaError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if key.is_empty() {
            return Err(MediaError::InvalidKey {
                key: key.to_string(),
            });
        }
        self.outcome
            .lock()
            .clone()
            .map_err(|reason| MediaError::ResolutionFailed { reason })
    }
}

enum LoaderBehavior {
    Instant,
    Fail(String),
    NeverCompletes,
}

/// Mock media loader with scriptable buffering behavior.
pub struct MockLoader {
    behavior: LoaderBehavior,
    invocations: AtomicUsize,
}

impl MockLoader {
    /// Creates a loader that buffers instantly.
    pub fn instant() -> Self {
        Self {
            behavior: LoaderBehavior::Instant,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Creates a loader that fails with `reason`.
    pub fn fails_with(reason: &str) -> Self {
        Self {
            behavior: LoaderBehavior::Fail(reason.to_string()),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Creates a loader that never signals completion, for timeout tests.
    pub fn never_completes() -> Self {
        Self {
            behavior: LoaderBehavior::NeverCompletes,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Number of times `prefetch` was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaLoader for MockLoader {
    async fn prefetch(&self, _url: &str) -> Result<(), MediaError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            LoaderBehavior::Instant => Ok(()),
            LoaderBehavior::Fail(reason) => Err(MediaError::LoadFailed {
                reason: reason.clone(),
            }),
            LoaderBehavior::NeverCompletes => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
