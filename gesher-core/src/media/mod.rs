//! Media asset preloading and readiness tracking.
//!
//! The splash screen and every inline player must agree on a single
//! readiness signal for each asset instead of re-fetching it per surface.
//! [`MediaReadinessStore`] owns that state: URL resolution through a
//! [`UrlResolver`], a bounded buffering wait through a [`MediaLoader`], and
//! ordered transition events for subscribers.

pub mod loader;
pub mod resolver;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use loader::{HttpPrefetchLoader, MediaLoader, NoopLoader};
pub use resolver::{StaticUrlResolver, StorageUrlResolver, UrlResolver};
pub use state::{MediaError, MediaReadiness, MediaState};
pub use store::{MediaReadinessStore, PreloadTicket};
