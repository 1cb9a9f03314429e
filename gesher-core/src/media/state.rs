//! State management for media preloading

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Readiness lifecycle of one media asset.
///
/// Transitions are strictly ordered per key:
/// `Idle → Resolving → (Buffering → (Ready | Failed) | Failed)`.
/// `Ready` and `Failed` are terminal until an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaReadiness {
    /// Nothing requested for this key yet
    Idle,
    /// Waiting for the storage backend to produce a download URL
    Resolving,
    /// URL known, bytes are being prefetched
    Buffering,
    /// Enough data is buffered for uninterrupted playback start
    Ready,
    /// URL resolution or loading failed terminally
    Failed,
}

impl MediaReadiness {
    /// Check if a preload attempt is already underway or finished.
    ///
    /// A repeated `request_preload` for a key in one of these states joins
    /// the existing attempt (or its terminal outcome) instead of starting a
    /// new fetch. Only `Idle` keys start one.
    pub fn joins_existing(self) -> bool {
        !matches!(self, MediaReadiness::Idle)
    }

    /// Check if the state is terminal (no further transitions without reset).
    pub fn is_terminal(self) -> bool {
        matches!(self, MediaReadiness::Ready | MediaReadiness::Failed)
    }

    /// Check if the asset is ready for playback.
    pub fn is_ready(self) -> bool {
        matches!(self, MediaReadiness::Ready)
    }

    /// Check if the preload attempt failed.
    pub fn is_failed(self) -> bool {
        matches!(self, MediaReadiness::Failed)
    }

    /// Check whether `next` is a legal successor of this state.
    ///
    /// This is the one authoritative ordering rule; the store refuses any
    /// transition outside it so event-ordering quirks of the loader cannot
    /// corrupt the externally-visible state.
    pub fn may_advance_to(self, next: MediaReadiness) -> bool {
        matches!(
            (self, next),
            (MediaReadiness::Idle, MediaReadiness::Resolving)
                | (MediaReadiness::Resolving, MediaReadiness::Buffering)
                | (MediaReadiness::Resolving, MediaReadiness::Failed)
                | (MediaReadiness::Buffering, MediaReadiness::Ready)
                | (MediaReadiness::Buffering, MediaReadiness::Failed)
        )
    }
}

impl std::fmt::Display for MediaReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaReadiness::Idle => write!(f, "idle"),
            MediaReadiness::Resolving => write!(f, "resolving"),
            MediaReadiness::Buffering => write!(f, "buffering"),
            MediaReadiness::Ready => write!(f, "ready"),
            MediaReadiness::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of the readiness state for one asset key.
///
/// Invariants, maintained by the store's transition function:
/// - `Idle` ⇒ `resolved_url` and `error_detail` are both `None`
/// - `Ready` ⇒ `resolved_url` is `Some` and `error_detail` is `None`
/// - `Failed` ⇒ `error_detail` is `Some`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    /// Storage key of the asset this state describes
    pub key: String,
    /// Fetchable download URL, populated once resolution succeeds
    pub resolved_url: Option<String>,
    /// Current lifecycle position
    pub readiness: MediaReadiness,
    /// Failure reason, populated only when `readiness` is `Failed`
    pub error_detail: Option<String>,
}

impl MediaState {
    /// Creates the idle state for a key.
    pub fn idle(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            resolved_url: None,
            readiness: MediaReadiness::Idle,
            error_detail: None,
        }
    }
}

/// Errors that can occur while preloading media.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("invalid media key: {key}")]
    InvalidKey { key: String },

    #[error("URL resolution failed: {reason}")]
    ResolutionFailed { reason: String },

    #[error("media load failed: {reason}")]
    LoadFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transition_order() {
        use MediaReadiness::*;

        assert!(Idle.may_advance_to(Resolving));
        assert!(Resolving.may_advance_to(Buffering));
        assert!(Resolving.may_advance_to(Failed));
        assert!(Buffering.may_advance_to(Ready));
        assert!(Buffering.may_advance_to(Failed));

        // Terminal states never advance, and Ready never precedes Buffering
        assert!(!Ready.may_advance_to(Failed));
        assert!(!Failed.may_advance_to(Ready));
        assert!(!Idle.may_advance_to(Ready));
        assert!(!Resolving.may_advance_to(Ready));
        assert!(!Ready.may_advance_to(Resolving));
    }

    #[test]
    fn test_join_predicate() {
        assert!(!MediaReadiness::Idle.joins_existing());
        assert!(MediaReadiness::Resolving.joins_existing());
        assert!(MediaReadiness::Buffering.joins_existing());
        assert!(MediaReadiness::Ready.joins_existing());
        assert!(MediaReadiness::Failed.joins_existing());
    }

    #[test]
    fn test_idle_state_shape() {
        let state = MediaState::idle("videos/hero.mp4");
        assert_eq!(state.key, "videos/hero.mp4");
        assert_eq!(state.readiness, MediaReadiness::Idle);
        assert!(state.resolved_url.is_none());
        assert!(state.error_detail.is_none());
    }
}
