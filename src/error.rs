//! Error types raised at the animation runtime and persistence boundaries.

use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Errors raised at the animation runtime boundary.
///
/// These only cross the [`AnimationBackend`] trait boundary. The synchronizer
/// never propagates them to the caller: a failed load leaves readiness
/// non-ready and raises a load-failure event, and a failed fire is logged and
/// reported as a refused fire (`false`). Game state is never poisoned by a
/// runtime failure.
///
/// [`AnimationBackend`]: crate::AnimationBackend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineError {
    /// The runtime could not create an engine instance from the given source.
    LoadFailure {
        /// The asset source that failed to load.
        source: String,
        /// Runtime-supplied description of the failure.
        reason: String,
    },
    /// The control only exposes a boolean level, not an edge-triggered pulse.
    ///
    /// Callers are expected to synthesize a pulse by raising the level and
    /// clearing it shortly after, so the runtime observes a rising edge.
    PulseUnsupported,
    /// A control invocation failed inside the runtime.
    ControlFailure {
        /// Runtime-supplied description of the failure.
        reason: String,
    },
    /// The operation referenced an engine instance that has been disposed.
    Disposed,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::LoadFailure { source, reason } => {
                write!(f, "Failed to load animation source '{}': {}", source, reason)
            }
            EngineError::PulseUnsupported => {
                write!(f, "Control has no edge-triggered pulse primitive")
            }
            EngineError::ControlFailure { reason } => {
                write!(f, "Control invocation failed: {}", reason)
            }
            EngineError::Disposed => {
                write!(f, "Engine instance has already been disposed")
            }
        }
    }
}

impl Error for EngineError {}

/// Errors raised by the persistence collaborator.
///
/// Writes are fire-and-forget from the round engine's perspective: a
/// [`StoreError`] from a record write is logged and otherwise ignored, and
/// the resolved round is never rolled back or re-shown as an error because of
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreError {
    /// The store could not be reached.
    Unavailable {
        /// Collaborator-supplied description of the failure.
        reason: String,
    },
    /// The store rejected the request.
    Rejected {
        /// Collaborator-supplied description of the rejection.
        reason: String,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable { reason } => {
                write!(f, "Game store unavailable: {}", reason)
            }
            StoreError::Rejected { reason } => {
                write!(f, "Game store rejected the request: {}", reason)
            }
        }
    }
}

impl Error for StoreError {}
