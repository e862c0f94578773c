//! Readiness state machine for the animation runtime.
//!
//! # State Machine Diagram
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │               Animation Runtime Readiness                      │
//! │                                                                │
//! │   ┌──────────┐   initialize()   ┌─────────┐                    │
//! │   │ Unloaded │ ────────────────►│ Loading │                    │
//! │   └──────────┘                  └────┬────┘                    │
//! │        ▲                             │ control input           │
//! │        │                             │ discovered              │
//! │        │ settle delay                ▼                         │
//! │        │ elapsed                ┌─────────┐                    │
//! │   ┌────┴──────┐    reset()     │  Ready  │                    │
//! │   │ Resetting │◄───────────────┤         │                    │
//! │   └───────────┘                └─────────┘                    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Transitions
//!
//! | From      | To        | Trigger                                     |
//! |-----------|-----------|---------------------------------------------|
//! | Unloaded  | Loading   | `initialize()` begins a load                |
//! | Loading   | Ready     | at least one control input discovered       |
//! | Ready     | Resetting | `reset()` (also valid mid-playback)         |
//! | Resetting | Unloaded  | settle delay elapsed                        |
//!
//! `reset()` is additionally accepted from `Unloaded` and `Loading`: it is
//! the engine's sole cancellation primitive, and an in-flight load must be
//! cancellable. Firing an animation outside `Ready` is a no-op, never an
//! error.

/// Lifecycle stage of the animation runtime instance, independent of the
/// game phase.
///
/// Both control-input capabilities are forced absent whenever readiness is
/// not [`Ready`](Readiness::Ready); see
/// [`AnimationSynchronizer`](crate::AnimationSynchronizer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Readiness {
    /// No engine instance exists. `initialize()` begins a load.
    Unloaded,
    /// An instance is loading; its control inputs are being discovered by
    /// bounded polling. A load that exhausts the discovery budget stays here
    /// and is reported through a load-failure event.
    Loading,
    /// At least one control input is discovered; fires are accepted for the
    /// kinds whose controls are bound.
    Ready,
    /// The instance is being torn down; waiting out the settle delay before
    /// a fresh instance may be mounted.
    Resetting,
}

impl Readiness {
    /// Whether fires are accepted in this state.
    #[inline]
    #[must_use]
    pub const fn accepts_fire(self) -> bool {
        matches!(self, Readiness::Ready)
    }

    /// Whether `initialize()` may begin a load from this state.
    #[inline]
    #[must_use]
    pub const fn accepts_initialize(self) -> bool {
        matches!(self, Readiness::Unloaded)
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Readiness::Unloaded => write!(f, "unloaded"),
            Readiness::Loading => write!(f, "loading"),
            Readiness::Ready => write!(f, "ready"),
            Readiness::Resetting => write!(f, "resetting"),
        }
    }
}
