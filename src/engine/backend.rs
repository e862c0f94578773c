//! The animation runtime collaborator trait.
//!
//! The [`AnimationSynchronizer`](crate::AnimationSynchronizer) drives the
//! external vector-animation runtime exclusively through this trait. The
//! trait is non-blocking in the same way the real runtime is: creating an
//! instance returns immediately, and the instance's internal graph comes up
//! asynchronously — which is why [`discover_control`] may legitimately
//! return `None` for a control that will exist a few polls later.
//!
//! [`discover_control`]: AnimationBackend::discover_control

use std::fmt;

use crate::EngineError;

/// Opaque handle to one loaded engine instance.
///
/// Handles are issued by [`AnimationBackend::begin_load`] and owned
/// exclusively by the synchronizer; they are never exposed through the round
/// API. A handle is dead once passed to [`AnimationBackend::dispose`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineHandle(u64);

impl EngineHandle {
    /// Creates a handle from a raw id. Intended for backend implementations.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        EngineHandle(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// Opaque reference to a discovered control input on an engine instance.
///
/// Control refs are only meaningful to the backend that issued them and only
/// for as long as the issuing instance is alive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ControlRef(u64);

impl ControlRef {
    /// Creates a control ref from a raw id. Intended for backend
    /// implementations.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        ControlRef(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "control#{}", self.0)
    }
}

/// The external animation runtime, as the synchronizer sees it.
///
/// Implement this to bind the engine to a real runtime (or use
/// [`ScriptedEngine`](crate::ScriptedEngine) for tests and headless runs).
/// Implementations should be cheap to call: every method is invoked from the
/// host's poll loop.
///
/// # Contract
///
/// - [`begin_load`](Self::begin_load) returns a fresh handle per call; a
///   failed load must not leak a live instance.
/// - [`discover_control`](Self::discover_control) may return `None` for any
///   control at any time; callers re-poll. Once returned, a [`ControlRef`]
///   stays valid until the instance is disposed.
/// - [`pulse_control`](Self::pulse_control) fires an edge-triggered pulse.
///   Controls that only expose a boolean level return
///   [`EngineError::PulseUnsupported`], and the caller synthesizes the pulse
///   through [`set_control`](Self::set_control).
/// - [`stop`](Self::stop) and [`dispose`](Self::dispose) are best-effort
///   teardown; they must tolerate repeated and out-of-order calls.
pub trait AnimationBackend {
    /// Begins loading an engine instance from an asset source.
    fn begin_load(&mut self, source: &str) -> Result<EngineHandle, EngineError>;

    /// Attempts to resolve a named control input on a loaded instance.
    ///
    /// Returns `None` while the instance's internal graph has not exposed
    /// the control yet (or never will).
    fn discover_control(&mut self, handle: EngineHandle, name: &str) -> Option<ControlRef>;

    /// Fires an edge-triggered pulse on a control.
    fn pulse_control(&mut self, control: ControlRef) -> Result<(), EngineError>;

    /// Sets a boolean control level.
    fn set_control(&mut self, control: ControlRef, level: bool) -> Result<(), EngineError>;

    /// Stops playback on an instance. Best-effort.
    fn stop(&mut self, handle: EngineHandle);

    /// Releases all resources held by an instance. Best-effort.
    fn dispose(&mut self, handle: EngineHandle);
}
