//! The animation synchronizer: readiness lifecycle, bounded control
//! discovery, defensive firing, and generation-tagged completion timing.
//!
//! [`AnimationSynchronizer`] hides all engine-specific polling from the
//! round layer. It owns the engine instance handle exclusively — nothing
//! above it ever sees the handle — and exposes three operations
//! (`initialize`, `fire`, `reset`) plus a `poll` that advances every
//! internal deadline and drains [`EngineEvent`]s.
//!
//! Timing model: the runtime's internal graph initializes asynchronously
//! with variable latency, so control inputs are discovered by a bounded
//! fixed-interval poll rather than assumed synchronously available. Firing
//! is fire-and-forget at the runtime layer; the synchronizer derives a
//! completion signal by running a playback window the length of the
//! authored animation and tagging it with the generation active at fire
//! time. A reset bumps the generation rather than cancelling timers, so a
//! window from a torn-down instance expires harmlessly: its tag no longer
//! matches and the consumer discards it.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::engine::backend::{AnimationBackend, ControlRef, EngineHandle};
use crate::engine::readiness::Readiness;
use crate::round::config::EngineTimings;
use crate::round::event_drain::EventDrain;
use crate::{AnimationKind, Generation};

/// Events raised by the synchronizer, drained via
/// [`AnimationSynchronizer::poll`].
///
/// Every event carries the [`Generation`] it belongs to. Consumers must
/// discard any event whose generation does not match the instance they care
/// about — that comparison is the crate's stale-timer defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A control input was discovered on the loading or ready instance.
    ControlDiscovered {
        /// The animation the discovered control triggers.
        kind: AnimationKind,
        /// Instance the control belongs to.
        generation: Generation,
    },
    /// The instance reached [`Readiness::Ready`]: at least one control input
    /// is bound and fires will be accepted.
    Ready {
        /// Instance that became ready.
        generation: Generation,
    },
    /// The load failed: either the runtime refused to create an instance, or
    /// no control input was discovered within the attempt budget. Readiness
    /// stays non-ready; a fresh `initialize()` retries.
    LoadFailed {
        /// Discovery attempts consumed before giving up.
        attempts: u32,
        /// Instance that failed to load.
        generation: Generation,
    },
    /// A playback window opened by an accepted fire has run its course.
    ///
    /// This is the completion signal the round layer gates resolution on.
    /// The generation is the one active when the fire was accepted, not the
    /// current one.
    PlaybackFinished {
        /// The animation whose window elapsed.
        kind: AnimationKind,
        /// Instance the fire was issued against.
        generation: Generation,
    },
    /// The reset settle delay elapsed; readiness is back to
    /// [`Readiness::Unloaded`] and a fresh instance may be initialized.
    SettleElapsed {
        /// The generation that owns the new, not-yet-loaded instance slot.
        generation: Generation,
    },
}

/// A completion timer opened by an accepted fire.
#[derive(Debug, Clone, Copy)]
struct PlaybackWindow {
    kind: AnimationKind,
    generation: Generation,
    deadline: Instant,
}

/// The falling edge of a synthesized pulse.
#[derive(Debug, Clone, Copy)]
struct PendingPulseClear {
    control: ControlRef,
    generation: Generation,
    deadline: Instant,
}

/// Maximum number of unpolled events to retain. Oldest are dropped first; a
/// host that polls once per frame never comes near this.
const MAX_EVENT_QUEUE_SIZE: usize = 100;

/// Manages the lifecycle of the external animation runtime and exposes
/// readiness-gated trigger operations.
///
/// See the [module documentation](self) for the timing model. Constructed
/// directly for standalone use, or owned by a
/// [`RoundController`](crate::RoundController) assembled through
/// [`RoundBuilder`](crate::RoundBuilder).
///
/// # Examples
///
/// ```
/// use catbox_engine::{
///     AnimationKind, AnimationSynchronizer, EngineTimings, Readiness, ScriptedEngine,
/// };
///
/// let mut sync = AnimationSynchronizer::new(
///     Box::new(ScriptedEngine::default()),
///     "rive/cat.riv",
///     EngineTimings::default(),
/// );
/// assert_eq!(sync.readiness(), Readiness::Unloaded);
/// assert!(!sync.fire(AnimationKind::Mouse)); // not ready: refused, no error
///
/// sync.initialize();
/// assert_eq!(sync.readiness(), Readiness::Ready);
/// assert!(sync.fire(AnimationKind::Mouse));
/// ```
pub struct AnimationSynchronizer {
    backend: Box<dyn AnimationBackend>,
    source: String,
    timings: EngineTimings,

    // lifecycle
    readiness: Readiness,
    generation: Generation,
    handle: Option<EngineHandle>,
    load_failed: bool,

    // control discovery
    mouse_control: Option<ControlRef>,
    button_control: Option<ControlRef>,
    discovery_attempts: u32,
    next_discovery_at: Option<Instant>,

    // timers
    settle_deadline: Option<Instant>,
    pending_pulse_clear: Option<PendingPulseClear>,
    playback_windows: Vec<PlaybackWindow>,

    event_queue: VecDeque<EngineEvent>,
}

impl std::fmt::Debug for AnimationSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationSynchronizer")
            .field("source", &self.source)
            .field("readiness", &self.readiness)
            .field("generation", &self.generation)
            .field("load_failed", &self.load_failed)
            .field("discovery_attempts", &self.discovery_attempts)
            .field("pending_playbacks", &self.playback_windows.len())
            .field("queued_events", &self.event_queue.len())
            .finish()
    }
}

impl AnimationSynchronizer {
    /// Creates a synchronizer over a backend. No load is started; call
    /// [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(
        backend: Box<dyn AnimationBackend>,
        source: impl Into<String>,
        timings: EngineTimings,
    ) -> Self {
        Self {
            backend,
            source: source.into(),
            timings,
            readiness: Readiness::Unloaded,
            generation: Generation::INITIAL,
            handle: None,
            load_failed: false,
            mouse_control: None,
            button_control: None,
            discovery_attempts: 0,
            next_discovery_at: None,
            settle_deadline: None,
            pending_pulse_clear: None,
            playback_windows: Vec::new(),
            event_queue: VecDeque::new(),
        }
    }

    /// Current readiness stage.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Generation of the current instance incarnation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether fires for `kind` would currently be accepted.
    ///
    /// Forced `false` whenever readiness is not [`Readiness::Ready`], even
    /// if a control was bound before a reset began.
    #[must_use]
    pub fn capability(&self, kind: AnimationKind) -> bool {
        self.readiness.accepts_fire() && self.control_for(kind).is_some()
    }

    /// Whether the most recent load attempt was reported failed.
    #[must_use]
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// The asset source this synchronizer loads.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of playback windows still running, including stale ones from
    /// torn-down instances.
    #[must_use]
    pub fn pending_playback_count(&self) -> usize {
        self.playback_windows.len()
    }

    /// Begins loading a fresh engine instance. Returns whether a load was
    /// started.
    ///
    /// Valid from [`Readiness::Unloaded`], and — as the retry affordance —
    /// after a failed load. Anywhere else this is a logged no-op.
    pub fn initialize(&mut self) -> bool {
        self.initialize_at(Instant::now())
    }

    /// Explicit-instant variant of [`initialize`](Self::initialize), for
    /// hosts that drive their own clock and for deterministic tests.
    pub fn initialize_at(&mut self, now: Instant) -> bool {
        let retrying_failed_load = self.readiness == Readiness::Loading && self.load_failed;
        if !self.readiness.accepts_initialize() && !retrying_failed_load {
            trace!(
                readiness = %self.readiness,
                "Ignoring initialize() outside Unloaded"
            );
            return false;
        }
        if retrying_failed_load {
            // Tear the dead instance down before mounting a fresh one.
            self.teardown_instance();
        }

        match self.backend.begin_load(&self.source) {
            Ok(handle) => {
                debug!(%handle, generation = %self.generation, "Engine load started");
                self.handle = Some(handle);
                self.readiness = Readiness::Loading;
                self.load_failed = false;
                self.discovery_attempts = 0;
                // Try to bind the controls immediately; the usual case on a
                // warm runtime is that they are already exposed.
                self.attempt_discovery(now);
                true
            }
            Err(error) => {
                warn!(%error, source = %self.source, "Engine load failed");
                self.load_failed = true;
                self.event_queue.push_back(EngineEvent::LoadFailed {
                    attempts: 0,
                    generation: self.generation,
                });
                self.trim_event_queue();
                false
            }
        }
    }

    /// Triggers the animation bound to `kind`.
    ///
    /// Returns `false` — a no-op, never an error — if readiness is not
    /// [`Readiness::Ready`], if the control for `kind` has not been
    /// discovered, or if the runtime refuses the invocation. On `true`, a
    /// playback window tagged with the current generation has been opened
    /// and will raise [`EngineEvent::PlaybackFinished`] when it elapses.
    pub fn fire(&mut self, kind: AnimationKind) -> bool {
        self.fire_at(kind, Instant::now())
    }

    /// Explicit-instant variant of [`fire`](Self::fire).
    pub fn fire_at(&mut self, kind: AnimationKind, now: Instant) -> bool {
        if !self.readiness.accepts_fire() {
            trace!(%kind, readiness = %self.readiness, "Refusing fire outside Ready");
            return false;
        }
        let Some(control) = self.control_for(kind) else {
            trace!(%kind, "Refusing fire for undiscovered control");
            return false;
        };

        // Prefer the runtime's edge-triggered primitive; synthesize a pulse
        // over the boolean level otherwise.
        match self.backend.pulse_control(control) {
            Ok(()) => {}
            Err(crate::EngineError::PulseUnsupported) => {
                if let Err(error) = self.backend.set_control(control, true) {
                    warn!(%error, %kind, "Control invocation failed");
                    return false;
                }
                self.pending_pulse_clear = Some(PendingPulseClear {
                    control,
                    generation: self.generation,
                    deadline: now + self.timings.pulse_clear_delay,
                });
            }
            Err(error) => {
                warn!(%error, %kind, "Control invocation failed");
                return false;
            }
        }

        trace!(%kind, generation = %self.generation, "Fire accepted");
        self.playback_windows.push(PlaybackWindow {
            kind,
            generation: self.generation,
            deadline: now + self.timings.playback_duration,
        });
        true
    }

    /// Tears down the current instance and begins a new generation.
    ///
    /// Synchronously: readiness becomes [`Readiness::Resetting`], both
    /// capabilities are dropped, the instance is stopped and disposed
    /// (best-effort), and the generation is bumped. After the settle delay
    /// elapses, readiness reaches [`Readiness::Unloaded`] and
    /// [`EngineEvent::SettleElapsed`] signals that a fresh instance may be
    /// initialized. Callers must not reuse anything tied to the old
    /// generation after this returns.
    ///
    /// Accepted from any readiness state: this is the engine's sole
    /// cancellation primitive. Returns the new generation.
    pub fn reset(&mut self) -> Generation {
        self.reset_at(Instant::now())
    }

    /// Explicit-instant variant of [`reset`](Self::reset).
    pub fn reset_at(&mut self, now: Instant) -> Generation {
        debug!(
            readiness = %self.readiness,
            generation = %self.generation,
            "Resetting engine instance"
        );
        self.teardown_instance();
        self.generation = self.generation.next();
        self.readiness = Readiness::Resetting;
        self.settle_deadline = Some(now + self.timings.settle_delay);
        self.generation
    }

    /// Advances every internal deadline and drains the events raised so far.
    pub fn poll(&mut self) -> EventDrain<'_, EngineEvent> {
        self.poll_at(Instant::now())
    }

    /// Explicit-instant variant of [`poll`](Self::poll).
    pub fn poll_at(&mut self, now: Instant) -> EventDrain<'_, EngineEvent> {
        // Settle: the torn-down render loop has had its wind-down time.
        if let Some(deadline) = self.settle_deadline {
            if now >= deadline {
                self.settle_deadline = None;
                self.readiness = Readiness::Unloaded;
                debug!(generation = %self.generation, "Reset settled");
                self.event_queue.push_back(EngineEvent::SettleElapsed {
                    generation: self.generation,
                });
            }
        }

        // Bounded control discovery.
        if let Some(at) = self.next_discovery_at {
            if now >= at {
                self.attempt_discovery(now);
            }
        }

        // Falling edge of a synthesized pulse.
        if let Some(pending) = self.pending_pulse_clear {
            if now >= pending.deadline {
                self.pending_pulse_clear = None;
                if pending.generation == self.generation {
                    if let Err(error) = self.backend.set_control(pending.control, false) {
                        warn!(%error, "Failed to clear synthesized pulse");
                    }
                } else {
                    trace!("Dropping stale pulse clear from a previous generation");
                }
            }
        }

        // Playback windows. Windows are appended in fire order and share a
        // duration, so the due ones form a prefix-ordered subset.
        let mut index = 0;
        while index < self.playback_windows.len() {
            if now >= self.playback_windows[index].deadline {
                let window = self.playback_windows.remove(index);
                trace!(
                    kind = %window.kind,
                    generation = %window.generation,
                    "Playback window elapsed"
                );
                self.event_queue.push_back(EngineEvent::PlaybackFinished {
                    kind: window.kind,
                    generation: window.generation,
                });
            } else {
                index += 1;
            }
        }

        self.trim_event_queue();
        EventDrain::from_drain(self.event_queue.drain(..))
    }

    fn control_for(&self, kind: AnimationKind) -> Option<ControlRef> {
        match kind {
            AnimationKind::Mouse => self.mouse_control,
            AnimationKind::ButtonPress => self.button_control,
        }
    }

    /// One discovery pass over the missing controls. Flips readiness to
    /// Ready on the first bound control and schedules the next pass while
    /// any control is missing and budget remains.
    fn attempt_discovery(&mut self, now: Instant) {
        let Some(handle) = self.handle else {
            self.next_discovery_at = None;
            return;
        };

        self.discovery_attempts += 1;
        for kind in AnimationKind::ALL {
            if self.control_for(kind).is_some() {
                continue;
            }
            if let Some(control) = self.backend.discover_control(handle, kind.control_name()) {
                trace!(%kind, attempt = self.discovery_attempts, "Control discovered");
                match kind {
                    AnimationKind::Mouse => self.mouse_control = Some(control),
                    AnimationKind::ButtonPress => self.button_control = Some(control),
                }
                self.event_queue.push_back(EngineEvent::ControlDiscovered {
                    kind,
                    generation: self.generation,
                });
            }
        }

        let any_bound = self.mouse_control.is_some() || self.button_control.is_some();
        let all_bound = self.mouse_control.is_some() && self.button_control.is_some();

        if any_bound && self.readiness == Readiness::Loading {
            self.readiness = Readiness::Ready;
            debug!(
                generation = %self.generation,
                attempts = self.discovery_attempts,
                "Engine ready"
            );
            self.event_queue.push_back(EngineEvent::Ready {
                generation: self.generation,
            });
        }

        if all_bound {
            self.next_discovery_at = None;
        } else if self.discovery_attempts >= self.timings.max_discovery_attempts {
            self.next_discovery_at = None;
            if !any_bound {
                warn!(
                    attempts = self.discovery_attempts,
                    source = %self.source,
                    "No control discovered within the attempt budget"
                );
                self.load_failed = true;
                self.event_queue.push_back(EngineEvent::LoadFailed {
                    attempts: self.discovery_attempts,
                    generation: self.generation,
                });
            }
        } else {
            self.next_discovery_at = Some(now + self.timings.discovery_interval);
        }
    }

    /// Stops and disposes the current instance and clears everything bound
    /// to it. Does not touch readiness or the generation.
    fn teardown_instance(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.stop(handle);
            self.backend.dispose(handle);
        }
        self.mouse_control = None;
        self.button_control = None;
        self.discovery_attempts = 0;
        self.next_discovery_at = None;
        self.load_failed = false;
        // The control this clear referenced died with the instance.
        self.pending_pulse_clear = None;
    }

    fn trim_event_queue(&mut self) {
        while self.event_queue.len() > MAX_EVENT_QUEUE_SIZE {
            self.event_queue.pop_front();
        }
    }
}
