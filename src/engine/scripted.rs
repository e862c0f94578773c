//! A scripted in-memory animation backend for fault injection testing.
//!
//! [`ScriptedEngine`] implements [`AnimationBackend`] without any real
//! runtime behind it and follows a configurable script: loads that fail,
//! controls that take a number of discovery attempts to appear, controls
//! that never appear, pulse primitives that are absent or failing. This is
//! how the synchronizer's bounded-retry discovery, pulse synthesis, and
//! failure tolerance are exercised deterministically — and it doubles as a
//! headless backend for demos and simulations.
//!
//! # Example
//!
//! ```
//! use catbox_engine::{ScriptedEngine, ScriptedEngineConfig};
//!
//! // Controls appear only on the fourth discovery attempt
//! let engine = ScriptedEngine::new(ScriptedEngineConfig::delayed(3));
//! assert_eq!(engine.stats().loads_attempted, 0);
//! ```

use std::collections::BTreeMap;

use crate::engine::backend::{AnimationBackend, ControlRef, EngineHandle};
use crate::EngineError;

/// Script followed by a [`ScriptedEngine`].
///
/// All counters default to zero and all capabilities default to present, so
/// the default script is a well-behaved runtime that loads instantly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedEngineConfig {
    /// Number of `begin_load` calls that fail before loads succeed
    /// (default: 0)
    pub failing_loads: u32,

    /// Per-control number of discovery attempts that return absent before
    /// the control appears (default: 0, controls appear immediately)
    pub discovery_delay_attempts: u32,

    /// Control names that never appear, regardless of attempts
    /// (default: empty)
    pub missing_controls: Vec<String>,

    /// Whether controls expose an edge-triggered pulse primitive. When
    /// `false`, `pulse_control` reports [`EngineError::PulseUnsupported`]
    /// and callers must synthesize pulses via `set_control`
    /// (default: true)
    pub edge_triggered: bool,

    /// Whether control invocations (pulse and level) fail (default: false)
    pub failing_controls: bool,
}

impl Default for ScriptedEngineConfig {
    fn default() -> Self {
        Self {
            failing_loads: 0,
            discovery_delay_attempts: 0,
            missing_controls: Vec::new(),
            edge_triggered: true,
            failing_controls: false,
        }
    }
}

impl ScriptedEngineConfig {
    /// A well-behaved runtime: loads succeed and controls appear on the
    /// first discovery attempt.
    #[must_use]
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Controls appear only after `attempts` absent discovery attempts,
    /// simulating the runtime's asynchronous graph initialization.
    #[must_use]
    pub fn delayed(attempts: u32) -> Self {
        Self {
            discovery_delay_attempts: attempts,
            ..Self::default()
        }
    }

    /// No control ever appears, simulating an asset whose state machine
    /// never initializes. Discovery runs to its attempt ceiling.
    #[must_use]
    pub fn never_ready() -> Self {
        Self {
            discovery_delay_attempts: u32::MAX,
            ..Self::default()
        }
    }

    /// Controls expose only a boolean level, forcing callers to synthesize
    /// pulses.
    #[must_use]
    pub fn level_only() -> Self {
        Self {
            edge_triggered: false,
            ..Self::default()
        }
    }
}

/// Counters observed by tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedEngineStats {
    /// Calls to `begin_load`, successful or not.
    pub loads_attempted: u64,
    /// `begin_load` calls that failed per the script.
    pub loads_failed: u64,
    /// Calls to `discover_control`.
    pub discovery_calls: u64,
    /// Successful edge-triggered pulses.
    pub pulses: u64,
    /// Successful level sets.
    pub level_sets: u64,
    /// Calls to `stop`.
    pub stops: u64,
    /// Calls to `dispose`.
    pub disposes: u64,
}

#[derive(Debug)]
struct Instance {
    disposed: bool,
    stopped: bool,
    // attempts and issued refs per control name
    discovery_attempts: BTreeMap<String, u32>,
    controls: BTreeMap<String, u64>,
}

impl Instance {
    fn new() -> Self {
        Self {
            disposed: false,
            stopped: false,
            discovery_attempts: BTreeMap::new(),
            controls: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
struct ControlState {
    instance: u64,
    name: String,
    level: bool,
}

/// A deterministic, scriptable [`AnimationBackend`].
///
/// See the [module documentation](self) for usage.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    config: ScriptedEngineConfig,
    stats: ScriptedEngineStats,
    next_handle: u64,
    next_control: u64,
    instances: BTreeMap<u64, Instance>,
    controls: BTreeMap<u64, ControlState>,
    last_pulsed: Option<String>,
}

impl ScriptedEngine {
    /// Creates an engine following the given script.
    #[must_use]
    pub fn new(config: ScriptedEngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The script in effect.
    #[must_use]
    pub fn config(&self) -> &ScriptedEngineConfig {
        &self.config
    }

    /// Replaces the script mid-run. Already-issued handles and refs keep
    /// their state; only future calls follow the new script.
    pub fn set_config(&mut self, config: ScriptedEngineConfig) {
        self.config = config;
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &ScriptedEngineStats {
        &self.stats
    }

    /// Name of the control most recently pulsed (edge-triggered only).
    #[must_use]
    pub fn last_pulsed(&self) -> Option<&str> {
        self.last_pulsed.as_deref()
    }

    /// Current level of the named control on the given instance, if the
    /// control has been discovered.
    #[must_use]
    pub fn control_level(&self, handle: EngineHandle, name: &str) -> Option<bool> {
        let instance = self.instances.get(&handle.as_u64())?;
        let control_id = instance.controls.get(name)?;
        self.controls.get(control_id).map(|state| state.level)
    }

    /// Number of instances that have been loaded and not yet disposed.
    #[must_use]
    pub fn live_instances(&self) -> usize {
        self.instances
            .values()
            .filter(|instance| !instance.disposed)
            .count()
    }

    fn control_mut(&mut self, control: ControlRef) -> Result<&mut ControlState, EngineError> {
        let state = self
            .controls
            .get_mut(&control.as_u64())
            .ok_or(EngineError::Disposed)?;
        let disposed = self
            .instances
            .get(&state.instance)
            .map_or(true, |instance| instance.disposed);
        if disposed {
            return Err(EngineError::Disposed);
        }
        Ok(state)
    }
}

impl AnimationBackend for ScriptedEngine {
    fn begin_load(&mut self, source: &str) -> Result<EngineHandle, EngineError> {
        self.stats.loads_attempted += 1;
        if self.config.failing_loads > 0 {
            self.config.failing_loads -= 1;
            self.stats.loads_failed += 1;
            return Err(EngineError::LoadFailure {
                source: source.to_owned(),
                reason: "scripted load failure".to_owned(),
            });
        }
        self.next_handle += 1;
        self.instances.insert(self.next_handle, Instance::new());
        Ok(EngineHandle::new(self.next_handle))
    }

    fn discover_control(&mut self, handle: EngineHandle, name: &str) -> Option<ControlRef> {
        self.stats.discovery_calls += 1;
        if self.config.missing_controls.iter().any(|missing| missing == name) {
            return None;
        }
        let delay = self.config.discovery_delay_attempts;
        let next_control = self.next_control + 1;
        let instance = self.instances.get_mut(&handle.as_u64())?;
        if instance.disposed {
            return None;
        }
        if let Some(existing) = instance.controls.get(name) {
            return Some(ControlRef::new(*existing));
        }
        let attempts = instance
            .discovery_attempts
            .entry(name.to_owned())
            .or_insert(0);
        if *attempts < delay {
            *attempts = attempts.saturating_add(1);
            return None;
        }
        instance.controls.insert(name.to_owned(), next_control);
        self.next_control = next_control;
        self.controls.insert(
            next_control,
            ControlState {
                instance: handle.as_u64(),
                name: name.to_owned(),
                level: false,
            },
        );
        Some(ControlRef::new(next_control))
    }

    fn pulse_control(&mut self, control: ControlRef) -> Result<(), EngineError> {
        if !self.config.edge_triggered {
            return Err(EngineError::PulseUnsupported);
        }
        if self.config.failing_controls {
            return Err(EngineError::ControlFailure {
                reason: "scripted control failure".to_owned(),
            });
        }
        let name = self.control_mut(control)?.name.clone();
        self.stats.pulses += 1;
        self.last_pulsed = Some(name);
        Ok(())
    }

    fn set_control(&mut self, control: ControlRef, level: bool) -> Result<(), EngineError> {
        if self.config.failing_controls {
            return Err(EngineError::ControlFailure {
                reason: "scripted control failure".to_owned(),
            });
        }
        self.control_mut(control)?.level = level;
        self.stats.level_sets += 1;
        Ok(())
    }

    fn stop(&mut self, handle: EngineHandle) {
        self.stats.stops += 1;
        if let Some(instance) = self.instances.get_mut(&handle.as_u64()) {
            instance.stopped = true;
        }
    }

    fn dispose(&mut self, handle: EngineHandle) {
        self.stats.disposes += 1;
        if let Some(instance) = self.instances.get_mut(&handle.as_u64()) {
            instance.disposed = true;
        }
    }
}
