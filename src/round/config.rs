//! Timing configuration for the engine and round state machines.
//!
//! All defaults match the authored game: the discovery poll bounds come from
//! the animation runtime's observed initialization jitter, the playback
//! window matches the authored animation length, and the reveal delay is the
//! suspenseful "checking the box" period.

use web_time::Duration;

/// Timing configuration for the [`AnimationSynchronizer`].
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions. To ensure your
/// code continues to compile, always use the `..Default::default()` or
/// `..EngineTimings::default()` pattern when constructing instances.
///
/// # Example
///
/// ```
/// use catbox_engine::EngineTimings;
/// use web_time::Duration;
///
/// // A slower host page can afford a longer discovery budget
/// let patient = EngineTimings {
///     max_discovery_attempts: 60,
///     ..EngineTimings::default()
/// };
/// assert!(patient.discovery_interval > Duration::ZERO);
/// ```
///
/// [`AnimationSynchronizer`]: crate::AnimationSynchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "EngineTimings has no effect unless passed to RoundBuilder::with_engine_timings()"]
pub struct EngineTimings {
    /// Interval between control-input discovery attempts while the runtime's
    /// internal graph initializes.
    ///
    /// Default: 150ms
    pub discovery_interval: Duration,

    /// Maximum number of discovery attempts (including the immediate attempt
    /// on load) before the load is reported failed. With the default
    /// interval this bounds the worst-case wait to roughly 4.5 seconds.
    ///
    /// Default: 30
    pub max_discovery_attempts: u32,

    /// How long a synthesized pulse holds a boolean control high before
    /// clearing it, so the runtime observes a rising edge rather than a held
    /// level. Only used for controls without an edge-triggered primitive.
    ///
    /// Default: 100ms
    pub pulse_clear_delay: Duration,

    /// How long a torn-down instance is given to wind down its render loop
    /// before a fresh instance may be mounted.
    ///
    /// Default: 500ms
    pub settle_delay: Duration,

    /// Length of the playback window started by an accepted fire. Matches
    /// the authored animation length, so the completion event lands as the
    /// animation visually finishes.
    ///
    /// Default: 9000ms
    pub playback_duration: Duration,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            discovery_interval: Duration::from_millis(150),
            max_discovery_attempts: 30,
            pulse_clear_delay: Duration::from_millis(100),
            settle_delay: Duration::from_millis(500),
            playback_duration: Duration::from_millis(9000),
        }
    }
}

impl EngineTimings {
    /// Creates timings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Millisecond-scale timings for tests and development.
    ///
    /// Keeps every state transition observable without waiting out authored
    /// durations. Not intended for production: the playback window no longer
    /// matches the authored animation, so the reveal would land mid-motion.
    pub fn snappy() -> Self {
        Self {
            discovery_interval: Duration::from_millis(5),
            max_discovery_attempts: 10,
            pulse_clear_delay: Duration::from_millis(2),
            settle_delay: Duration::from_millis(10),
            playback_duration: Duration::from_millis(50),
        }
    }
}

/// Timing configuration for the [`RoundController`].
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions; construct with
/// `..RoundTimings::default()`.
///
/// [`RoundController`]: crate::RoundController
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "RoundTimings has no effect unless passed to RoundBuilder::with_round_timings()"]
pub struct RoundTimings {
    /// The suspenseful "checking the box" period between the player's guess
    /// and the opponent draw.
    ///
    /// Default: 3000ms
    pub reveal_delay: Duration,
}

impl Default for RoundTimings {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(3000),
        }
    }
}

impl RoundTimings {
    /// Creates timings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Millisecond-scale timings for tests and development.
    pub fn snappy() -> Self {
        Self {
            reveal_delay: Duration::from_millis(20),
        }
    }
}
