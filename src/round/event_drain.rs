//! The zero-allocation draining iterator over queued round events.

use std::collections::vec_deque::Drain;
use std::iter::FusedIterator;

/// A zero-allocation opaque iterator that drains queued events.
///
/// Wraps the internal event queue drain so the public API does not expose
/// `std::collections::vec_deque::Drain` directly. Implements [`Iterator`],
/// [`ExactSizeIterator`], and [`FusedIterator`].
///
/// Obtain one from [`RoundController::events()`] (yielding
/// [`RoundEvent`](crate::RoundEvent)s) or [`AnimationSynchronizer::poll()`]
/// (yielding [`EngineEvent`](crate::EngineEvent)s).
///
/// # Examples
///
/// ```ignore
/// for event in round.events() {
///     match event {
///         RoundEvent::PhaseChanged { phase } => { /* update the view */ }
///         _ => { /* handle other events */ }
///     }
/// }
/// ```
///
/// [`RoundController::events()`]: crate::RoundController::events
/// [`AnimationSynchronizer::poll()`]: crate::AnimationSynchronizer::poll
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct EventDrain<'a, E> {
    inner: Drain<'a, E>,
}

impl<'a, E> EventDrain<'a, E> {
    pub(crate) fn from_drain(drain: Drain<'a, E>) -> Self {
        Self { inner: drain }
    }
}

impl<E> Iterator for EventDrain<'_, E> {
    type Item = E;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<E> ExactSizeIterator for EventDrain<'_, E> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<E> FusedIterator for EventDrain<'_, E> {}

impl<E> std::fmt::Debug for EventDrain<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDrain")
            .field("remaining", &self.len())
            .finish()
    }
}
