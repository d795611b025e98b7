//! Thread-safe request counter for command headers.
//!
//! # Why a counter? (for beginners)
//!
//! UDP gives no guarantee that a reply belongs to the request you just sent:
//! a late reply to an earlier request can arrive instead.  Every command
//! therefore carries a per-client number that the device echoes back.  The
//! client only accepts a reply whose number matches the request it is waiting
//! on.
//!
//! The counter is an `AtomicU32`, so several tasks can build headers at the
//! same time without handing out the same number twice.

use std::sync::atomic::{AtomicU32, Ordering};

/// A thread-safe, monotonically increasing counter for header sequence numbers.
///
/// Starts at 0 and wraps from `u32::MAX` back to 0 without panicking.
///
/// # Examples
///
/// ```rust
/// use kmbox_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SequenceCounter {
    inner: AtomicU32,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU32::new(0),
        }
    }

    /// Returns the current value and advances the counter by one.
    ///
    /// `Relaxed` is enough: the value orders requests, it does not publish memory.
    pub fn next(&self) -> u32 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the value the next call to [`SequenceCounter::next`] would hand out.
    pub fn current(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }
}
