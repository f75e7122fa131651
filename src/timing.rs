//! Bounded busy-wait support
//!
//! Every wait the driver performs (mode confirmation, image calibration,
//! transmit completion) spins against a monotonic millisecond [`Clock`] until
//! a condition holds or a deadline passes. Nothing here sleeps.

/// Mode change confirmation bound
pub const MODE_TIMEOUT_MS: u32 = 20;
/// Image calibration bound
pub const IMAGE_CAL_TIMEOUT_MS: u32 = 20;
/// Transmit completion bound
pub const TX_TIMEOUT_MS: u32 = 4000;

/// Monotonic millisecond counter.
///
/// The counter may wrap; only differences between readings are used.
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&mut self) -> u32;
}

impl<F> Clock for F
where
    F: FnMut() -> u32,
{
    fn now_ms(&mut self) -> u32 {
        self()
    }
}

/// A point in time after which a wait is abandoned.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: u32,
    timeout_ms: u32,
}

impl Deadline {
    /// Starts a deadline `timeout_ms` from now.
    pub fn start<C: Clock>(clock: &mut C, timeout_ms: u32) -> Self {
        Self {
            start: clock.now_ms(),
            timeout_ms,
        }
    }

    /// True once `timeout_ms` or more have elapsed since [`Deadline::start`].
    pub fn has_expired<C: Clock>(&self, clock: &mut C) -> bool {
        clock.now_ms().wrapping_sub(self.start) >= self.timeout_ms
    }
}

/// Polls `ready` until it returns `true` or `timeout_ms` elapses.
///
/// The condition is checked before the deadline, so a condition that already
/// holds costs a single poll. Returns `Ok(false)` on timeout; errors from
/// `ready` end the wait immediately.
pub fn wait_until<C, E, F>(clock: &mut C, timeout_ms: u32, mut ready: F) -> Result<bool, E>
where
    C: Clock,
    F: FnMut() -> Result<bool, E>,
{
    let deadline = Deadline::start(clock, timeout_ms);
    loop {
        if ready()? {
            return Ok(true);
        }
        if deadline.has_expired(clock) {
            return Ok(false);
        }
    }
}
