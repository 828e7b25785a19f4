//! Advisory power hint.
//!
//! Hosts that can throttle or suspend the process while idle can implement
//! [`PowerHint`] to keep the device awake while downloads are active. The
//! registry calls `acquire` when the first task becomes active and
//! `release` when the last one terminates.

/// Hook notified when the set of active downloads becomes non-empty or empty.
pub trait PowerHint: Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// [`PowerHint`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPowerHint;

impl PowerHint for NoopPowerHint {
    fn acquire(&self) {}
    fn release(&self) {}
}
