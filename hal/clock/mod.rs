//! Clock HAL
//!
//! Coarse clock control: a consumer prepares/enables a clock while it needs
//! it and disables/unprepares it when done. Rate handling is not modelled.

mod fixed;

pub use fixed::{ClockCounters, FixedClock};

use core::fmt;
use thiserror::Error;

/// Clock operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    /// Clock is gated off by its provider and cannot be enabled
    #[error("clock is gated by its provider")]
    Gated,
    /// Clock is already enabled by this consumer
    #[error("clock already enabled")]
    AlreadyEnabled,
}

impl ClockError {
    /// Negative errno as reported across the host ABI
    pub fn errno(&self) -> i32 {
        match self {
            ClockError::Gated => -libc::EIO,
            ClockError::AlreadyEnabled => -libc::EBUSY,
        }
    }
}

/// Result type for clock operations
pub type ClockResult<T> = Result<T, ClockError>;

/// A named clock handed out by a platform device
pub trait Clock: fmt::Debug {
    /// Name the clock was registered under (e.g. `csi_mclk`)
    fn name(&self) -> &str;

    /// Prepare and enable the clock
    fn prepare_enable(&mut self) -> ClockResult<()>;

    /// Disable and unprepare the clock. No-op when it is not enabled.
    fn disable_unprepare(&mut self);

    /// Check if the clock is currently enabled
    fn is_enabled(&self) -> bool;
}
