//! Fixed clock with observable enable/disable bookkeeping

use super::{Clock, ClockError, ClockResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Enable/disable/release counts shared between a clock and whoever
/// created it, so the provider can see what consumers did with it.
#[derive(Debug, Default)]
pub struct ClockCounters {
    enables: AtomicU32,
    disables: AtomicU32,
    releases: AtomicU32,
}

impl ClockCounters {
    /// Number of successful prepare_enable calls
    pub fn enables(&self) -> u32 {
        self.enables.load(Ordering::Relaxed)
    }

    /// Number of effective disable_unprepare calls
    pub fn disables(&self) -> u32 {
        self.disables.load(Ordering::Relaxed)
    }

    /// Number of times a consumer dropped its handle
    pub fn releases(&self) -> u32 {
        self.releases.load(Ordering::Relaxed)
    }
}

/// Always-present clock, the way a board oscillator shows up in a device tree
#[derive(Debug)]
pub struct FixedClock {
    name: String,
    gated: bool,
    enabled: bool,
    counters: Arc<ClockCounters>,
}

impl FixedClock {
    /// Create a new clock that can be enabled
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            gated: false,
            enabled: false,
            counters: Arc::new(ClockCounters::default()),
        }
    }

    /// Create a clock whose provider refuses to enable it
    pub fn gated(name: &str) -> Self {
        let mut clk = Self::new(name);
        clk.gated = true;
        clk
    }

    /// Shared counters for this clock
    pub fn counters(&self) -> Arc<ClockCounters> {
        Arc::clone(&self.counters)
    }
}

impl Clock for FixedClock {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare_enable(&mut self) -> ClockResult<()> {
        if self.gated {
            return Err(ClockError::Gated);
        }
        if self.enabled {
            return Err(ClockError::AlreadyEnabled);
        }
        self.enabled = true;
        self.counters.enables.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn disable_unprepare(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.counters.disables.fetch_add(1, Ordering::Relaxed);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for FixedClock {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::Relaxed);
    }
}
