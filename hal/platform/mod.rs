//! Platform device/driver HAL
//!
//! A platform device describes one instance of a non-discoverable block
//! (name, instance id, device-tree `compatible` string, clock resources).
//! A platform driver declares which devices it handles through a match table
//! and gets `probe`d/`remove`d by the [`PlatformBus`].

mod bus;

pub use bus::PlatformBus;

use crate::clock::Clock;
use core::fmt;
use thiserror::Error;

/// Instance id used when a device is the only one of its kind
pub const PLATFORM_DEVID_NONE: i32 = -1;

/// Platform operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Named clock resource is not present on the device
    #[error("clock {0:?} not found")]
    ClockNotFound(String),
    /// No driver on the bus matches the device
    #[error("no driver matches device {0:?}")]
    NoMatch(String),
    /// A device with this instance id is already bound
    #[error("device id {0} already bound")]
    DuplicateId(i32),
    /// No bound device with this instance id
    #[error("device id {0} not bound")]
    NotBound(i32),
}

impl PlatformError {
    /// Negative errno as reported across the host ABI
    pub fn errno(&self) -> i32 {
        match self {
            PlatformError::ClockNotFound(_) => -libc::ENOENT,
            PlatformError::NoMatch(_) => -libc::ENODEV,
            PlatformError::DuplicateId(_) => -libc::EEXIST,
            PlatformError::NotBound(_) => -libc::ENODEV,
        }
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Device-tree match entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfDeviceId {
    pub compatible: &'static str,
}

/// Static module metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub author: &'static str,
    pub description: &'static str,
    pub license: &'static str,
    pub version: &'static str,
    /// Alias used by the host to load the module on demand
    pub alias: &'static str,
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "description: {}", self.description)?;
        writeln!(f, "author:      {}", self.author)?;
        writeln!(f, "license:     {}", self.license)?;
        writeln!(f, "version:     {}", self.version)?;
        write!(f, "alias:       {}", self.alias)
    }
}

/// One platform device instance
#[derive(Debug)]
pub struct PlatformDevice {
    name: String,
    id: i32,
    compatible: Option<String>,
    clocks: Vec<Box<dyn Clock>>,
}

impl PlatformDevice {
    /// Create a new platform device with no resources
    pub fn new(name: &str, id: i32) -> Self {
        Self {
            name: name.to_owned(),
            id,
            compatible: None,
            clocks: Vec::new(),
        }
    }

    /// Set the device-tree `compatible` string
    pub fn with_compatible(mut self, compatible: &str) -> Self {
        self.compatible = Some(compatible.to_owned());
        self
    }

    /// Attach a named clock resource
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clocks.push(clock);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn compatible(&self) -> Option<&str> {
        self.compatible.as_deref()
    }

    /// Device name as the host prints it: `name.id`, or just `name` for
    /// [`PLATFORM_DEVID_NONE`]
    pub fn dev_name(&self) -> String {
        if self.id == PLATFORM_DEVID_NONE {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.id)
        }
    }

    /// Take the clock named `name`. The caller owns it from here on.
    pub fn clk_get(&mut self, name: &str) -> PlatformResult<Box<dyn Clock>> {
        let pos = self
            .clocks
            .iter()
            .position(|clk| clk.name() == name)
            .ok_or_else(|| PlatformError::ClockNotFound(name.to_owned()))?;
        Ok(self.clocks.swap_remove(pos))
    }
}

/// Driver for a class of platform devices
///
/// `Context` is whatever host state the driver needs at probe/remove time
/// (a registry, a parent device); the bus owns it and lends it out.
pub trait PlatformDriver {
    /// Driver state for one bound device
    type Device;
    /// Host state shared by all bound devices
    type Context;

    /// Driver name, also used for name-based matching
    const NAME: &'static str;
    /// Device-tree match table
    const OF_MATCH_TABLE: &'static [OfDeviceId];

    /// Bind to a device. On error nothing stays bound.
    fn probe(pdev: PlatformDevice, ctx: &mut Self::Context) -> PlatformResult<Self::Device>;

    /// Unbind from a device, releasing everything probe acquired
    fn remove(dev: Self::Device, ctx: &mut Self::Context);
}

/// Check whether `D` handles `pdev`: a device-tree match wins, otherwise
/// the device name must equal the driver name.
pub fn driver_matches<D: PlatformDriver>(pdev: &PlatformDevice) -> bool {
    if let Some(compatible) = pdev.compatible() {
        if D::OF_MATCH_TABLE.iter().any(|id| id.compatible == compatible) {
            return true;
        }
    }
    pdev.name() == D::NAME
}
