//! Sub-device registry
//!
//! Sensors register here at probe time; the capture framework picks them
//! up by name when it assembles the pipeline.

use thiserror::Error;
use tracing::debug;

/// Registry operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A sub-device with this name is already registered
    #[error("sub-device {0:?} already registered")]
    AlreadyRegistered(String),
    /// No sub-device with this name is registered
    #[error("sub-device {0:?} not registered")]
    NotRegistered(String),
}

impl RegistryError {
    /// Negative errno as reported across the host ABI
    pub fn errno(&self) -> i32 {
        match self {
            RegistryError::AlreadyRegistered(_) => -libc::EBUSY,
            RegistryError::NotRegistered(_) => -libc::ENOENT,
        }
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registration/unregistration pair the capture framework exposes
pub trait SubdevRegistry {
    /// Make a sub-device available under `name`
    fn register_subdev(&mut self, name: &str) -> RegistryResult<()>;

    /// Withdraw a previously registered sub-device
    fn unregister_subdev(&mut self, name: &str) -> RegistryResult<()>;

    /// Check if `name` is currently registered
    fn is_registered(&self, name: &str) -> bool;
}

/// In-memory registry, kept in registration order
#[derive(Debug, Default)]
pub struct AsyncSubdevRegistry {
    names: Vec<String>,
}

impl AsyncSubdevRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered sub-device names, oldest first
    pub fn registered(&self) -> &[String] {
        &self.names
    }
}

impl SubdevRegistry for AsyncSubdevRegistry {
    fn register_subdev(&mut self, name: &str) -> RegistryResult<()> {
        if self.is_registered(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_owned()));
        }
        self.names.push(name.to_owned());
        debug!(subdev = name, "registered");
        Ok(())
    }

    fn unregister_subdev(&mut self, name: &str) -> RegistryResult<()> {
        let pos = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_owned()))?;
        self.names.remove(pos);
        debug!(subdev = name, "unregistered");
        Ok(())
    }

    fn is_registered(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
