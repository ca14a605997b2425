//! Platform bus: binds devices to a single driver type

use super::{driver_matches, PlatformDevice, PlatformDriver, PlatformError, PlatformResult};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Bus that matches devices against driver `D` and keeps the bound ones
pub struct PlatformBus<D: PlatformDriver> {
    ctx: D::Context,
    bound: BTreeMap<i32, D::Device>,
}

impl<D: PlatformDriver> PlatformBus<D> {
    /// Create a bus with the host context handed to every probe/remove
    pub fn new(ctx: D::Context) -> Self {
        Self {
            ctx,
            bound: BTreeMap::new(),
        }
    }

    /// Add a device and probe it if the driver matches, returning the
    /// freshly bound driver state
    pub fn add_device(&mut self, pdev: PlatformDevice) -> PlatformResult<&mut D::Device> {
        if !driver_matches::<D>(&pdev) {
            debug!(dev = %pdev.dev_name(), driver = D::NAME, "no match");
            return Err(PlatformError::NoMatch(pdev.dev_name()));
        }

        let id = pdev.id();
        if self.bound.contains_key(&id) {
            return Err(PlatformError::DuplicateId(id));
        }

        let dev_name = pdev.dev_name();
        match D::probe(pdev, &mut self.ctx) {
            Ok(dev) => {
                info!(dev = %dev_name, driver = D::NAME, "bound");
                Ok(self.bound.entry(id).or_insert(dev))
            }
            Err(e) => {
                warn!(dev = %dev_name, driver = D::NAME, errno = e.errno(), "probe failed: {}", e);
                Err(e)
            }
        }
    }

    /// Unbind and remove the device with instance id `id`
    pub fn remove_device(&mut self, id: i32) -> PlatformResult<()> {
        let dev = self.bound.remove(&id).ok_or(PlatformError::NotBound(id))?;
        D::remove(dev, &mut self.ctx);
        info!(id, driver = D::NAME, "unbound");
        Ok(())
    }

    /// Bound driver state for instance `id`
    pub fn device(&self, id: i32) -> Option<&D::Device> {
        self.bound.get(&id)
    }

    /// Mutable bound driver state for instance `id`
    pub fn device_mut(&mut self, id: i32) -> Option<&mut D::Device> {
        self.bound.get_mut(&id)
    }

    /// Instance ids of all bound devices, ascending
    pub fn bound_ids(&self) -> Vec<i32> {
        self.bound.keys().copied().collect()
    }

    pub fn context(&self) -> &D::Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut D::Context {
        &mut self.ctx
    }
}

impl<D: PlatformDriver> Drop for PlatformBus<D> {
    fn drop(&mut self) {
        let bound = std::mem::take(&mut self.bound);
        for (id, dev) in bound {
            debug!(id, driver = D::NAME, "unbinding on bus teardown");
            D::remove(dev, &mut self.ctx);
        }
    }
}
