//! Cyclops dummy sensor
//!
//! Answers format negotiation from a fixed table and a fixed resolution.
//! Only the active format is kept; try formats are rejected since the
//! capture engine never negotiates with this sensor.

use super::{find_pixel_format, PIXEL_FORMATS, SENSOR_CLOCK, SENSOR_HEIGHT, SENSOR_WIDTH};
use crate::clock::Clock;
use crate::platform::{ModuleInfo, OfDeviceId, PlatformDevice, PlatformDriver, PlatformResult};
use crate::v4l2::{
    subdev_name, Field, FormatWhich, FrameSizeRange, MbusCode, MbusFramefmt, SubdevError,
    SubdevPadOps, SubdevRegistry, SubdevResult, SubdevVideoOps, V4l2Subdev,
};
use tracing::{debug, error, info, warn};

pub const MODULE_INFO: ModuleInfo = ModuleInfo {
    author: "Vital Biosciences",
    description: "Vital dummy camera sensor driver for Cyclops",
    license: "Proprietary",
    version: "1.0",
    alias: "platform:vital_cyclops_sensor_dummy",
};

/// Bound Cyclops dummy sensor
#[derive(Debug)]
pub struct CyclopsSensorDummy {
    name: String,
    pdev: PlatformDevice,
    clk: Box<dyn Clock>,
    selected_code: MbusCode,
    // Only an instance that registered itself may unregister
    registered: bool,
}

impl CyclopsSensorDummy {
    /// Platform device this sensor is bound to
    pub fn platform_device(&self) -> &PlatformDevice {
        &self.pdev
    }

    /// Media bus code of the active format
    pub fn selected_code(&self) -> MbusCode {
        self.selected_code
    }

    /// Sensor master clock
    pub fn clock(&self) -> &dyn Clock {
        self.clk.as_ref()
    }

    fn active_format(&self) -> MbusFramefmt {
        let colorspace = find_pixel_format(self.selected_code)
            .map(|fmt| fmt.colorspace)
            .unwrap_or_default();
        MbusFramefmt {
            width: SENSOR_WIDTH,
            height: SENSOR_HEIGHT,
            code: self.selected_code,
            field: Field::None,
            colorspace,
        }
    }

    fn check_which(&self, op: &str, which: FormatWhich) -> SubdevResult<()> {
        if which != FormatWhich::Active {
            error!(
                dev = %self.pdev.dev_name(),
                "{} with which != active - dummy driver does not support negotiation", op
            );
            return Err(SubdevError::UnsupportedScope(which));
        }
        Ok(())
    }
}

impl SubdevPadOps for CyclopsSensorDummy {
    fn enum_mbus_code(&self, pad: u32, index: u32) -> SubdevResult<MbusCode> {
        if pad != 0 {
            return Err(SubdevError::InvalidPad(pad));
        }
        PIXEL_FORMATS
            .get(index as usize)
            .map(|fmt| fmt.code)
            .ok_or(SubdevError::IndexOutOfRange(index))
    }

    fn enum_frame_size(&self, _pad: u32, index: u32) -> SubdevResult<FrameSizeRange> {
        if index != 0 {
            return Err(SubdevError::IndexOutOfRange(index));
        }
        Ok(FrameSizeRange::discrete(SENSOR_WIDTH, SENSOR_HEIGHT))
    }

    fn get_fmt(&self, _pad: u32, which: FormatWhich) -> SubdevResult<MbusFramefmt> {
        self.check_which("get_fmt", which)?;
        Ok(self.active_format())
    }

    fn set_fmt(
        &mut self,
        _pad: u32,
        which: FormatWhich,
        format: MbusFramefmt,
    ) -> SubdevResult<MbusFramefmt> {
        self.check_which("set_fmt", which)?;

        if find_pixel_format(format.code).is_none() {
            error!(dev = %self.pdev.dev_name(), "set_fmt with unsupported mbus code {}", format.code.0);
            return Err(SubdevError::UnsupportedCode(format.code));
        }

        // Resolution is fixed; only the code is taken from the request
        self.selected_code = format.code;
        debug!(dev = %self.pdev.dev_name(), code = %format.code, "format set");
        Ok(self.active_format())
    }
}

impl SubdevVideoOps for CyclopsSensorDummy {
    fn s_stream(&mut self, enable: bool) -> SubdevResult<()> {
        debug!(dev = %self.pdev.dev_name(), enable, "s_stream");
        Ok(())
    }
}

impl V4l2Subdev for CyclopsSensorDummy {
    fn name(&self) -> &str {
        &self.name
    }
}

impl PlatformDriver for CyclopsSensorDummy {
    type Device = CyclopsSensorDummy;
    type Context = Box<dyn SubdevRegistry>;

    const NAME: &'static str = "cyclops_sensor_dummy";
    const OF_MATCH_TABLE: &'static [OfDeviceId] = &[OfDeviceId {
        compatible: "vital,cyclops_sensor_dummy",
    }];

    fn probe(mut pdev: PlatformDevice, registry: &mut Self::Context) -> PlatformResult<Self> {
        let dev = pdev.dev_name();
        info!(dev = %dev, "Vital Cyclops sensor dummy driver probing");

        let mut clk = pdev.clk_get(SENSOR_CLOCK).inspect_err(|_| {
            error!(dev = %dev, "failed to get {}", SENSOR_CLOCK);
        })?;

        if let Err(e) = clk.prepare_enable() {
            warn!(dev = %dev, errno = e.errno(), "failed to enable {}: {}", SENSOR_CLOCK, e);
        }

        let name = subdev_name(&format!("{} {}", Self::NAME, pdev.id()));

        let registered = match registry.register_subdev(&name) {
            Ok(()) => true,
            Err(e) => {
                error!(dev = %dev, ret = e.errno(), "Async register failed: {}", e);
                false
            }
        };

        info!(dev = %dev, subdev = %name, "probe complete");
        Ok(Self {
            name,
            pdev,
            clk,
            selected_code: PIXEL_FORMATS[0].code,
            registered,
        })
    }

    fn remove(mut dev: Self, registry: &mut Self::Context) {
        if dev.registered {
            if let Err(e) = registry.unregister_subdev(&dev.name) {
                warn!(dev = %dev.pdev.dev_name(), "unregister failed: {}", e);
            }
        }
        dev.clk.disable_unprepare();
        debug!(dev = %dev.pdev.dev_name(), "removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockCounters, FixedClock};
    use crate::v4l2::{AsyncSubdevRegistry, Colorspace, RegistryError, RegistryResult};
    use std::sync::Arc;

    /// Registry that refuses every registration
    struct RejectingRegistry;

    impl SubdevRegistry for RejectingRegistry {
        fn register_subdev(&mut self, name: &str) -> RegistryResult<()> {
            Err(RegistryError::AlreadyRegistered(name.to_owned()))
        }

        fn unregister_subdev(&mut self, name: &str) -> RegistryResult<()> {
            Err(RegistryError::NotRegistered(name.to_owned()))
        }

        fn is_registered(&self, _name: &str) -> bool {
            false
        }
    }

    fn registry() -> Box<dyn SubdevRegistry> {
        Box::new(AsyncSubdevRegistry::new())
    }

    fn pdev_with(clk: FixedClock) -> PlatformDevice {
        PlatformDevice::new("cyclops_sensor_dummy", 0)
            .with_compatible("vital,cyclops_sensor_dummy")
            .with_clock(Box::new(clk))
    }

    fn probe() -> (CyclopsSensorDummy, Box<dyn SubdevRegistry>, Arc<ClockCounters>) {
        let clk = FixedClock::new(SENSOR_CLOCK);
        let counters = clk.counters();
        let mut registry = registry();
        let sensor = CyclopsSensorDummy::probe(pdev_with(clk), &mut registry).unwrap();
        (sensor, registry, counters)
    }

    #[test]
    fn enum_mbus_code_walks_table() {
        let (sensor, _registry, _) = probe();
        assert_eq!(sensor.enum_mbus_code(0, 0), Ok(MbusCode::Y8_1X8));
        assert_eq!(sensor.enum_mbus_code(0, 1), Ok(MbusCode::Y10_1X10));
        assert_eq!(sensor.enum_mbus_code(0, 2), Err(SubdevError::IndexOutOfRange(2)));
        assert_eq!(sensor.enum_mbus_code(1, 0), Err(SubdevError::InvalidPad(1)));
    }

    #[test]
    fn enum_frame_size_has_single_entry() {
        let (sensor, _registry, _) = probe();
        let range = sensor.enum_frame_size(0, 0).unwrap();
        assert_eq!(range, FrameSizeRange::discrete(4208, 3118));
        assert_eq!(sensor.enum_frame_size(0, 1), Err(SubdevError::IndexOutOfRange(1)));
    }

    #[test]
    fn default_format_after_probe() {
        let (sensor, _registry, _) = probe();
        let fmt = sensor.get_fmt(0, FormatWhich::Active).unwrap();
        assert_eq!(fmt.width, 4208);
        assert_eq!(fmt.height, 3118);
        assert_eq!(fmt.code, MbusCode::Y8_1X8);
        assert_eq!(fmt.field, Field::None);
        assert_eq!(fmt.colorspace, Colorspace::Raw);
    }

    #[test]
    fn set_fmt_persists_code_and_keeps_resolution() {
        let (mut sensor, _registry, _) = probe();
        let request = MbusFramefmt {
            width: 640,
            height: 480,
            ..MbusFramefmt::with_code(MbusCode::Y10_1X10)
        };

        let applied = sensor.set_fmt(0, FormatWhich::Active, request).unwrap();
        assert_eq!(applied.width, 4208);
        assert_eq!(applied.height, 3118);
        assert_eq!(applied.field, Field::None);

        let fmt = sensor.get_fmt(0, FormatWhich::Active).unwrap();
        assert_eq!(fmt.code, MbusCode::Y10_1X10);
        assert_eq!(sensor.selected_code(), MbusCode::Y10_1X10);
    }

    #[test]
    fn set_fmt_rejects_unknown_code() {
        let (mut sensor, _registry, _) = probe();
        let err = sensor
            .set_fmt(0, FormatWhich::Active, MbusFramefmt::with_code(MbusCode::Y12_1X12))
            .unwrap_err();
        assert_eq!(err, SubdevError::UnsupportedCode(MbusCode::Y12_1X12));
        assert_eq!(err.errno(), -libc::EINVAL);
        assert_eq!(sensor.selected_code(), MbusCode::Y8_1X8);
    }

    #[test]
    fn try_scope_is_rejected() {
        let (mut sensor, _registry, _) = probe();
        assert_eq!(
            sensor.get_fmt(0, FormatWhich::Try),
            Err(SubdevError::UnsupportedScope(FormatWhich::Try))
        );
        assert_eq!(
            sensor.set_fmt(0, FormatWhich::Try, MbusFramefmt::with_code(MbusCode::Y10_1X10)),
            Err(SubdevError::UnsupportedScope(FormatWhich::Try))
        );
        assert_eq!(sensor.selected_code(), MbusCode::Y8_1X8);
    }

    #[test]
    fn s_stream_always_succeeds() {
        let (mut sensor, _registry, _) = probe();
        assert_eq!(sensor.s_stream(true), Ok(()));
        assert_eq!(sensor.s_stream(false), Ok(()));
        assert_eq!(sensor.get_fmt(0, FormatWhich::Active).unwrap().code, MbusCode::Y8_1X8);
    }

    #[test]
    fn probe_names_and_registers_subdev() {
        let clk = FixedClock::new(SENSOR_CLOCK);
        let mut registry = registry();
        let pdev = PlatformDevice::new("cyclops_sensor_dummy", 3).with_clock(Box::new(clk));
        let sensor = CyclopsSensorDummy::probe(pdev, &mut registry).unwrap();

        assert_eq!(sensor.name(), "cyclops_sensor_dummy 3");
        assert!(registry.is_registered("cyclops_sensor_dummy 3"));
        assert!(sensor.clock().is_enabled());
        assert_eq!(sensor.platform_device().id(), 3);
    }

    #[test]
    fn probe_without_clock_fails() {
        let mut registry = registry();
        let pdev = PlatformDevice::new("cyclops_sensor_dummy", 0);
        let err = CyclopsSensorDummy::probe(pdev, &mut registry).unwrap_err();

        assert_eq!(err.errno(), -libc::ENOENT);
        assert!(!registry.is_registered("cyclops_sensor_dummy 0"));
    }

    #[test]
    fn probe_succeeds_when_registration_fails() {
        let clk = FixedClock::new(SENSOR_CLOCK);
        let counters = clk.counters();
        let mut registry: Box<dyn SubdevRegistry> = Box::new(RejectingRegistry);

        let sensor = CyclopsSensorDummy::probe(pdev_with(clk), &mut registry).unwrap();
        assert_eq!(sensor.get_fmt(0, FormatWhich::Active).unwrap().code, MbusCode::Y8_1X8);

        CyclopsSensorDummy::remove(sensor, &mut registry);
        assert_eq!(counters.enables(), 1);
        assert_eq!(counters.disables(), 1);
        assert_eq!(counters.releases(), 1);
    }

    #[test]
    fn remove_leaves_foreign_registration_alone() {
        let clk = FixedClock::new(SENSOR_CLOCK);
        let counters = clk.counters();
        let mut registry = registry();
        registry.register_subdev("cyclops_sensor_dummy 0").unwrap();

        let sensor = CyclopsSensorDummy::probe(pdev_with(clk), &mut registry).unwrap();
        CyclopsSensorDummy::remove(sensor, &mut registry);

        assert!(registry.is_registered("cyclops_sensor_dummy 0"));
        assert_eq!(counters.disables(), 1);
        assert_eq!(counters.releases(), 1);
    }

    #[test]
    fn probe_tolerates_clock_enable_failure() {
        let clk = FixedClock::gated(SENSOR_CLOCK);
        let counters = clk.counters();
        let mut registry = registry();

        let sensor = CyclopsSensorDummy::probe(pdev_with(clk), &mut registry).unwrap();
        assert!(!sensor.clock().is_enabled());

        CyclopsSensorDummy::remove(sensor, &mut registry);
        assert_eq!(counters.disables(), 0);
        assert_eq!(counters.releases(), 1);
    }

    #[test]
    fn remove_unregisters_and_releases_clock_once() {
        let (sensor, mut registry, counters) = probe();
        assert!(registry.is_registered("cyclops_sensor_dummy 0"));

        CyclopsSensorDummy::remove(sensor, &mut registry);
        assert!(!registry.is_registered("cyclops_sensor_dummy 0"));
        assert_eq!(counters.enables(), 1);
        assert_eq!(counters.disables(), 1);
        assert_eq!(counters.releases(), 1);
    }

    #[test]
    fn usable_as_trait_object() {
        let (mut sensor, _registry, _) = probe();
        let sd: &mut dyn V4l2Subdev = &mut sensor;
        sd.set_fmt(0, FormatWhich::Active, MbusFramefmt::with_code(MbusCode::Y10_1X10))
            .unwrap();
        assert_eq!(sd.name(), "cyclops_sensor_dummy 0");
        assert_eq!(sd.get_fmt(0, FormatWhich::Active).unwrap().code, MbusCode::Y10_1X10);
    }
}
