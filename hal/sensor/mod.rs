//! Sensor HAL
//!
//! Sensor sub-devices that plug into the platform bus and the V4L2
//! sub-device registry.
//!
//! - Cyclops dummy: fixed-format stand-in for the Cyclops image sensor, lets
//!   the capture pipeline come up without the real part

mod cyclops;

pub use cyclops::{CyclopsSensorDummy, MODULE_INFO};

use crate::v4l2::{Colorspace, MbusCode};

/// Active pixel array width
pub const SENSOR_WIDTH: u32 = 4208;
/// Active pixel array height
pub const SENSOR_HEIGHT: u32 = 3118;

/// Clock resource the sensor needs from its platform device
pub const SENSOR_CLOCK: &str = "csi_mclk";

/// Supported media bus code and its colorspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub code: MbusCode,
    pub colorspace: Colorspace,
}

/// Formats the sensor can output, in enumeration order. The first entry is
/// the power-on default.
pub const PIXEL_FORMATS: [PixelFormat; 2] = [
    PixelFormat {
        code: MbusCode::Y8_1X8,
        colorspace: Colorspace::Raw,
    },
    PixelFormat {
        code: MbusCode::Y10_1X10,
        colorspace: Colorspace::Raw,
    },
];

/// Look up a code in [`PIXEL_FORMATS`]
pub fn find_pixel_format(code: MbusCode) -> Option<&'static PixelFormat> {
    PIXEL_FORMATS.iter().find(|fmt| fmt.code == code)
}
