//! V4L2 sub-device HAL
//!
//! Media-bus types, the pad/video operation traits a sensor sub-device
//! implements, and the registry the capture framework discovers
//! sub-devices through.

mod registry;

pub use registry::{AsyncSubdevRegistry, RegistryError, RegistryResult, SubdevRegistry};

use core::fmt;
use thiserror::Error;

/// Maximum sub-device name length including the terminator
pub const V4L2_SUBDEV_NAME_SIZE: usize = 32;

/// Media bus pixel code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MbusCode(pub u32);

impl MbusCode {
    /// 8-bit greyscale, one sample per bus clock
    pub const Y8_1X8: MbusCode = MbusCode(0x2001);
    /// 10-bit greyscale, one sample per bus clock
    pub const Y10_1X10: MbusCode = MbusCode(0x200a);
    /// 12-bit greyscale, one sample per bus clock
    pub const Y12_1X12: MbusCode = MbusCode(0x2013);
}

impl fmt::Display for MbusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MbusCode::Y8_1X8 => write!(f, "Y8_1X8"),
            MbusCode::Y10_1X10 => write!(f, "Y10_1X10"),
            MbusCode::Y12_1X12 => write!(f, "Y12_1X12"),
            MbusCode(code) => write!(f, "0x{:04x}", code),
        }
    }
}

/// Colorspace tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Colorspace {
    #[default]
    Default = 0,
    /// Raw sensor data, no colorspace conversion applies
    Raw = 11,
}

/// Field order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Field {
    #[default]
    Any = 0,
    /// Progressive
    None = 1,
}

/// Which format a pad operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FormatWhich {
    /// Tentative format used during negotiation
    Try = 0,
    /// Format applied to the hardware
    Active = 1,
}

impl fmt::Display for FormatWhich {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatWhich::Try => write!(f, "try"),
            FormatWhich::Active => write!(f, "active"),
        }
    }
}

/// Media bus frame format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbusFramefmt {
    pub width: u32,
    pub height: u32,
    pub code: MbusCode,
    pub field: Field,
    pub colorspace: Colorspace,
}

impl MbusFramefmt {
    /// Format carrying only a code, as a `set_fmt` request usually does
    pub fn with_code(code: MbusCode) -> Self {
        Self {
            width: 0,
            height: 0,
            code,
            field: Field::Any,
            colorspace: Colorspace::Default,
        }
    }
}

impl fmt::Display for MbusFramefmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {} field={:?} colorspace={:?}",
            self.width, self.height, self.code, self.field, self.colorspace
        )
    }
}

/// Discrete or ranged frame size reported by `enum_frame_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSizeRange {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl FrameSizeRange {
    /// Range with min == max
    pub fn discrete(width: u32, height: u32) -> Self {
        Self {
            min_width: width,
            max_width: width,
            min_height: height,
            max_height: height,
        }
    }
}

/// Sub-device operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubdevError {
    /// Pad does not exist on this sub-device
    #[error("invalid pad {0}")]
    InvalidPad(u32),
    /// Enumeration index past the end of the list
    #[error("index {0} out of range")]
    IndexOutOfRange(u32),
    /// Format scope not handled by this sub-device
    #[error("{0} formats are not supported")]
    UnsupportedScope(FormatWhich),
    /// Media bus code not in the sub-device's table
    #[error("unsupported mbus code {0}")]
    UnsupportedCode(MbusCode),
}

impl SubdevError {
    /// Negative errno as reported across the host ABI
    pub fn errno(&self) -> i32 {
        match self {
            SubdevError::InvalidPad(_) => -libc::EINVAL,
            SubdevError::IndexOutOfRange(_) => -libc::EINVAL,
            SubdevError::UnsupportedScope(_) => -libc::EINVAL,
            SubdevError::UnsupportedCode(_) => -libc::EINVAL,
        }
    }
}

/// Result type for sub-device operations
pub type SubdevResult<T> = Result<T, SubdevError>;

/// Pad-level operations
pub trait SubdevPadOps {
    /// Enumerate the media bus codes supported on `pad`
    fn enum_mbus_code(&self, pad: u32, index: u32) -> SubdevResult<MbusCode>;

    /// Enumerate the frame sizes supported on `pad`
    fn enum_frame_size(&self, pad: u32, index: u32) -> SubdevResult<FrameSizeRange>;

    /// Get the current format on `pad`
    fn get_fmt(&self, pad: u32, which: FormatWhich) -> SubdevResult<MbusFramefmt>;

    /// Set the format on `pad`, returning what was actually applied
    fn set_fmt(
        &mut self,
        pad: u32,
        which: FormatWhich,
        format: MbusFramefmt,
    ) -> SubdevResult<MbusFramefmt>;
}

/// Video operations
pub trait SubdevVideoOps {
    /// Start or stop streaming
    fn s_stream(&mut self, enable: bool) -> SubdevResult<()>;
}

/// A sub-device the capture framework drives through its op tables
pub trait V4l2Subdev: SubdevPadOps + SubdevVideoOps {
    /// Sub-device name, unique within the registry
    fn name(&self) -> &str;
}

/// Truncate `name` to fit a sub-device name buffer, on a char boundary
pub fn subdev_name(name: &str) -> String {
    let max = V4L2_SUBDEV_NAME_SIZE - 1;
    if name.len() <= max {
        return name.to_owned();
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}
