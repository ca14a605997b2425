//! Sensor probe - drives the Cyclops dummy sensor like a capture engine
//!
//! Binds the sensor on a platform bus, walks its format tables, applies a
//! format, toggles streaming and unbinds again, printing what the sensor
//! answered at each step.

use clap::{Parser, ValueEnum};
use hal::clock::FixedClock;
use hal::platform::{PlatformBus, PlatformDevice};
use hal::sensor::{CyclopsSensorDummy, MODULE_INFO, SENSOR_CLOCK};
use hal::v4l2::{
    AsyncSubdevRegistry, FormatWhich, MbusCode, MbusFramefmt, SubdevRegistry, SubdevResult,
    V4l2Subdev,
};
use tracing::{error, info};

/// Media bus codes selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodeArg {
    /// 8-bit greyscale
    Y8,
    /// 10-bit greyscale
    Y10,
    /// 12-bit greyscale (not supported by the dummy sensor)
    Y12,
}

impl From<CodeArg> for MbusCode {
    fn from(code: CodeArg) -> Self {
        match code {
            CodeArg::Y8 => MbusCode::Y8_1X8,
            CodeArg::Y10 => MbusCode::Y10_1X10,
            CodeArg::Y12 => MbusCode::Y12_1X12,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sensor_probe")]
#[command(about = "Bind the Cyclops dummy sensor and exercise its sub-device ops")]
#[command(version)]
pub struct Args {
    /// Platform device name
    #[arg(long, default_value = "sensor")]
    pub name: String,

    /// Platform device instance id
    #[arg(long, default_value_t = 0)]
    pub id: i32,

    /// Device-tree compatible string
    #[arg(long, default_value = "vital,cyclops_sensor_dummy")]
    pub compatible: String,

    /// Do not give the device a csi_mclk clock
    #[arg(long)]
    pub no_clock: bool,

    /// Media bus code to apply with set_fmt
    #[arg(long, value_enum)]
    pub code: Option<CodeArg>,

    /// Also issue a try-format query
    #[arg(long)]
    pub try_fmt: bool,

    /// Print module information and exit
    #[arg(long)]
    pub info: bool,
}

impl Args {
    fn platform_device(&self) -> PlatformDevice {
        let mut pdev = PlatformDevice::new(&self.name, self.id).with_compatible(&self.compatible);
        if !self.no_clock {
            pdev = pdev.with_clock(Box::new(FixedClock::new(SENSOR_CLOCK)));
        }
        pdev
    }
}

/// Run the probe sequence, returning a process exit code
pub fn run(args: &Args) -> i32 {
    if args.info {
        println!("{}", MODULE_INFO);
        return 0;
    }

    let registry: Box<dyn SubdevRegistry> = Box::new(AsyncSubdevRegistry::new());
    let mut bus = PlatformBus::<CyclopsSensorDummy>::new(registry);

    let result = match bus.add_device(args.platform_device()) {
        Ok(sensor) => exercise(sensor, args),
        Err(e) => {
            error!("bind failed: {}", e);
            return -e.errno();
        }
    };

    if let Err(e) = bus.remove_device(args.id) {
        error!("unbind failed: {}", e);
        return -e.errno();
    }

    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("sub-device op failed: {}", e);
            -e.errno()
        }
    }
}

fn exercise(sd: &mut dyn V4l2Subdev, args: &Args) -> SubdevResult<()> {
    println!("Sub-device: {}", sd.name());

    println!("Media bus codes:");
    for (index, code) in (0..).map_while(|i| sd.enum_mbus_code(0, i).ok()).enumerate() {
        println!("  [{}] {}", index, code);
    }

    println!("Frame sizes:");
    for (index, size) in (0..).map_while(|i| sd.enum_frame_size(0, i).ok()).enumerate() {
        println!(
            "  [{}] {}x{} - {}x{}",
            index, size.min_width, size.min_height, size.max_width, size.max_height
        );
    }

    println!("Active format: {}", sd.get_fmt(0, FormatWhich::Active)?);

    if let Some(code) = args.code {
        let applied = sd.set_fmt(0, FormatWhich::Active, MbusFramefmt::with_code(code.into()))?;
        println!("Applied format: {}", applied);
    }

    if args.try_fmt {
        match sd.get_fmt(0, FormatWhich::Try) {
            Ok(fmt) => println!("Try format: {}", fmt),
            Err(e) => println!("Try format: rejected ({})", e),
        }
    }

    sd.s_stream(true)?;
    info!(subdev = sd.name(), "streaming");
    sd.s_stream(false)?;

    Ok(())
}
