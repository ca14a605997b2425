//! Hardware Abstraction Layer
//!
//! Models the pieces of a capture stack that a sensor sub-device plugs into:
//! clocks, the platform device/driver model, the V4L2 sub-device ops and
//! registry, and the Cyclops dummy sensor that implements them.
//!
//! Modules are selected at compile time via Cargo features.

#[cfg(feature = "clock")]
pub mod clock;

#[cfg(feature = "platform")]
pub mod platform;

#[cfg(feature = "v4l2")]
pub mod v4l2;

#[cfg(feature = "sensor")]
pub mod sensor;
