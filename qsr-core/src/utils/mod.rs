//! Utility re-exports and helper macros for the Quad-Steer Rover.
//!
//! This module collects the rover's hardware subsystems:
//!
//! - `camera`: background frame capture and the latest-frame buffer
//! - `config`: pin maps and hardware configuration structs
//! - `controllers`: drive motors, steering servos, and the command loop
//! - `math`: differential-drive mixing for joystick input
//! - `monitor`: battery voltage sampling and alerts
//! - `sync`: stop/join handshake for the background loops
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod camera;
pub mod config;
pub mod controllers;
pub mod math;
pub mod monitor;
pub mod sync;

pub use config::PinMap;
pub use controllers::SystemController;
pub use embassy_time::*;

#[macro_export]
/// Initialize a static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t`, initializes
/// it with `$val`, and returns a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.init($val)
    }};
}
