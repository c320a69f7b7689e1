//! Core actuation and telemetry for the Quad-Steer Rover on no-std embedded platforms.
//!
//! For a development rig that runs the stack off-device, see the `mock-rig` application.
#![no_std]

pub mod utils;
