//! Math utilities for the Quad-Steer Rover.
//!
//! This module provides the differential-drive mixing used to turn operator
//! joystick input into wheel speeds.

pub mod drive;
