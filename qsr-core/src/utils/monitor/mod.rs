//! Battery sensing: the monitor loop and its ADC backend.

pub mod ads1015;
pub mod battery;
