//! Drive motor control for the four wheel H-bridges.

use crate::utils::config::MotorChannels;

use super::pwm::PwmOutputs;

/// Four-wheel H-bridge motor controller.
///
/// One signed speed is applied to all four wheels: direction from the sign,
/// duty from the magnitude. See `math::drive` for how joystick input is
/// reduced to that scalar. Mutating calls must come from a single task at a
/// time; the command loop guarantees this in normal operation.
pub struct MotorController<P: PwmOutputs> {
    outputs: P,
    wheels: [MotorChannels; 4],
    current_speed: f32,
}

impl<P: PwmOutputs> MotorController<P> {
    /// Take ownership of the bank and park every wheel: direction lines
    /// low, zero duty.
    pub fn new(outputs: P, wheels: [MotorChannels; 4]) -> Self {
        let mut ctl = Self {
            outputs,
            wheels,
            current_speed: 0.0,
        };
        for m in ctl.wheels {
            ctl.write_level(m.forward, false);
            ctl.write_level(m.reverse, false);
            ctl.write_duty(m.enable, 0.0);
        }
        tracing::debug!("motor controller initialized");
        ctl
    }

    /// Set the shared speed for all wheels.
    ///
    /// `speed` is a signed percentage; values outside [-100, 100] are
    /// clamped, never rejected. Forward is `speed >= 0`.
    pub fn set_speed(&mut self, speed: f32) {
        let speed = speed.clamp(-100.0, 100.0);
        let forward = speed >= 0.0;
        let duty = speed.abs();

        for m in self.wheels {
            self.write_level(m.forward, forward);
            self.write_level(m.reverse, !forward);
            self.write_duty(m.enable, duty);
        }
        self.current_speed = speed;
        tracing::debug!(speed, forward, "drive speed set");
    }

    /// Emergency stop: both direction lines low on every wheel.
    ///
    /// The enable duty is left as-is; with no bridge path selected the
    /// wheels coast regardless. Safe to call repeatedly.
    pub fn stop(&mut self) {
        for m in self.wheels {
            self.write_level(m.forward, false);
            self.write_level(m.reverse, false);
        }
        self.current_speed = 0.0;
        tracing::debug!("drive motors stopped");
    }

    /// Stop and release every owned channel. Runs once at shutdown;
    /// calling it again repeats the same writes and nothing else.
    pub fn cleanup(&mut self) {
        self.stop();
        for m in self.wheels {
            self.write_duty(m.enable, 0.0);
        }
    }

    /// Last commanded speed, after clamping.
    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    // Hardware write failures are logged and swallowed so the stop path is
    // never blocked by a secondary fault.
    fn write_level(&mut self, channel: u8, high: bool) {
        if let Err(e) = self.outputs.set_level(channel, high) {
            tracing::error!(channel, ?e, "motor direction write failed");
        }
    }

    fn write_duty(&mut self, channel: u8, duty: f32) {
        if let Err(e) = self.outputs.set_duty(channel, duty) {
            tracing::error!(channel, ?e, "motor duty write failed");
        }
    }
}
