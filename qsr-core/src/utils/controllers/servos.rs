//! Steering servo control.

use hashbrown::HashMap;

use crate::utils::config::Wheel;

use super::pwm::PwmOutputs;

/// Neutral steering angle, degrees.
pub const CENTER_ANGLE: f32 = 90.0;

/// Servo commands that cannot be executed.
#[derive(Debug, PartialEq, Eq)]
pub enum ServoError {
    /// No channel assigned for this wheel's servo.
    UnknownServo(Wheel),
}

struct ServoState {
    channel: u8,
    current_angle: f32,
}

/// Hobby-servo steering controller.
///
/// Angles are degrees in [0, 180]; 90 is straight ahead. Out-of-range
/// angles are clamped before the duty conversion. Single mutating caller
/// at a time, as with `MotorController`.
pub struct ServoController<P: PwmOutputs> {
    outputs: P,
    servos: HashMap<Wheel, ServoState>,
}

impl<P: PwmOutputs> ServoController<P> {
    /// Build the controller and center every mapped servo.
    pub fn new(outputs: P, channels: HashMap<Wheel, u8>) -> Self {
        let servos = channels
            .into_iter()
            .map(|(wheel, channel)| {
                (
                    wheel,
                    ServoState {
                        channel,
                        current_angle: CENTER_ANGLE,
                    },
                )
            })
            .collect();
        let mut ctl = Self { outputs, servos };
        ctl.center_all();
        tracing::debug!("servo controller initialized");
        ctl
    }

    /// Point one wheel's servo at `angle` degrees.
    ///
    /// An unmapped wheel is reported and nothing is written; a write
    /// failure on a mapped wheel is logged and the angle still recorded.
    pub fn set_angle(
        &mut self,
        wheel: Wheel,
        angle: f32,
    ) -> Result<(), ServoError> {
        let angle = angle.clamp(0.0, 180.0);
        let duty = angle_to_duty(angle);

        let servo = self
            .servos
            .get_mut(&wheel)
            .ok_or(ServoError::UnknownServo(wheel))?;
        if let Err(e) = self.outputs.set_duty(servo.channel, duty) {
            tracing::error!(?wheel, ?e, "servo duty write failed");
        }
        servo.current_angle = angle;
        tracing::debug!(?wheel, angle, "servo angle set");
        Ok(())
    }

    /// Return every mapped servo to the 90 degree center.
    pub fn center_all(&mut self) {
        for wheel in Wheel::ALL {
            let _ = self.set_angle(wheel, CENTER_ANGLE);
        }
    }

    /// Center everything, then release the outputs (no more pulses).
    /// Repeating the call repeats the same writes.
    pub fn cleanup(&mut self) {
        self.center_all();
        for servo in self.servos.values() {
            if let Err(e) = self.outputs.set_duty(servo.channel, 0.0) {
                tracing::error!(channel = servo.channel, ?e, "servo release failed");
            }
        }
    }

    /// Last commanded angle for one wheel's servo.
    pub fn current_angle(&self, wheel: Wheel) -> Option<f32> {
        self.servos.get(&wheel).map(|s| s.current_angle)
    }
}

/// Convert a clamped angle to the 50 Hz duty percentage.
///
/// 0° maps to 2.5% and 180° to 12.5%: 0.5..2.5 ms pulses at a 20 ms
/// period, covering the usual hobby-servo extremes.
pub fn angle_to_duty(angle: f32) -> f32 {
    2.5 + (angle / 180.0) * 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_anchors_are_exact() {
        assert!((angle_to_duty(0.0) - 2.5).abs() < 1e-6);
        assert!((angle_to_duty(90.0) - 7.5).abs() < 1e-6);
        assert!((angle_to_duty(180.0) - 12.5).abs() < 1e-6);
    }
}
