//! Module Exports
//!
//! This file exports the actuator controllers and the operator command
//! surface that drives them.
//!
//! - `motors`: four-wheel H-bridge drive control
//! - `servos`: steering servo control
//! - `pwm`: the PWM output bank capability and its PCA9685 backend

pub mod motors;
pub mod pwm;
pub mod servos;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::{Deserialize, Serialize};

use crate::utils::config::Wheel;
use crate::utils::math::drive;

use motors::MotorController;
use pwm::PwmOutputs;
use servos::{ServoController, CENTER_ANGLE};

/// Channel used to receive operator commands (`SystemCommand` messages).
pub static COMMAND_CHANNEL: embassy_sync::channel::Channel<
    CriticalSectionRawMutex,
    SystemCommand,
    16,
> = embassy_sync::channel::Channel::new();

/// Operator command variants for motion, steering, and the kill switch.
///
/// Serialized as JSON with tag `"ct"`, e.g. `{"ct":"drive","s":60,"t":-15}`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "ct", rename_all = "snake_case")]
pub enum SystemCommand {
    /// Joystick drive input: speed and turn, each nominally [-100, 100].
    Drive { s: f32, t: f32 },
    /// Steering offset from center, degrees; applied to all four servos.
    Steer { a: f32 },
    /// Emergency stop: motors off, steering centered.
    EStop,
}

impl SystemCommand {
    /// Parse a command from its JSON wire form.
    ///
    /// Unknown command tags or wheel names fail here, before anything
    /// touches the hardware; callers log and carry on.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Owns both actuator controllers and serializes every mutation.
///
/// Exactly one task runs the command loop, so motor and servo writes can
/// never interleave with each other or with a concurrent stop.
pub struct SystemController<MP: PwmOutputs, SP: PwmOutputs> {
    motors: MotorController<MP>,
    servos: ServoController<SP>,
}

impl<MP: PwmOutputs, SP: PwmOutputs> SystemController<MP, SP> {
    pub fn new(
        motors: MotorController<MP>,
        servos: ServoController<SP>,
    ) -> Self {
        Self { motors, servos }
    }

    /// Receive and execute operator commands until the process exits.
    pub async fn command_loop(&mut self) -> ! {
        loop {
            let cmd = COMMAND_CHANNEL.receiver().receive().await;
            self.ex_command(cmd);
        }
    }

    /// Execute one command against the hardware.
    pub fn ex_command(&mut self, cmd: SystemCommand) {
        tracing::debug!(?cmd, "executing command");
        match cmd {
            SystemCommand::Drive { s, t } => {
                let (left, _right) = drive::mix(s, t);
                self.motors.set_speed(left);
            }
            SystemCommand::Steer { a } => {
                for wheel in Wheel::ALL {
                    if let Err(e) = self.servos.set_angle(wheel, CENTER_ANGLE + a) {
                        tracing::warn!(?e, "steer command skipped a servo");
                    }
                }
            }
            SystemCommand::EStop => {
                self.motors.stop();
                self.servos.center_all();
                tracing::info!("emergency stop");
            }
        }
    }

    /// Release both controllers' hardware. Runs once at shutdown.
    pub fn shutdown(&mut self) {
        self.motors.cleanup();
        self.servos.cleanup();
        tracing::debug!("controllers released");
    }

    pub fn motors(&self) -> &MotorController<MP> {
        &self.motors
    }

    pub fn servos(&self) -> &ServoController<SP> {
        &self.servos
    }
}
