//! Static hardware configuration for the rover.
//!
//! Everything the controllers need to find their outputs is collected in
//! explicit structs built once at startup and passed by reference; nothing
//! reads ambient global state. The `Default` impls carry the deployed
//! rover's values.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::utils::camera::Resolution;

/// Logical wheel positions.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Wheel {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Wheel {
    /// All four wheels, front-left first.
    pub const ALL: [Wheel; 4] = [
        Wheel::FrontLeft,
        Wheel::FrontRight,
        Wheel::RearLeft,
        Wheel::RearRight,
    ];
}

/// One value per wheel.
///
/// A field per position makes "all four wheels, each exactly once" a
/// property of the type rather than a runtime check.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PerWheel<T> {
    pub front_left: T,
    pub front_right: T,
    pub rear_left: T,
    pub rear_right: T,
}

impl<T: Copy> PerWheel<T> {
    pub fn get(&self, wheel: Wheel) -> T {
        match wheel {
            Wheel::FrontLeft => self.front_left,
            Wheel::FrontRight => self.front_right,
            Wheel::RearLeft => self.rear_left,
            Wheel::RearRight => self.rear_right,
        }
    }

    /// Values in `Wheel::ALL` order.
    pub fn values(&self) -> [T; 4] {
        [
            self.front_left,
            self.front_right,
            self.rear_left,
            self.rear_right,
        ]
    }

    /// Entries in `Wheel::ALL` order.
    pub fn entries(&self) -> [(Wheel, T); 4] {
        [
            (Wheel::FrontLeft, self.front_left),
            (Wheel::FrontRight, self.front_right),
            (Wheel::RearLeft, self.rear_left),
            (Wheel::RearRight, self.rear_right),
        ]
    }

    /// The same assignment as a keyed map.
    pub fn to_map(&self) -> HashMap<Wheel, T> {
        self.entries().into_iter().collect()
    }
}

/// PWM bank outputs driving one wheel's H-bridge.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MotorChannels {
    pub enable: u8,
    pub forward: u8,
    pub reverse: u8,
}

/// I2C address of the motor PWM bank.
pub const MOTOR_BANK_ADDR: u8 = 0x40;
/// I2C address of the servo PWM bank.
pub const SERVO_BANK_ADDR: u8 = 0x55;
/// Motor bank prescale, ~1 kHz drive PWM.
pub const MOTOR_PWM_PRESCALE: u8 = 5;
/// Servo bank prescale, the 50 Hz hobby-servo carrier.
pub const SERVO_PWM_PRESCALE: u8 = 121;

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The same output index is assigned twice within one bank.
    DuplicateChannel(u8),
    /// PWM banks only have outputs 0..=15.
    ChannelOutOfRange(u8),
}

/// Output assignments for the whole rover.
///
/// Motors and servos live on separate PWM banks: the shared prescaler of a
/// bank cannot run 1 kHz drive PWM and the 50 Hz servo carrier at once.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub motors: PerWheel<MotorChannels>,
    pub servos: PerWheel<u8>,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            motors: PerWheel {
                front_left: MotorChannels {
                    enable: 0,
                    forward: 1,
                    reverse: 2,
                },
                front_right: MotorChannels {
                    enable: 3,
                    forward: 4,
                    reverse: 5,
                },
                rear_left: MotorChannels {
                    enable: 6,
                    forward: 7,
                    reverse: 8,
                },
                rear_right: MotorChannels {
                    enable: 9,
                    forward: 10,
                    reverse: 11,
                },
            },
            servos: PerWheel {
                front_left: 0,
                front_right: 1,
                rear_left: 2,
                rear_right: 3,
            },
        }
    }
}

impl PinMap {
    /// Check each bank for double-assigned or out-of-range outputs.
    ///
    /// Construction does not force this; call it once when loading a
    /// hand-written map. The controllers never re-check at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = [false; 16];
        for m in self.motors.values() {
            for ch in [m.enable, m.forward, m.reverse] {
                claim(&mut seen, ch)?;
            }
        }
        let mut seen = [false; 16];
        for ch in self.servos.values() {
            claim(&mut seen, ch)?;
        }
        Ok(())
    }

    /// Motor channel triples in wheel order, for `MotorController`.
    pub fn motor_channels(&self) -> [MotorChannels; 4] {
        self.motors.values()
    }

    /// Servo channel assignment, for `ServoController`.
    pub fn servo_channels(&self) -> HashMap<Wheel, u8> {
        self.servos.to_map()
    }
}

fn claim(seen: &mut [bool; 16], channel: u8) -> Result<(), ConfigError> {
    let idx = usize::from(channel);
    if idx >= seen.len() {
        return Err(ConfigError::ChannelOutOfRange(channel));
    }
    if seen[idx] {
        return Err(ConfigError::DuplicateChannel(channel));
    }
    seen[idx] = true;
    Ok(())
}

/// Battery monitor thresholds and pacing. Defaults are for the rover's
/// 3S LiPo pack.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BatteryConfig {
    /// Seconds between voltage samples.
    pub check_interval_secs: u64,
    /// Volts at or below which the pack is low (3.6 V per cell).
    pub alert_threshold: f32,
    /// Volts at or below which the pack is critically low.
    pub critical_threshold: f32,
    /// Fully charged pack voltage.
    pub max_voltage: f32,
    /// Divider ratio from pack voltage to the ADC input.
    pub divider: f32,
    /// ADC input the divider feeds.
    pub adc_channel: u8,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 10,
            alert_threshold: 10.8,
            critical_threshold: 10.2,
            max_voltage: 12.6,
            divider: 4.0,
            adc_channel: 0,
        }
    }
}

/// Camera geometry and pacing.
///
/// The default flip + mirror pair matches the rover's upside-down sensor
/// mounting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CameraConfig {
    pub resolution: Resolution,
    pub framerate: u8,
    pub vflip: bool,
    pub hmirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::Vga,
            framerate: 24,
            vflip: true,
            hmirror: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_is_valid() {
        assert_eq!(PinMap::default().validate(), Ok(()));
    }

    #[test]
    fn duplicate_channel_rejected() {
        let mut map = PinMap::default();
        map.motors.rear_right.reverse = map.motors.front_left.enable;
        assert_eq!(
            map.validate(),
            Err(ConfigError::DuplicateChannel(map.motors.front_left.enable))
        );
    }

    #[test]
    fn out_of_range_channel_rejected() {
        let mut map = PinMap::default();
        map.servos.rear_left = 16;
        assert_eq!(map.validate(), Err(ConfigError::ChannelOutOfRange(16)));
    }
}
