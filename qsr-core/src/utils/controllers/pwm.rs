//! PWM output banks and the PCA9685-backed implementation.
//!
//! The motor and servo controllers hold a `PwmOutputs` bank: a set of
//! channels that can be driven as logic levels or duty-cycle signals. On
//! the rover each bank is a PCA9685 on the shared I2C bus; off-device the
//! bank is a simulated implementation.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address, Channel, Error as PcaError, Pca9685};

/// Full-scale counts of the 12-bit PWM.
const MAX_COUNTS: u16 = 4095;

/// Errors from a PCA9685-backed output bank.
#[derive(Debug)]
pub enum BankError<E: core::fmt::Debug> {
    Pca(PcaError<E>),
    /// Channel index outside the chip's 16 outputs.
    InvalidChannel(u8),
}

/// A bank of PWM output channels addressed by index.
///
/// Both operations are plain register writes; implementations must not
/// block beyond the bus transaction itself.
pub trait PwmOutputs {
    type Error: core::fmt::Debug;

    /// Drive a channel fully high or low.
    fn set_level(
        &mut self,
        channel: u8,
        high: bool,
    ) -> Result<(), Self::Error>;

    /// Set a channel's duty cycle, in percent of the PWM period.
    fn set_duty(
        &mut self,
        channel: u8,
        duty_pct: f32,
    ) -> Result<(), Self::Error>;
}

/// PCA9685 output bank on a shared I2C bus.
pub struct PwmBank<'a, I2C> {
    pca: Pca9685<RefCellDevice<'a, I2C>>,
}

impl<'a, I2C, E> PwmBank<'a, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    /// Bring up the chip at `address` and program its prescaler.
    pub fn new(
        bus: &'a RefCell<I2C>,
        address: u8,
        prescale: u8,
    ) -> Result<Self, BankError<E>> {
        let mut pca = Pca9685::new(RefCellDevice::new(bus), Address::from(address))
            .map_err(BankError::Pca)?;
        pca.enable().map_err(BankError::Pca)?;
        pca.set_prescale(prescale).map_err(BankError::Pca)?;
        Ok(Self { pca })
    }

    fn channel(index: u8) -> Result<Channel, BankError<E>> {
        Ok(match index {
            0 => Channel::C0,
            1 => Channel::C1,
            2 => Channel::C2,
            3 => Channel::C3,
            4 => Channel::C4,
            5 => Channel::C5,
            6 => Channel::C6,
            7 => Channel::C7,
            8 => Channel::C8,
            9 => Channel::C9,
            10 => Channel::C10,
            11 => Channel::C11,
            12 => Channel::C12,
            13 => Channel::C13,
            14 => Channel::C14,
            15 => Channel::C15,
            other => return Err(BankError::InvalidChannel(other)),
        })
    }
}

impl<'a, I2C, E> PwmOutputs for PwmBank<'a, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type Error = BankError<E>;

    fn set_level(
        &mut self,
        channel: u8,
        high: bool,
    ) -> Result<(), Self::Error> {
        let ch = Self::channel(channel)?;
        let counts = if high { MAX_COUNTS } else { 0 };
        self.pca.set_channel_on_off(ch, 0, counts).map_err(BankError::Pca)
    }

    fn set_duty(
        &mut self,
        channel: u8,
        duty_pct: f32,
    ) -> Result<(), Self::Error> {
        let ch = Self::channel(channel)?;
        let counts = (duty_pct.clamp(0.0, 100.0) / 100.0 * MAX_COUNTS as f32) as u16;
        self.pca.set_channel_on_off(ch, 0, counts).map_err(BankError::Pca)
    }
}
