//! Minimal ADS1015 driver: single-shot reads for battery sensing.

use embedded_hal::i2c::I2c;

use super::battery::VoltageSource;

const CONVERSION_REG: u8 = 0x00;
const CONFIG_REG: u8 = 0x01;

/// OS bit: written, starts a single conversion; read, conversion ready.
const OS: u16 = 1 << 15;
/// Single-ended MUX base (AIN0 against GND); add the channel below.
const MUX_SINGLE: u16 = 0b100 << 12;
/// PGA ±4.096 V full scale.
const PGA_4V096: u16 = 0b001 << 9;
/// Single-shot mode.
const MODE_SINGLE: u16 = 1 << 8;
/// 1600 samples per second.
const DR_1600SPS: u16 = 0b100 << 5;
/// Comparator disabled.
const COMP_DISABLE: u16 = 0b11;

/// Volts per LSB at ±4.096 V full scale (12-bit conversion).
const LSB_VOLTS: f32 = 0.002;

/// Ready polls before a conversion is declared stuck.
const READY_POLLS: u8 = 100;

#[derive(Debug)]
pub enum AdcError<E: core::fmt::Debug> {
    I2c(E),
    /// Conversion did not complete within the poll budget.
    NotReady,
    /// Only inputs 0..=3 exist.
    InvalidChannel(u8),
}

/// ADS1015 on the I2C bus, read in single-shot mode.
pub struct Ads1015<I2C> {
    i2c: I2C,
    address: u8,
    channel: u8,
}

impl<I2C, E> Ads1015<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    /// Default slave address (ADDR pin to ground).
    pub const ADDR: u8 = 0x48;

    pub fn new(
        i2c: I2C,
        address: u8,
        channel: u8,
    ) -> Result<Self, AdcError<E>> {
        if channel > 3 {
            return Err(AdcError::InvalidChannel(channel));
        }
        Ok(Self {
            i2c,
            address,
            channel,
        })
    }

    fn write_config(&mut self, value: u16) -> Result<(), AdcError<E>> {
        let v = value.to_be_bytes();
        self.i2c
            .write(self.address, &[CONFIG_REG, v[0], v[1]])
            .map_err(AdcError::I2c)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u16, AdcError<E>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(AdcError::I2c)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<I2C, E> VoltageSource for Ads1015<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type Error = AdcError<E>;

    fn read_voltage(&mut self) -> Result<f32, Self::Error> {
        let config = OS
            | MUX_SINGLE
            | (u16::from(self.channel) << 12)
            | PGA_4V096
            | MODE_SINGLE
            | DR_1600SPS
            | COMP_DISABLE;
        self.write_config(config)?;

        let mut ready = false;
        for _ in 0..READY_POLLS {
            if self.read_reg(CONFIG_REG)? & OS != 0 {
                ready = true;
                break;
            }
        }
        if !ready {
            return Err(AdcError::NotReady);
        }

        let raw = (self.read_reg(CONVERSION_REG)? as i16) >> 4;
        Ok(raw as f32 * LSB_VOLTS)
    }
}
