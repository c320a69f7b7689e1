//! Arducam-style SPI JPEG camera module.
//!
//! The module exposes a register file and a capture FIFO over one SPI
//! device: registers configure format and image geometry, a capture is a
//! FIFO clear + start, and the encoded frame is burst-read out once the
//! done flag rises.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use embedded_hal::spi::{Operation, SpiDevice};

use crate::utils::config::CameraConfig;

use super::{ImageCapture, Resolution};

/// Write flag OR-ed onto a register address.
const WRITE_FLAG: u8 = 0x80;

const FORMAT_REG: u8 = 0x20;
const RESOLUTION_REG: u8 = 0x21;
const FLIP_REG: u8 = 0x2B;
const MIRROR_REG: u8 = 0x2C;

const FIFO_CONTROL_REG: u8 = 0x04;
const FIFO_CLEAR: u8 = 0x01;
const FIFO_START: u8 = 0x02;

const STATUS_REG: u8 = 0x44;
const CAPTURE_DONE: u8 = 0x04;

const FIFO_SIZE1_REG: u8 = 0x45;
const FIFO_SIZE2_REG: u8 = 0x46;
const FIFO_SIZE3_REG: u8 = 0x47;

const BURST_READ: u8 = 0x3C;

const FORMAT_JPEG: u8 = 0x01;

/// Capture-done polls before the sensor is declared stuck.
const DONE_POLLS: u32 = 50_000;

/// Largest frame we are willing to pull out of the FIFO.
const MAX_FRAME_BYTES: u32 = 512 * 1024;

#[derive(Debug)]
pub enum CameraError<E: core::fmt::Debug> {
    Spi(E),
    /// The capture-done flag never rose.
    Timeout,
    /// FIFO length is implausible for a JPEG frame.
    BadFrameLength(u32),
}

/// JPEG camera module behind one SPI device.
pub struct Arducam<SPI> {
    spi: SPI,
}

impl<SPI, E> Arducam<SPI>
where
    SPI: SpiDevice<Error = E>,
    E: core::fmt::Debug,
{
    /// Configure the sensor for JPEG capture per `config`.
    pub fn new(
        spi: SPI,
        config: &CameraConfig,
    ) -> Result<Self, CameraError<E>> {
        let mut cam = Self { spi };
        cam.write_reg(FORMAT_REG, FORMAT_JPEG)?;
        cam.write_reg(RESOLUTION_REG, resolution_code(config.resolution))?;
        cam.write_reg(FLIP_REG, config.vflip as u8)?;
        cam.write_reg(MIRROR_REG, config.hmirror as u8)?;
        Ok(cam)
    }

    fn write_reg(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), CameraError<E>> {
        self.spi
            .write(&[reg | WRITE_FLAG, value])
            .map_err(CameraError::Spi)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, CameraError<E>> {
        let mut value = [0u8; 1];
        self.spi
            .transaction(&mut [
                Operation::Write(&[reg & !WRITE_FLAG]),
                Operation::Read(&mut value),
            ])
            .map_err(CameraError::Spi)?;
        Ok(value[0])
    }

    fn fifo_length(&mut self) -> Result<u32, CameraError<E>> {
        let b1 = u32::from(self.read_reg(FIFO_SIZE1_REG)?);
        let b2 = u32::from(self.read_reg(FIFO_SIZE2_REG)?);
        let b3 = u32::from(self.read_reg(FIFO_SIZE3_REG)? & 0x7F);
        Ok(b1 | (b2 << 8) | (b3 << 16))
    }
}

impl<SPI, E> ImageCapture for Arducam<SPI>
where
    SPI: SpiDevice<Error = E>,
    E: core::fmt::Debug,
{
    type Error = CameraError<E>;

    fn capture_jpeg(&mut self) -> Result<Vec<u8>, Self::Error> {
        self.write_reg(FIFO_CONTROL_REG, FIFO_CLEAR)?;
        self.write_reg(FIFO_CONTROL_REG, FIFO_START)?;

        let mut done = false;
        for _ in 0..DONE_POLLS {
            if self.read_reg(STATUS_REG)? & CAPTURE_DONE != 0 {
                done = true;
                break;
            }
        }
        if !done {
            return Err(CameraError::Timeout);
        }

        let len = self.fifo_length()?;
        if len == 0 || len > MAX_FRAME_BYTES {
            return Err(CameraError::BadFrameLength(len));
        }

        let mut jpeg = vec![0u8; len as usize];
        self.spi
            .transaction(&mut [
                Operation::Write(&[BURST_READ]),
                Operation::Read(&mut jpeg),
            ])
            .map_err(CameraError::Spi)?;
        Ok(jpeg)
    }

    fn release(&mut self) {
        // drop any buffered frame before power-down
        if let Err(e) = self.write_reg(FIFO_CONTROL_REG, FIFO_CLEAR) {
            tracing::warn!(?e, "camera release write failed");
        }
    }
}

fn resolution_code(res: Resolution) -> u8 {
    match res {
        Resolution::Qvga => 0x01,
        Resolution::Vga => 0x02,
        Resolution::Hd => 0x03,
    }
}
