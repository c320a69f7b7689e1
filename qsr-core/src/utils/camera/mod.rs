//! Camera frame production.
//!
//! A background loop captures JPEG frames at the configured rate and
//! publishes each into a single-slot buffer. Readers always get the most
//! recent frame (or nothing before the first capture completes); frames
//! are never queued, so a slow reader silently skips ahead and can never
//! hold the producer back.

extern crate alloc;

use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Timer};
use serde::{Deserialize, Serialize};

use crate::utils::config::CameraConfig;
use crate::utils::sync::TaskControl;

pub mod arducam;

/// Capture frame sizes understood by the camera backends.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// 320 x 240
    Qvga,
    /// 640 x 480
    Vga,
    /// 1280 x 720
    Hd,
}

/// One encoded JPEG frame with its publish sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    jpeg: Vec<u8>,
    seq: u32,
}

impl Frame {
    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn into_jpeg(self) -> Vec<u8> {
        self.jpeg
    }
}

/// Single-slot, last-value-wins frame store.
///
/// Each publish replaces the previous frame; `read` hands out a clone, so
/// the producer can overwrite freely and readers never alias its storage.
pub struct FrameBuffer {
    latest: Mutex<CriticalSectionRawMutex, RefCell<Option<Frame>>>,
}

impl FrameBuffer {
    pub const fn new() -> Self {
        Self {
            latest: Mutex::new(RefCell::new(None)),
        }
    }

    /// Most recent frame, if any capture has completed. Never blocks,
    /// including after the producer has stopped.
    pub fn read(&self) -> Option<Frame> {
        self.latest.lock(|slot| slot.borrow().clone())
    }

    fn publish(&self, frame: Frame) {
        self.latest.lock(|slot| {
            slot.replace(Some(frame));
        });
    }
}

/// A JPEG still source: the real camera module or a simulated one.
pub trait ImageCapture {
    type Error: core::fmt::Debug;

    /// Capture and encode one frame.
    fn capture_jpeg(&mut self) -> Result<Vec<u8>, Self::Error>;

    /// Power the device down; no captures happen afterwards.
    fn release(&mut self);
}

/// Background frame producer.
pub struct FrameSource<C: ImageCapture> {
    camera: C,
    output: &'static FrameBuffer,
    ctl: &'static TaskControl,
    frame_interval: Duration,
    seq: u32,
}

impl<C: ImageCapture> FrameSource<C> {
    pub fn new(
        camera: C,
        config: &CameraConfig,
        output: &'static FrameBuffer,
        ctl: &'static TaskControl,
    ) -> Self {
        let fps = u64::from(config.framerate.max(1));
        Self {
            camera,
            output,
            ctl,
            frame_interval: Duration::from_millis(1000 / fps),
            seq: 0,
        }
    }

    /// Capture one frame and publish it. A failed capture is logged and
    /// the previous frame stays current.
    pub fn poll(&mut self) {
        match self.camera.capture_jpeg() {
            Ok(jpeg) => {
                self.seq = self.seq.wrapping_add(1);
                self.output.publish(Frame { jpeg, seq: self.seq });
            }
            Err(e) => tracing::error!(?e, "frame capture failed"),
        }
    }

    /// Capture at the configured rate until stopped, then release the
    /// device. Teardown happens strictly after the final capture, so a
    /// stop can never yank the device out from under an in-flight frame.
    pub async fn run(mut self) {
        tracing::debug!("camera stream started");
        while !self.ctl.stop_requested() {
            self.poll();
            Timer::after(self.frame_interval).await;
        }
        self.camera.release();
        self.ctl.mark_stopped();
        tracing::debug!("camera stream stopped");
    }
}
