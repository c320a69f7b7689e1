//! Battery voltage monitoring.
//!
//! A background loop samples the pack voltage, derives a charge percentage
//! and the low/critical flags, and publishes the latest `BatteryStatus`
//! snapshot. Consumers poll the snapshot or wait on the event queue, which
//! only carries flag *transitions*: a pack that stays low does not repeat
//! its alert every sample.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use serde::Serialize;

use crate::utils::config::BatteryConfig;
use crate::utils::sync::TaskControl;

/// A battery voltage reading source.
///
/// Sources report volts at the ADC input; divider correction to pack volts
/// is the monitor's job.
pub trait VoltageSource {
    type Error: core::fmt::Debug;

    fn read_voltage(&mut self) -> Result<f32, Self::Error>;
}

/// Point-in-time battery state. Copied to consumers, never shared by
/// reference.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct BatteryStatus {
    /// Pack voltage, rounded to one decimal.
    pub voltage: f32,
    /// Charge estimate: 0 at the critical threshold, 100 at full.
    pub percentage: u8,
    pub is_low: bool,
    pub is_critical: bool,
}

impl BatteryStatus {
    const fn startup() -> Self {
        Self {
            voltage: 0.0,
            percentage: 100,
            is_low: false,
            is_critical: false,
        }
    }
}

/// Shared snapshot cell plus the edge-triggered event queue.
///
/// Lives as a `'static` so the monitor task and any number of consumers
/// can hold it; reads copy the whole snapshot under a short critical
/// section, so nobody ever observes a half-updated status.
pub struct BatteryTelemetry {
    status: Mutex<CriticalSectionRawMutex, Cell<BatteryStatus>>,
    events: Channel<CriticalSectionRawMutex, BatteryStatus, 4>,
}

impl BatteryTelemetry {
    pub const fn new() -> Self {
        Self {
            status: Mutex::new(Cell::new(BatteryStatus::startup())),
            events: Channel::new(),
        }
    }

    /// Latest snapshot; before the first sample this is the startup value.
    pub fn status(&self) -> BatteryStatus {
        self.status.lock(|s| s.get())
    }

    /// Wait for the next low/critical flag transition.
    pub async fn next_event(&self) -> BatteryStatus {
        self.events.receiver().receive().await
    }

    /// Non-blocking variant of `next_event`.
    pub fn try_next_event(&self) -> Option<BatteryStatus> {
        self.events.receiver().try_receive().ok()
    }

    fn publish(&self, status: BatteryStatus, notify: bool) {
        self.status.lock(|s| s.set(status));
        if notify && self.events.sender().try_send(status).is_err() {
            tracing::warn!("battery event queue full, alert dropped");
        }
    }
}

/// Background battery monitor.
pub struct BatteryMonitor<V: VoltageSource> {
    adc: V,
    config: BatteryConfig,
    telemetry: &'static BatteryTelemetry,
    ctl: &'static TaskControl,
    voltage: f32,
    percentage: f32,
    is_low: bool,
    is_critical: bool,
}

impl<V: VoltageSource> BatteryMonitor<V> {
    pub fn new(
        adc: V,
        config: BatteryConfig,
        telemetry: &'static BatteryTelemetry,
        ctl: &'static TaskControl,
    ) -> Self {
        Self {
            adc,
            config,
            telemetry,
            ctl,
            voltage: 0.0,
            percentage: 100.0,
            is_low: false,
            is_critical: false,
        }
    }

    /// One sample cycle: read, derive, publish, notify on flag edges.
    ///
    /// A failed read leaves all state untouched; the next cycle retries.
    pub fn poll(&mut self) {
        let adc_volts = match self.adc.read_voltage() {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(?e, "battery voltage read failed");
                return;
            }
        };
        self.voltage = adc_volts * self.config.divider;

        let range = self.config.max_voltage - self.config.critical_threshold;
        self.percentage =
            ((self.voltage - self.config.critical_threshold) / range * 100.0).clamp(0.0, 100.0);

        let was_low = self.is_low;
        let was_critical = self.is_critical;
        self.is_low = self.voltage <= self.config.alert_threshold;
        self.is_critical = self.voltage <= self.config.critical_threshold;

        let changed = was_low != self.is_low || was_critical != self.is_critical;
        if changed {
            tracing::warn!(
                voltage = self.voltage,
                low = self.is_low,
                critical = self.is_critical,
                "battery status changed"
            );
        }
        self.telemetry.publish(self.snapshot(), changed);
    }

    /// Rounded snapshot of the current derived state.
    pub fn snapshot(&self) -> BatteryStatus {
        BatteryStatus {
            voltage: libm::roundf(self.voltage * 10.0) / 10.0,
            percentage: libm::roundf(self.percentage) as u8,
            is_low: self.is_low,
            is_critical: self.is_critical,
        }
    }

    /// Sample on the configured interval until stopped.
    ///
    /// The stop flag is checked at the top of each cycle, so a stop takes
    /// effect after at most one in-flight sleep.
    pub async fn run(mut self) {
        tracing::debug!("battery monitor started");
        let interval = Duration::from_secs(self.config.check_interval_secs);
        while !self.ctl.stop_requested() {
            self.poll();
            Timer::after(interval).await;
        }
        self.ctl.mark_stopped();
        tracing::debug!("battery monitor stopped");
    }
}
