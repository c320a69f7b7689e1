//! Development rig for the Quad-Steer Rover core.
//!
//! Runs the whole actuation and telemetry stack against simulated hardware:
//! PWM writes go to the log, the battery sags a little with every sample,
//! and the camera produces counter-stamped test frames. Operator commands
//! arrive as JSON lines on stdin, one command per line, e.g.
//!
//! ```text
//! {"ct":"drive","s":60,"t":-15}
//! {"ct":"steer","a":20}
//! {"ct":"e_stop"}
//! ```
//!
//! Closing stdin plays the operator-disconnect failsafe and shuts the rig
//! down cleanly.

use std::convert::Infallible;
use std::io::BufRead;

use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_time::{Duration, Timer};
use qsr_core::mk_static;
use qsr_core::utils::camera::{FrameBuffer, FrameSource, ImageCapture};
use qsr_core::utils::config::{BatteryConfig, CameraConfig, PinMap};
use qsr_core::utils::controllers::motors::MotorController;
use qsr_core::utils::controllers::pwm::PwmOutputs;
use qsr_core::utils::controllers::servos::ServoController;
use qsr_core::utils::controllers::{SystemCommand, SystemController, COMMAND_CHANNEL};
use qsr_core::utils::monitor::battery::{BatteryMonitor, BatteryTelemetry, VoltageSource};
use qsr_core::utils::sync::TaskControl;
use static_cell::StaticCell;
use tracing::{error, info};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// Seconds between simulated battery samples
    #[clap(long, default_value_t = 2)]
    battery_interval: u64,
    /// Simulated capture rate, frames per second
    #[clap(long, default_value_t = 4)]
    framerate: u8,
    /// Starting pack voltage for the simulated battery
    #[clap(long, default_value_t = 12.6)]
    start_voltage: f32,
}

/// PWM bank that logs writes instead of driving hardware.
struct ConsoleBank {
    name: &'static str,
}

impl PwmOutputs for ConsoleBank {
    type Error = Infallible;

    fn set_level(&mut self, channel: u8, high: bool) -> Result<(), Infallible> {
        tracing::debug!(bank = self.name, channel, high, "level");
        Ok(())
    }

    fn set_duty(&mut self, channel: u8, duty_pct: f32) -> Result<(), Infallible> {
        tracing::debug!(bank = self.name, channel, duty_pct, "duty");
        Ok(())
    }
}

/// Battery that sags a little with every read.
struct DrainingBattery {
    volts: f32,
    divider: f32,
}

impl VoltageSource for DrainingBattery {
    type Error = Infallible;

    fn read_voltage(&mut self) -> Result<f32, Infallible> {
        self.volts = (self.volts - 0.05).max(9.8);
        Ok(self.volts / self.divider)
    }
}

/// Capture source producing a tiny counter-stamped JPEG skeleton.
struct TestPattern {
    count: u32,
}

impl ImageCapture for TestPattern {
    type Error = Infallible;

    fn capture_jpeg(&mut self) -> Result<Vec<u8>, Infallible> {
        self.count = self.count.wrapping_add(1);
        let n = self.count.to_be_bytes();
        Ok(vec![0xFF, 0xD8, n[0], n[1], n[2], n[3], 0xFF, 0xD9])
    }

    fn release(&mut self) {
        info!("test pattern source released");
    }
}

#[embassy_executor::task]
async fn command_task(
    mut ctrl: SystemController<ConsoleBank, ConsoleBank>,
    ctl: &'static TaskControl,
) {
    while !ctl.stop_requested() {
        let cmd = COMMAND_CHANNEL.receiver().receive().await;
        ctrl.ex_command(cmd);
    }
    ctrl.shutdown();
    ctl.mark_stopped();
}

#[embassy_executor::task]
async fn battery_task(mon: BatteryMonitor<DrainingBattery>) {
    mon.run().await
}

#[embassy_executor::task]
async fn camera_task(src: FrameSource<TestPattern>) {
    src.run().await
}

/// Stand-in for the telemetry pusher: logs every battery alert.
#[embassy_executor::task]
async fn telemetry_task(telemetry: &'static BatteryTelemetry) -> ! {
    loop {
        let status = telemetry.next_event().await;
        info!(
            voltage = status.voltage,
            percentage = status.percentage,
            low = status.is_low,
            critical = status.is_critical,
            "battery alert"
        );
    }
}

/// Stand-in for the video responder: polls the latest frame once a second.
#[embassy_executor::task]
async fn video_task(frames: &'static FrameBuffer) -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
        match frames.read() {
            Some(frame) => info!(seq = frame.seq(), bytes = frame.jpeg().len(), "latest frame"),
            None => info!("no frame yet"),
        }
    }
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    let pins = PinMap::default();
    pins.validate().expect("default pin map is valid");

    let motors = MotorController::new(ConsoleBank { name: "motor" }, pins.motor_channels());
    let servos = ServoController::new(ConsoleBank { name: "servo" }, pins.servo_channels());
    let cmd_ctl: &'static TaskControl = mk_static!(TaskControl, TaskControl::new());
    spawner
        .spawn(command_task(SystemController::new(motors, servos), cmd_ctl))
        .unwrap();

    let battery_config = BatteryConfig {
        check_interval_secs: opts.battery_interval,
        ..Default::default()
    };
    let telemetry: &'static BatteryTelemetry = mk_static!(BatteryTelemetry, BatteryTelemetry::new());
    let battery_ctl: &'static TaskControl = mk_static!(TaskControl, TaskControl::new());
    let adc = DrainingBattery {
        volts: opts.start_voltage,
        divider: battery_config.divider,
    };
    spawner
        .spawn(battery_task(BatteryMonitor::new(
            adc,
            battery_config,
            telemetry,
            battery_ctl,
        )))
        .unwrap();
    spawner.spawn(telemetry_task(telemetry)).unwrap();

    let camera_config = CameraConfig {
        framerate: opts.framerate,
        ..Default::default()
    };
    let frames: &'static FrameBuffer = mk_static!(FrameBuffer, FrameBuffer::new());
    let camera_ctl: &'static TaskControl = mk_static!(TaskControl, TaskControl::new());
    spawner
        .spawn(camera_task(FrameSource::new(
            TestPattern { count: 0 },
            &camera_config,
            frames,
            camera_ctl,
        )))
        .unwrap();
    spawner.spawn(video_task(frames)).unwrap();

    // stdin is the stand-in operator link: one JSON command per line
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match SystemCommand::from_json(line) {
                Ok(cmd) => {
                    if COMMAND_CHANNEL.sender().try_send(cmd).is_err() {
                        error!("command queue full, dropping input");
                    }
                }
                Err(e) => error!(?e, "invalid command line"),
            }
        }
        // operator gone: engage the failsafe, then let the loop wind down
        info!("operator link closed");
        cmd_ctl.request_stop();
        let _ = COMMAND_CHANNEL.sender().try_send(SystemCommand::EStop);
    });

    info!("mock rig up; feed JSON commands on stdin");

    cmd_ctl.wait_stopped().await;
    battery_ctl.stop().await;
    camera_ctl.stop().await;
    info!("shutdown complete");
    std::process::exit(0);
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
