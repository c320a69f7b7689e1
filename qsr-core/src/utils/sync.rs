//! Stop/join handshake for long-lived background tasks.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Cooperative stop flag plus exit acknowledgement for one background loop.
///
/// The loop checks `stop_requested` at the top of each cycle and calls
/// `mark_stopped` on its way out. `stop` latches the flag and waits for the
/// acknowledgement, so once it returns the loop has done its last cycle.
/// Intended to be stopped exactly once, at shutdown.
pub struct TaskControl {
    stop: AtomicBool,
    stopped: Signal<CriticalSectionRawMutex, ()>,
}

impl TaskControl {
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            stopped: Signal::new(),
        }
    }

    /// True once a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Latch the stop flag without waiting for the loop to exit.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Called by the loop itself after its final cycle.
    pub fn mark_stopped(&self) {
        self.stopped.signal(());
    }

    /// Wait until the loop acknowledges the stop.
    pub async fn wait_stopped(&self) {
        self.stopped.wait().await;
    }

    /// Request a stop and wait for the acknowledgement.
    pub async fn stop(&self) {
        self.request_stop();
        self.wait_stopped().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_latches() {
        let ctl = TaskControl::new();
        assert!(!ctl.stop_requested());
        ctl.request_stop();
        assert!(ctl.stop_requested());
        ctl.request_stop();
        assert!(ctl.stop_requested());
    }
}
