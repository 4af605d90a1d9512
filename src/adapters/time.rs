//! ESP32 clock adapter.
//!
//! Implements [`ClockPort`] for the brew controller.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` for the monotonic
//!   base, `gettimeofday()` (set by SNTP) for the wall clock.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `SystemTime` for host-side simulation.
//!
//! A wall clock earlier than 2020-01-01 is reported as unsynchronised,
//! which makes checkpoint recovery reject whatever is stored.

use crate::app::ports::ClockPort;

/// Earliest epoch accepted as a synchronised wall clock.
pub const EPOCH_2020: u64 = 1_577_836_800;

/// Clock adapter for the ESP32 platform.
pub struct Esp32Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

/// Filter an epoch reading through the sync threshold.
pub fn synced_epoch(secs: u64) -> Option<u64> {
    (secs >= EPOCH_2020).then_some(secs)
}

#[cfg(target_os = "espidf")]
impl ClockPort for Esp32Clock {
    fn monotonic_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }

    fn epoch_secs(&self) -> Option<u64> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        u64::try_from(tv.tv_sec).ok().and_then(synced_epoch)
    }
}

#[cfg(not(target_os = "espidf"))]
impl ClockPort for Esp32Clock {
    fn monotonic_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn epoch_secs(&self) -> Option<u64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .and_then(|d| synced_epoch(d.as_secs()))
    }
}
