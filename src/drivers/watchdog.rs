//! Control-loop watchdog on top of the ESP-IDF task watchdog (TWDT).
//!
//! If the loop stops feeding it, the chip panics and reboots; the relays
//! fall back to their de-energised state and the checkpoint resumes the
//! brew. On the host the watchdog is never armed.

use log::{info, warn};

pub struct Watchdog {
    timeout_ms: u32,
    armed: bool,
}

impl Watchdog {
    /// Arm the TWDT for the calling task with `timeout_ms`.
    pub fn new(timeout_ms: u32) -> Self {
        let armed = match subscribe_current_task(timeout_ms) {
            Ok(()) => {
                info!("Watchdog | armed timeout_ms={}", timeout_ms);
                true
            }
            Err(code) => {
                warn!("Watchdog | not armed code={}", code);
                false
            }
        };
        Self { timeout_ms, armed }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Call once per loop iteration.
    pub fn feed(&self) {
        if self.armed {
            reset_current_task();
        }
    }
}

#[cfg(target_os = "espidf")]
fn subscribe_current_task(timeout_ms: u32) -> Result<(), i32> {
    use esp_idf_svc::sys::{
        ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
    };

    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: plain FFI calls; a null handle means the calling task.
    unsafe {
        let ret = esp_task_wdt_reconfigure(&cfg);
        if ret != ESP_OK {
            warn!("Watchdog | reconfigure code={} (already running?)", ret);
        }
        match esp_task_wdt_add(core::ptr::null_mut()) {
            ESP_OK => Ok(()),
            code => Err(code),
        }
    }
}

#[cfg(target_os = "espidf")]
fn reset_current_task() {
    // SAFETY: only reached after a successful esp_task_wdt_add.
    unsafe {
        esp_idf_svc::sys::esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn subscribe_current_task(_timeout_ms: u32) -> Result<(), i32> {
    Err(-1)
}

#[cfg(not(target_os = "espidf"))]
fn reset_current_task() {}
