//! Core-pinned background tasks.
//!
//! The one-wire probe task bit-bangs microsecond timing, so it runs as its
//! own FreeRTOS task on the PRO core, away from the control loop.
//! `esp_pthread_set_cfg()` only affects the next `std::thread` spawned from
//! the calling thread, so configuration and spawn stay back to back.

use std::io;
use std::thread::{self, JoinHandle};

use log::info;

/// ESP32-S3 cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU: Wi-Fi/system tasks and the probe task.
    Pro = 0,
    /// APP_CPU: the brew control loop.
    App = 1,
}

/// Placement of one background task.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// NUL-terminated; FreeRTOS copies it as a C string.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

/// The DS18B20 conversion loop.
pub const PROBE_TASK: TaskSpec = TaskSpec {
    name: "probes\0",
    core: Core::Pro,
    priority: 5,
    stack_kb: 4,
};

impl TaskSpec {
    /// Name without the trailing NUL.
    pub fn label(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }

    pub fn spawn(&self, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
        self.configure_next_thread()?;
        info!(
            "Task | spawn name={} core={:?} prio={} stack_kb={}",
            self.label(),
            self.core,
            self.priority,
            self.stack_kb
        );
        thread::Builder::new()
            .name(self.label().into())
            .stack_size(self.stack_kb * 1024)
            .spawn(f)
    }

    #[cfg(target_os = "espidf")]
    fn configure_next_thread(&self) -> io::Result<()> {
        use esp_idf_sys::{ESP_OK, esp_create_default_pthread_config, esp_pthread_set_cfg};

        // SAFETY: `name` is 'static and NUL-terminated; the config is copied.
        let ret = unsafe {
            let mut cfg = esp_create_default_pthread_config();
            cfg.pin_to_core = self.core as i32;
            cfg.prio = i32::from(self.priority);
            cfg.stack_size = (self.stack_kb * 1024) as i32;
            cfg.thread_name = self.name.as_ptr().cast();
            esp_pthread_set_cfg(&cfg)
        };
        if ret == ESP_OK as i32 {
            Ok(())
        } else {
            Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")))
        }
    }

    /// Host threads cannot be pinned; core and priority are ignored.
    #[cfg(not(target_os = "espidf"))]
    fn configure_next_thread(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn label_drops_nul() {
        assert_eq!(PROBE_TASK.label(), "probes");
        assert_eq!(PROBE_TASK.core, Core::Pro);
    }

    #[test]
    fn host_spawn_runs_closure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let handle = PROBE_TASK
            .spawn(move || flag.store(true, Ordering::SeqCst))
            .unwrap();
        assert_eq!(handle.thread().name(), Some("probes"));
        handle.join().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
