//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production), one `TAG | k=v`
//! line per event. The web page and display adapters implement the same
//! trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn celsius(v: Option<f32>) -> f32 {
    v.unwrap_or(f32::NAN)
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | stage={:?} | status=\"{}\" | remaining={}s | \
                     kettle={:.1}\u{00b0}C valve={:.1}\u{00b0}C | heat={} pump={} | \
                     faults=0b{:08b}",
                    t.stage,
                    t.status,
                    t.remaining_secs,
                    celsius(t.kettle_c),
                    celsius(t.valve_c),
                    if t.heat_on { "ON" } else { "OFF" },
                    if t.pump_on { "ON" } else { "OFF" },
                    t.fault_flags,
                );
            }
            AppEvent::Started(stage) => {
                info!("START | stage={:?}", stage);
            }
            AppEvent::StageChanged { from, to } => {
                info!("STAGE | {:?} -> {:?}", from, to);
            }
            AppEvent::CountdownStarted { stage, duration_secs } => {
                info!("TIMER | stage={:?} duration={}s", stage, duration_secs);
            }
            AppEvent::AwaitingConfirmation(stage) => {
                info!("CONFIRM | awaiting stage={:?}", stage);
            }
            AppEvent::Confirmed(stage) => {
                info!("CONFIRM | accepted stage={:?}", stage);
            }
            AppEvent::HeatupStarted => {
                info!("HEATUP | started");
            }
            AppEvent::HeatSwitched(on) => {
                info!("HEAT | {}", if *on { "ON" } else { "OFF" });
            }
            AppEvent::SensorFault(probe) => {
                warn!("SENSOR | probe={:?} reading lost", probe);
            }
            AppEvent::CheckpointRestored { stage, age_secs } => {
                info!("RESTORE | stage={:?} age={}s", stage, age_secs);
            }
            AppEvent::CheckpointRejected(reason) => {
                warn!("RESTORE | rejected reason={:?}", reason);
            }
            AppEvent::PersistenceFailed => {
                warn!("PERSIST | checkpoint write failed, reboot recovery not guaranteed");
            }
        }
    }
}
