//! Outbound application events.
//!
//! The [`BrewService`](super::service::BrewService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to serial, push to the web page,
//! refresh the display.

use serde::Serialize;

use crate::checkpoint::Restore;
use crate::fsm::BrewStage;
use crate::sensors::Probe;
use crate::status::StatusText;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The service has started (carries the initial, possibly restored, stage).
    Started(BrewStage),

    /// The stage changed.
    StageChanged { from: BrewStage, to: BrewStage },

    /// A stage countdown was armed.
    CountdownStarted { stage: BrewStage, duration_secs: u32 },

    /// The alert was raised; the operator must press the button.
    AwaitingConfirmation(BrewStage),

    /// A latched confirmation was consumed.
    Confirmed(BrewStage),

    /// Boil heat-up began (the buzzer blips once).
    HeatupStarted,

    /// The heat valve relay switched.
    HeatSwitched(bool),

    /// A probe fault was raised.
    SensorFault(Probe),

    /// A session was resumed from the stored checkpoint.
    CheckpointRestored { stage: BrewStage, age_secs: u64 },

    /// A stored checkpoint was discarded.
    CheckpointRejected(Restore),

    /// A checkpoint or config write failed; RAM state is kept.
    PersistenceFailed,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryData {
    pub stage: BrewStage,
    pub status: StatusText,
    pub remaining_secs: u32,
    pub timer_running: bool,
    pub awaiting_confirmation: bool,
    pub kettle_c: Option<f32>,
    pub valve_c: Option<f32>,
    pub heat_on: bool,
    pub pump_on: bool,
    pub fault_flags: u8,
}
