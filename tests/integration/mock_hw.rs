//! Mock hardware and storage adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO registers.

use std::collections::VecDeque;

use brewctl::app::events::AppEvent;
use brewctl::app::ports::{
    ActuatorPort, CheckpointPort, ConfigError, ConfigPort, EventSink, StorageError,
    TemperaturePort, Timestamp,
};
use brewctl::checkpoint::Checkpoint;
use brewctl::config::SessionConfig;
use brewctl::sensors::ProbeReadings;

/// Wall clock at simulated boot.
pub const BOOT_EPOCH: u64 = 1_700_000_000;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Heat(bool),
    Pump(bool),
    Alert(bool),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub readings: ProbeReadings,
    edges: VecDeque<bool>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_temps(&mut self, kettle: Option<f32>, valve: Option<f32>) {
        self.readings = ProbeReadings::new(kettle, valve);
    }

    /// Queue one confirmation edge for the next tick.
    pub fn press(&mut self) {
        self.edges.push_back(true);
    }

    fn last(&self, pick: fn(ActuatorCall) -> Option<bool>) -> bool {
        self.calls.iter().rev().find_map(|c| pick(*c)).unwrap_or(false)
    }

    pub fn heat_on(&self) -> bool {
        self.last(|c| match c {
            ActuatorCall::Heat(on) => Some(on),
            _ => None,
        })
    }

    pub fn pump_on(&self) -> bool {
        self.last(|c| match c {
            ActuatorCall::Pump(on) => Some(on),
            _ => None,
        })
    }

    pub fn alert_on(&self) -> bool {
        self.last(|c| match c {
            ActuatorCall::Alert(on) => Some(on),
            _ => None,
        })
    }
}

impl TemperaturePort for MockHardware {
    fn read_probes(&mut self) -> ProbeReadings {
        self.readings
    }
}

impl ActuatorPort for MockHardware {
    fn set_heat(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Heat(on));
    }

    fn set_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Pump(on));
    }

    fn set_alert(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Alert(on));
    }

    fn confirmation_edge(&mut self) -> bool {
        self.edges.pop_front().unwrap_or(false)
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// Checkpoint and config store that survives a simulated reboot.
#[derive(Default)]
pub struct MockStore {
    pub checkpoint: Option<Checkpoint>,
    pub config: Option<SessionConfig>,
    pub fail_writes: bool,
    pub writes: usize,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Checkpoint {
        self.checkpoint.unwrap_or(Checkpoint::EMPTY)
    }
}

impl CheckpointPort for MockStore {
    fn load_checkpoint(&self) -> Checkpoint {
        self.stored()
    }

    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.checkpoint = Some(*checkpoint);
        Ok(())
    }
}

impl ConfigPort for MockStore {
    fn load(&self) -> Result<SessionConfig, ConfigError> {
        Ok(self.config.clone().unwrap_or_default())
    }

    fn save(&mut self, config: &SessionConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = Some(config.clone());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Simulated clock ───────────────────────────────────────────

/// Both time bases advancing together, starting at boot.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    pub mono_ms: u64,
    pub epoch: u64,
}

#[allow(dead_code)]
impl SimClock {
    pub fn boot() -> Self {
        Self {
            mono_ms: 0,
            epoch: BOOT_EPOCH,
        }
    }

    /// A fresh boot `offset_secs` of wall time after `BOOT_EPOCH`.
    pub fn reboot_at(offset_secs: u64) -> Self {
        Self {
            mono_ms: 0,
            epoch: BOOT_EPOCH + offset_secs,
        }
    }

    pub fn advance(&mut self, secs: u64) -> Timestamp {
        self.mono_ms += secs * 1000;
        self.epoch += secs;
        self.now()
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.mono_ms, Some(self.epoch))
    }
}
