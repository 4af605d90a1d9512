//! Application service, the hexagonal core.
//!
//! [`BrewService`] owns the stage FSM, the fault monitor and the shared
//! context. It exposes a hardware-agnostic API; all I/O flows through port
//! traits injected at call sites, so the whole brew process is testable
//! with mock adapters.
//!
//! ```text
//!  TemperaturePort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                      │       BrewService         │
//!     ActuatorPort ◀──│  FSM · Thermostat · Faults │ ──▶ CheckpointPort
//!                      └──────────────────────────┘
//! ```
//!
//! Calls must be serialised by the caller: `tick()` and
//! `handle_command()` are never re-entered. Every call that changes a
//! persisted session field writes the checkpoint before returning; a
//! failed write is reported as [`Error::Persistence`] while the RAM
//! transition stays applied.

use log::{debug, info, warn};

use crate::checkpoint::{Checkpoint, Restore};
use crate::config::SessionConfig;
use crate::error::{BrewFault, Error, Result};
use crate::fsm::context::{BrewContext, Session};
use crate::fsm::states::build_stage_table;
use crate::fsm::{BrewStage, Fsm};
use crate::safety::FaultMonitor;
use crate::sensors::Probe;
use crate::status::{self, ClockText, Remaining, StatusText};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, CheckpointPort, ConfigPort, EventSink, TemperaturePort, Timestamp};

/// Config changes are flushed this long after the last edit.
const CONFIG_AUTO_SAVE_DELAY_MS: u64 = 5000;

/// Observable state before a call, diffed afterwards to emit events.
#[derive(Clone, Copy)]
struct Observed {
    stage: BrewStage,
    timer_running: bool,
    awaiting: bool,
    heat: bool,
    confirmations: u32,
    faults: u8,
}

// ───────────────────────────────────────────────────────────────
// BrewService
// ───────────────────────────────────────────────────────────────

/// Orchestrates the brew process.
pub struct BrewService {
    fsm: Fsm,
    ctx: BrewContext,
    faults: FaultMonitor,
    config_dirty: bool,
    dirty_since_ms: u64,
}

impl BrewService {
    /// Construct the service. Does **not** start the FSM; call [`start`](Self::start).
    pub fn new(config: SessionConfig) -> Self {
        Self {
            fsm: Fsm::new(build_stage_table(), BrewStage::Idle),
            ctx: BrewContext::new(config),
            faults: FaultMonitor::new(),
            config_dirty: false,
            dirty_since_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start in `Idle`, then resume the stored session if its checkpoint is
    /// recent enough. A rejected checkpoint is overwritten with the sentinel.
    pub fn start(
        &mut self,
        now: Timestamp,
        store: &mut impl CheckpointPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.ctx.now = now;
        let stored = store.load_checkpoint();

        self.fsm.start(&mut self.ctx);
        self.ctx.checkpoint_dirty = false;

        match stored.evaluate(now.epoch_secs) {
            Restore::Empty => debug!("no checkpoint to restore"),
            Restore::Accept { age_secs } => {
                self.restore(&stored, age_secs);
                info!(
                    "Restored {:?} from checkpoint ({} s old, timer {})",
                    stored.stage, age_secs, stored.timer_running
                );
                sink.emit(&AppEvent::CheckpointRestored {
                    stage: stored.stage,
                    age_secs,
                });
            }
            rejected => {
                warn!("Checkpoint discarded: {:?}", rejected);
                sink.emit(&AppEvent::CheckpointRejected(rejected));
                self.ctx.checkpoint_dirty = true;
            }
        }

        sink.emit(&AppEvent::Started(self.fsm.current_stage()));
        info!("BrewService started in {:?}", self.fsm.current_stage());
        self.persist(store, sink)
    }

    fn restore(&mut self, cp: &Checkpoint, age_secs: u64) {
        self.ctx.session.timer_running = cp.timer_running;
        if cp.stage == BrewStage::Paused {
            self.ctx.session.stage_before_pause = cp.resume_stage;
            self.ctx.session.pause_elapsed_ms = u64::from(cp.pause_elapsed_secs) * 1000;
        }
        self.fsm.force_transition(cp.stage, &mut self.ctx);

        let now_ms = self.ctx.now.mono_ms;
        self.ctx.session.stage_start_epoch = cp.start_epoch;
        self.ctx.session.stage_start_ms = now_ms.wrapping_sub(age_secs.saturating_mul(1000));
        // The stored record already describes this state.
        self.ctx.checkpoint_dirty = false;
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: read probes → stage logic → faults → actuators
    /// → events → checkpoint.
    ///
    /// `hw` satisfies **both** [`TemperaturePort`] and [`ActuatorPort`],
    /// which avoids a double mutable borrow while keeping the port boundary
    /// explicit.
    pub fn tick(
        &mut self,
        now: Timestamp,
        hw: &mut (impl TemperaturePort + ActuatorPort),
        store: &mut impl CheckpointPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.ctx.now = now;
        let before = self.observe();

        // 1. Inputs
        self.ctx.readings = hw.read_probes();
        self.ctx.confirmation_edge = hw.confirmation_edge();

        // 2. Stage logic (thermostat runs inside the handlers)
        self.fsm.tick(&mut self.ctx);

        // 3. Non-fatal faults
        self.faults.evaluate(
            &self.ctx.readings,
            self.active_setpoint(),
            self.ctx.config.valve_offset_c,
        );

        // 4. Outputs
        self.apply_actuators(hw);

        // 5. Events, then the checkpoint
        self.emit_changes(before, sink);
        self.persist(store, sink)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command.
    ///
    /// Commands that make no sense in the current stage (`Resume` while not
    /// paused, a manual toggle during a brew) are ignored. Config commands
    /// fail with [`Error::Config`] when validation rejects the new values.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now: Timestamp,
        hw: &mut impl ActuatorPort,
        store: &mut impl CheckpointPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.ctx.now = now;
        let before = self.observe();

        match cmd {
            AppCommand::StartMashing => {
                info!("Command: start mashing");
                self.fsm.begin(BrewStage::Mashing, &mut self.ctx);
            }
            AppCommand::StartMashOut => {
                info!("Command: start mash-out");
                self.fsm.begin(BrewStage::MashOut, &mut self.ctx);
            }
            AppCommand::StartBoiling => {
                info!("Command: start boiling");
                self.fsm.begin(BrewStage::Boiling, &mut self.ctx);
                // The command itself confirms the boil point.
                self.ctx.arm_countdown();
            }
            AppCommand::Stop => {
                info!("Command: stop");
                self.fsm.begin(BrewStage::Idle, &mut self.ctx);
            }
            AppCommand::Pause => {
                if self.fsm.pause(&mut self.ctx) {
                    info!("Command: pause");
                }
            }
            AppCommand::Resume => {
                if self.fsm.resume(&mut self.ctx) {
                    info!("Command: resume");
                }
            }
            AppCommand::Reset => {
                info!("Command: reset, clearing checkpoint");
                self.fsm.begin(BrewStage::Idle, &mut self.ctx);
                self.ctx.checkpoint_dirty = true;
            }
            AppCommand::ToggleHeat => {
                if self.manual_allowed() {
                    let on = !self.ctx.heat.is_on();
                    self.ctx.set_heat_now(on);
                    info!("Manual heat {}", if on { "ON" } else { "OFF" });
                } else {
                    debug!("Manual heat ignored during {:?}", self.stage());
                }
            }
            AppCommand::TogglePump => {
                if self.manual_allowed() {
                    self.ctx.commands.pump = !self.ctx.commands.pump;
                    info!("Manual pump {}", if self.ctx.commands.pump { "ON" } else { "OFF" });
                } else {
                    debug!("Manual pump ignored during {:?}", self.stage());
                }
            }
            AppCommand::SetConfig(field) => {
                let next = self.ctx.config.with_field(field);
                self.apply_config(next)?;
            }
            AppCommand::UpdateConfig(next) => {
                self.apply_config(next)?;
            }
            AppCommand::SaveConfig => {
                // Backdate so the next auto-save check flushes at once.
                self.config_dirty = true;
                self.dirty_since_ms = now.mono_ms.wrapping_sub(CONFIG_AUTO_SAVE_DELAY_MS);
                info!("Explicit config save requested");
            }
        }

        self.apply_actuators(hw);
        self.emit_changes(before, sink);
        self.persist(store, sink)
    }

    // ── Queries ───────────────────────────────────────────────
    //
    // Time-dependent queries use the timestamp of the last tick or command.

    pub fn stage(&self) -> BrewStage {
        self.fsm.current_stage()
    }

    pub fn stage_name(&self) -> &'static str {
        status::stage_name(self.stage(), &self.ctx)
    }

    pub fn status_text(&self) -> StatusText {
        status::status_text(self.stage(), &self.ctx)
    }

    pub fn remaining_secs(&self) -> u32 {
        self.ctx.remaining_secs(self.stage())
    }

    pub fn remaining_formatted(&self) -> Remaining {
        status::format_mm_ss(self.remaining_secs())
    }

    pub fn start_time_formatted(&self) -> Option<ClockText> {
        status::start_time(self.stage(), &self.ctx)
    }

    pub fn end_time_formatted(&self) -> Option<ClockText> {
        status::end_time(self.stage(), &self.ctx)
    }

    pub fn symbol(&self) -> char {
        status::symbol(self.stage())
    }

    pub fn is_timer_running(&self) -> bool {
        self.ctx.session.timer_running
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.ctx.session.awaiting_confirmation
    }

    pub fn heat_on(&self) -> bool {
        self.ctx.commands.heat
    }

    pub fn pump_on(&self) -> bool {
        self.ctx.commands.pump
    }

    /// Read-only snapshot of the live session.
    pub fn session(&self) -> Session {
        self.ctx.session
    }

    /// What a checkpoint written now would contain.
    pub fn checkpoint(&self) -> Checkpoint {
        self.ctx.checkpoint(self.stage())
    }

    /// Current fault bitmask (0 = no faults). See [`BrewFault`].
    pub fn fault_flags(&self) -> u8 {
        self.faults.faults()
    }

    /// Clone of the live configuration.
    pub fn current_config(&self) -> SessionConfig {
        self.ctx.config.clone()
    }

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            stage: self.stage(),
            status: self.status_text(),
            remaining_secs: self.remaining_secs(),
            timer_running: self.ctx.session.timer_running,
            awaiting_confirmation: self.ctx.session.awaiting_confirmation,
            kettle_c: self.ctx.readings.kettle,
            valve_c: self.ctx.readings.valve,
            heat_on: self.ctx.commands.heat,
            pump_on: self.ctx.commands.pump,
            fault_flags: self.faults.faults(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn manual_allowed(&self) -> bool {
        matches!(self.stage(), BrewStage::Idle | BrewStage::Paused)
    }

    /// Setpoint of the thermostat-controlled stage, if one is running.
    fn active_setpoint(&self) -> Option<f32> {
        match self.stage() {
            BrewStage::Mashing => Some(self.ctx.config.mash_setpoint_c),
            BrewStage::MashOut => Some(self.ctx.config.mash_out_setpoint_c),
            _ => None,
        }
    }

    fn apply_config(&mut self, next: SessionConfig) -> Result<()> {
        if let Err(e) = next.validate() {
            warn!("Config rejected: {}", e);
            return Err(Error::Config(e));
        }
        self.ctx.config = next;
        self.mark_config_dirty();
        info!("Configuration updated at runtime");
        Ok(())
    }

    /// Translate the commanded outputs into port calls.
    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        let cmds = &self.ctx.commands;
        hw.set_heat(cmds.heat);
        hw.set_pump(cmds.pump);
        hw.set_alert(cmds.alert);
    }

    fn observe(&self) -> Observed {
        Observed {
            stage: self.stage(),
            timer_running: self.ctx.session.timer_running,
            awaiting: self.ctx.session.awaiting_confirmation,
            heat: self.ctx.commands.heat,
            confirmations: self.ctx.confirmations,
            faults: self.faults.faults(),
        }
    }

    fn emit_changes(&self, before: Observed, sink: &mut impl EventSink) {
        let after = self.observe();

        if after.confirmations != before.confirmations {
            sink.emit(&AppEvent::Confirmed(before.stage));
        }
        if after.stage != before.stage {
            sink.emit(&AppEvent::StageChanged {
                from: before.stage,
                to: after.stage,
            });
            if after.stage == BrewStage::BoilHeatup {
                sink.emit(&AppEvent::HeatupStarted);
            }
        }
        let armed = after.timer_running
            && after.stage.is_active()
            && (!before.timer_running || after.stage != before.stage)
            && before.stage != BrewStage::Paused;
        if armed {
            sink.emit(&AppEvent::CountdownStarted {
                stage: after.stage,
                duration_secs: self.ctx.stage_duration_secs(after.stage),
            });
        }
        if after.awaiting && !before.awaiting {
            sink.emit(&AppEvent::AwaitingConfirmation(after.stage));
        }
        if after.heat != before.heat {
            sink.emit(&AppEvent::HeatSwitched(after.heat));
        }
        for (fault, probe) in [
            (BrewFault::KettleProbe, Probe::Kettle),
            (BrewFault::ValveProbe, Probe::Valve),
        ] {
            if after.faults & fault.mask() != 0 && before.faults & fault.mask() == 0 {
                sink.emit(&AppEvent::SensorFault(probe));
            }
        }
    }

    /// Write the checkpoint if a persisted field changed. A failed write
    /// leaves the record dirty, so every later call retries it.
    fn persist(&mut self, store: &mut impl CheckpointPort, sink: &mut impl EventSink) -> Result<()> {
        if !self.ctx.checkpoint_dirty {
            return Ok(());
        }
        let cp = self.ctx.checkpoint(self.stage());
        let written = if cp.is_empty() {
            store.clear_checkpoint()
        } else {
            store.save_checkpoint(&cp)
        };
        match written {
            Ok(()) => {
                self.ctx.checkpoint_dirty = false;
                self.faults.set(BrewFault::CheckpointUnsaved, false);
                debug!("Checkpoint written: {:?}", cp);
                Ok(())
            }
            Err(e) => {
                if self.faults.has_fault(BrewFault::CheckpointUnsaved) {
                    debug!("Checkpoint retry failed: {}", e);
                } else {
                    warn!("Checkpoint write failed: {}", e);
                    self.faults.set(BrewFault::CheckpointUnsaved, true);
                    sink.emit(&AppEvent::PersistenceFailed);
                }
                Err(Error::Persistence(e))
            }
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified. Called by the config commands.
    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = self.ctx.now.mono_ms;
        }
    }

    /// Save once the config has been dirty for 5 seconds.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &mut impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        if now_ms.wrapping_sub(self.dirty_since_ms) < CONFIG_AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(&self.ctx.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
