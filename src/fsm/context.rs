//! Shared mutable context threaded through every stage handler.
//!
//! `BrewContext` is the blackboard the stage handlers read from and write
//! to: the tick's timestamp and probe snapshot, the actuator commands to
//! apply afterwards, the session configuration, the live [`Session`] and
//! the heat controller.

use log::debug;

use crate::app::ports::Timestamp;
use crate::checkpoint::Checkpoint;
use crate::config::SessionConfig;
use crate::control::thermostat::HeatController;
use crate::sensors::ProbeReadings;

use super::BrewStage;

// ---------------------------------------------------------------------------
// Actuator commands (written by stage handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Output state requested by the stage logic for this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    pub heat: bool,
    pub pump: bool,
    /// Buzzer / awaiting-confirmation indicator.
    pub alert: bool,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Live brew session. The current stage itself is owned by the [`Fsm`](super::Fsm).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// Stage to return to on resume; `Some` only while paused.
    pub stage_before_pause: Option<BrewStage>,
    /// Countdown for the current stage has been armed.
    pub timer_running: bool,
    /// Epoch of the last stage entry or countdown arm; 0 if the clock was unsynced.
    pub stage_start_epoch: u64,
    /// Monotonic ms matching `stage_start_epoch`.
    pub stage_start_ms: u64,
    /// Countdown progress banked by `pause()`.
    pub pause_elapsed_ms: u64,
    pub awaiting_confirmation: bool,
    /// One-shot latch set by a confirmation edge while awaiting.
    pub confirmed: bool,
    /// Boil countdown reached zero; the next confirmation finishes the brew.
    pub boil_complete: bool,
}

// ---------------------------------------------------------------------------
// BrewContext
// ---------------------------------------------------------------------------

pub struct BrewContext {
    // -- Inputs for this tick --
    pub now: Timestamp,
    pub readings: ProbeReadings,
    /// Debounced confirmation edge sampled for this tick.
    pub confirmation_edge: bool,

    // -- Outputs --
    pub commands: ActuatorCommands,

    pub config: SessionConfig,
    pub session: Session,
    pub heat: HeatController,

    /// A persisted field changed; the service writes a checkpoint.
    pub checkpoint_dirty: bool,
    /// Confirmations consumed so far (wrapping), for event reporting.
    pub confirmations: u32,
}

impl BrewContext {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            now: Timestamp::new(0, None),
            readings: ProbeReadings::default(),
            confirmation_edge: false,
            commands: ActuatorCommands::default(),
            config,
            session: Session::default(),
            heat: HeatController::new(),
            checkpoint_dirty: false,
            confirmations: 0,
        }
    }

    // -- Confirmation protocol ------------------------------------------------

    /// Consume this tick's edge. Only an already raised alert can latch it.
    pub fn latch_confirmation(&mut self) {
        if !core::mem::take(&mut self.confirmation_edge) {
            return;
        }
        if self.session.awaiting_confirmation {
            self.session.confirmed = true;
        } else {
            debug!("confirmation edge dropped: nothing awaiting");
        }
    }

    /// Raise the alert and wait for an edge.
    pub fn await_confirmation(&mut self) {
        if !self.session.awaiting_confirmation {
            debug!("awaiting confirmation");
        }
        self.session.awaiting_confirmation = true;
        self.commands.alert = true;
    }

    /// Consume the latch. Clears the alert when it fires.
    pub fn take_confirmation(&mut self) -> bool {
        if !core::mem::take(&mut self.session.confirmed) {
            return false;
        }
        self.clear_alert();
        self.confirmations = self.confirmations.wrapping_add(1);
        true
    }

    /// Two-phase gate: raise the alert once `ready`, report `true` on a tick
    /// where `ready` still holds and a latched confirmation is consumed. A
    /// confirmation latched while `ready` has lapsed stays held until it
    /// returns.
    pub fn confirm_when(&mut self, ready: bool) -> bool {
        if !ready {
            return false;
        }
        if self.take_confirmation() {
            return true;
        }
        self.await_confirmation();
        false
    }

    pub fn clear_alert(&mut self) {
        self.session.awaiting_confirmation = false;
        self.session.confirmed = false;
        self.commands.alert = false;
    }

    // -- Countdown --------------------------------------------------------------

    /// Start the current stage's countdown now.
    pub fn arm_countdown(&mut self) {
        self.session.timer_running = true;
        self.session.boil_complete = false;
        self.session.stage_start_ms = self.now.mono_ms;
        self.session.stage_start_epoch = self.now.epoch_secs.unwrap_or(0);
        self.checkpoint_dirty = true;
    }

    pub fn reset_countdown(&mut self) {
        self.session.timer_running = false;
        self.session.boil_complete = false;
        self.clear_alert();
        self.checkpoint_dirty = true;
    }

    /// Place the countdown start `elapsed_ms` before now (resume/restore).
    pub fn rewind_countdown(&mut self, elapsed_ms: u64) {
        if !self.session.timer_running {
            return;
        }
        self.session.stage_start_ms = self.now.mono_ms.wrapping_sub(elapsed_ms);
        self.session.stage_start_epoch = match self.now.epoch_secs {
            Some(e) => e.saturating_sub(elapsed_ms / 1000),
            None => 0,
        };
        self.checkpoint_dirty = true;
    }

    /// Record a stage entry.
    pub fn stamp_stage_entry(&mut self) {
        self.session.stage_start_ms = self.now.mono_ms;
        self.session.stage_start_epoch = self.now.epoch_secs.unwrap_or(0);
        self.checkpoint_dirty = true;
    }

    /// Milliseconds since the countdown was armed.
    pub fn elapsed_ms(&self) -> u64 {
        self.now.mono_ms.wrapping_sub(self.session.stage_start_ms)
    }

    /// Configured duration of `stage`. `Idle` reports the mash duration, the
    /// first stage of a brew; `Paused` reports the paused stage's.
    pub fn stage_duration_secs(&self, stage: BrewStage) -> u32 {
        match stage {
            BrewStage::Idle | BrewStage::Mashing => self.config.mash_secs,
            BrewStage::MashOut => self.config.mash_out_secs,
            BrewStage::BoilHeatup => self.config.boil_heatup_secs,
            BrewStage::Boiling => self.config.boil_secs,
            BrewStage::Paused => match self.session.stage_before_pause {
                Some(prev) if prev != BrewStage::Paused => self.stage_duration_secs(prev),
                _ => self.config.mash_secs,
            },
        }
    }

    /// Countdown remaining for `stage`, clamped at zero. An unarmed
    /// countdown reports the full duration.
    pub fn remaining_secs(&self, stage: BrewStage) -> u32 {
        let duration = self.stage_duration_secs(stage);
        if !self.session.timer_running || stage == BrewStage::Idle {
            return duration;
        }
        let elapsed_ms = if stage == BrewStage::Paused {
            self.session.pause_elapsed_ms
        } else {
            self.elapsed_ms()
        };
        let elapsed_secs = u32::try_from(elapsed_ms / 1000).unwrap_or(u32::MAX);
        duration.saturating_sub(elapsed_secs)
    }

    // -- Heat ---------------------------------------------------------------

    /// Run the thermostat against `setpoint_c` and mirror its output.
    pub fn regulate_heat(&mut self, setpoint_c: f32) {
        self.commands.heat = self.heat.regulate(
            self.now.mono_ms,
            self.config.heat_dwell_ms(),
            self.readings,
            setpoint_c,
            self.config.valve_offset_c,
        );
    }

    /// Drive heat to `on`, still dwell-limited.
    pub fn force_heat(&mut self, on: bool) {
        self.commands.heat = self.heat.force(self.now.mono_ms, self.config.heat_dwell_ms(), on);
    }

    /// Switch heat at once (operator actions and safe states).
    pub fn set_heat_now(&mut self, on: bool) {
        self.heat.set_immediate(self.now.mono_ms, on);
        self.commands.heat = on;
    }

    // -- Checkpoint -----------------------------------------------------------

    /// Persisted view of the session while in `stage`. Idle has nothing to
    /// recover and yields the sentinel.
    pub fn checkpoint(&self, stage: BrewStage) -> Checkpoint {
        if stage == BrewStage::Idle {
            return Checkpoint::EMPTY;
        }
        let paused = stage == BrewStage::Paused;
        Checkpoint {
            start_epoch: self.session.stage_start_epoch,
            stage,
            timer_running: self.session.timer_running,
            resume_stage: if paused { self.session.stage_before_pause } else { None },
            pause_elapsed_secs: if paused {
                u32::try_from(self.session.pause_elapsed_ms / 1000).unwrap_or(u32::MAX)
            } else {
                0
            },
        }
    }
}
