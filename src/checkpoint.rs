//! Brew-session recovery record.
//!
//! A [`Checkpoint`] is written after every persisted state change and read
//! once at boot. Its `start_epoch` anchors the current countdown to the wall
//! clock so remaining time is continuous across a reboot. Epoch `0` is the
//! "no checkpoint" sentinel; a running session never writes it unless the
//! wall clock has not been synchronised yet.

use serde::{Deserialize, Serialize};

use crate::fsm::BrewStage;

/// Checkpoints at least this old are presumed abandoned.
pub const STALE_AFTER_SECS: u64 = 3600;

/// Persisted snapshot of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Epoch at which the current stage (or its countdown) started.
    pub start_epoch: u64,
    pub stage: BrewStage,
    pub timer_running: bool,
    /// Stage to return to on resume. Only meaningful when `stage` is `Paused`.
    pub resume_stage: Option<BrewStage>,
    /// Countdown progress banked at pause time.
    pub pause_elapsed_secs: u32,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Outcome of checking a stored checkpoint against the current clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
    /// Sentinel record: nothing to restore.
    Empty,
    /// Within the staleness window; `age_secs` since `start_epoch`.
    Accept { age_secs: u64 },
    /// At or beyond [`STALE_AFTER_SECS`].
    Stale { age_secs: u64 },
    /// The wall clock is not synchronised, so age cannot be judged.
    NoClock,
    /// `start_epoch` is later than the current time.
    FromFuture,
    /// Fields contradict each other (e.g. paused with nothing to resume).
    Inconsistent,
}

impl Checkpoint {
    /// The sentinel written by `reset()` and whenever the session is idle.
    pub const EMPTY: Self = Self {
        start_epoch: 0,
        stage: BrewStage::Idle,
        timer_running: false,
        resume_stage: None,
        pause_elapsed_secs: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.start_epoch == 0
    }

    /// Decide whether this record may be restored at `now_epoch`.
    pub fn evaluate(&self, now_epoch: Option<u64>) -> Restore {
        if self.is_empty() {
            return Restore::Empty;
        }
        if !self.is_consistent() {
            return Restore::Inconsistent;
        }
        let Some(now) = now_epoch else {
            return Restore::NoClock;
        };
        let Some(age_secs) = now.checked_sub(self.start_epoch) else {
            return Restore::FromFuture;
        };
        if age_secs >= STALE_AFTER_SECS {
            Restore::Stale { age_secs }
        } else {
            Restore::Accept { age_secs }
        }
    }

    /// Heat-up starts its countdown on entry, so it is never unarmed.
    fn is_consistent(&self) -> bool {
        let stage = match (self.stage, self.resume_stage) {
            (BrewStage::Idle, _) => return false,
            (BrewStage::Paused, Some(prev)) if prev.is_active() => prev,
            (BrewStage::Paused, _) => return false,
            (_, Some(_)) => return false,
            (stage, None) => stage,
        };
        self.timer_running || stage != BrewStage::BoilHeatup
    }
}
