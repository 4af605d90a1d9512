//! Function-pointer finite state machine engine for the brew process.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  StageTable                                                │
//! │  ┌────────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ BrewStage  │ on_enter  │ on_exit  │ on_update         │ │
//! │  ├────────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ Idle       │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Mashing    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ MashOut    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ BoilHeatup │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  │ Boiling    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  │ Paused     │ fn(ctx)   │ -        │ fn(ctx)->Option<> │ │
//! │  └────────────┴───────────┴──────────┴───────────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine latches the confirmation edge, then calls
//! `on_update` for the current stage. `Some(next)` runs `on_exit` for the
//! current stage and `on_enter` for the next. Entry actions only set the
//! actuator baseline; countdowns are armed and reset by the sequencing
//! code, so resuming from `Paused` re-enters a stage without touching its
//! timer.

pub mod context;
pub mod states;

use context::BrewContext;
use log::{debug, info};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stage identity
// ---------------------------------------------------------------------------

/// Brewing stages. Must stay in sync with [`states::build_stage_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BrewStage {
    Idle = 0,
    Mashing = 1,
    MashOut = 2,
    BoilHeatup = 3,
    Boiling = 4,
    Paused = 5,
}

impl BrewStage {
    /// Total number of stages, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert a table index back to `BrewStage`. Out-of-range indices
    /// assert in debug builds and fall back to `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Mashing,
            2 => Self::MashOut,
            3 => Self::BoilHeatup,
            4 => Self::Boiling,
            5 => Self::Paused,
            _ => {
                debug_assert!(false, "invalid stage index: {idx}");
                Self::Idle
            }
        }
    }

    /// A stage that runs the process (everything except `Idle` and `Paused`).
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Paused)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StageActionFn = fn(&mut BrewContext);

/// Per-tick update handler. Returns `Some(next)` to trigger a transition.
pub type StageUpdateFn = fn(&mut BrewContext) -> Option<BrewStage>;

/// Static descriptor for one stage. Stored in a fixed-size array.
pub struct StageDescriptor {
    pub id: BrewStage,
    pub name: &'static str,
    pub on_enter: Option<StageActionFn>,
    pub on_exit: Option<StageActionFn>,
    pub on_update: StageUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The brew state machine engine.
///
/// Owns the stage table and the current stage. All session data lives in
/// the [`BrewContext`] threaded through every handler.
pub struct Fsm {
    table: [StageDescriptor; BrewStage::COUNT],
    current: usize,
}

impl Fsm {
    pub fn new(table: [StageDescriptor; BrewStage::COUNT], initial: BrewStage) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter`. Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut BrewContext) {
        info!("FSM starting in stage: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one control tick.
    ///
    /// 1. Latch this tick's confirmation edge (if an alert is raised).
    /// 2. Call `on_update` for the current stage.
    /// 3. On `Some(next)`, run `on_exit(current)` → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut BrewContext) {
        ctx.latch_confirmation();

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Operator start command: begin `stage` with a fresh, unarmed countdown.
    /// Allowed from any stage; an active pause is discarded.
    pub fn begin(&mut self, stage: BrewStage, ctx: &mut BrewContext) {
        ctx.reset_countdown();
        ctx.session.stage_before_pause = None;
        ctx.session.pause_elapsed_ms = 0;
        self.transition(stage, ctx);
    }

    /// Enter `Paused`, banking countdown progress. No-op unless active.
    pub fn pause(&mut self, ctx: &mut BrewContext) -> bool {
        let current = self.current_stage();
        if !current.is_active() {
            debug!("pause ignored in {}", self.table[self.current].name);
            return false;
        }
        ctx.session.stage_before_pause = Some(current);
        ctx.session.pause_elapsed_ms = if ctx.session.timer_running {
            ctx.elapsed_ms()
        } else {
            0
        };
        self.transition(BrewStage::Paused, ctx);
        true
    }

    /// Return from `Paused` to the banked stage with the countdown exactly
    /// where it was. No-op unless paused.
    pub fn resume(&mut self, ctx: &mut BrewContext) -> bool {
        if self.current_stage() != BrewStage::Paused {
            debug!("resume ignored in {}", self.table[self.current].name);
            return false;
        }
        let Some(prev) = ctx.session.stage_before_pause.take() else {
            debug_assert!(false, "paused without a resume stage");
            self.transition(BrewStage::Idle, ctx);
            return true;
        };
        self.transition(prev, ctx);
        ctx.rewind_countdown(ctx.session.pause_elapsed_ms);
        ctx.session.pause_elapsed_ms = 0;
        true
    }

    /// Jump straight to `stage` (used by checkpoint recovery). Runs the entry
    /// action; the caller owns the session fields.
    pub fn force_transition(&mut self, next: BrewStage, ctx: &mut BrewContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_stage(&self) -> BrewStage {
        BrewStage::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: BrewStage, ctx: &mut BrewContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        ctx.stamp_stage_entry();

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
