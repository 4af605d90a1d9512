//! Stage handler functions and table builder.
//!
//! ```text
//!  IDLE ──[start]──▶ MASHING ──▶ MASH-OUT ──▶ BOIL HEAT-UP ──▶ BOILING ──▶ IDLE
//!
//!  MASHING / MASH-OUT:  temp gate + confirm → countdown; expiry + confirm → next
//!  BOIL HEAT-UP:        countdown armed on entry; expiry + confirm → BOILING
//!  BOILING:             confirm → countdown; expiry → complete; confirm → IDLE
//!
//!  any active stage ──[pause]──▶ PAUSED ──[resume]──▶ same stage
//! ```

use log::info;

use super::context::BrewContext;
use super::{BrewStage, StageDescriptor};

/// Build the static stage table. Called once at startup.
pub fn build_stage_table() -> [StageDescriptor; BrewStage::COUNT] {
    [
        StageDescriptor {
            id: BrewStage::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        StageDescriptor {
            id: BrewStage::Mashing,
            name: "Mashing",
            on_enter: Some(circulate_enter),
            on_exit: None,
            on_update: mashing_update,
        },
        StageDescriptor {
            id: BrewStage::MashOut,
            name: "Mash-out",
            on_enter: Some(circulate_enter),
            on_exit: None,
            on_update: mash_out_update,
        },
        StageDescriptor {
            id: BrewStage::BoilHeatup,
            name: "Boil heat-up",
            on_enter: Some(kettle_only_enter),
            on_exit: None,
            on_update: boil_heatup_update,
        },
        StageDescriptor {
            id: BrewStage::Boiling,
            name: "Boiling",
            on_enter: Some(kettle_only_enter),
            on_exit: Some(boiling_exit),
            on_update: boiling_update,
        },
        StageDescriptor {
            id: BrewStage::Paused,
            name: "Paused",
            on_enter: Some(paused_enter),
            on_exit: None,
            on_update: paused_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut BrewContext) {
    ctx.set_heat_now(false);
    ctx.commands.pump = false;
    ctx.reset_countdown();
    ctx.session.stage_before_pause = None;
    ctx.session.pause_elapsed_ms = 0;
    info!("IDLE: heat and pump off");
}

/// Outputs are only changed by manual toggles while idle.
fn idle_update(_ctx: &mut BrewContext) -> Option<BrewStage> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MASHING / MASH-OUT: pump circulates, heat follows the thermostat
// ═══════════════════════════════════════════════════════════════════════════

fn circulate_enter(ctx: &mut BrewContext) {
    ctx.commands.pump = true;
}

fn mashing_update(ctx: &mut BrewContext) -> Option<BrewStage> {
    let setpoint = ctx.config.mash_setpoint_c;
    let gate = setpoint - ctx.config.hysteresis_c;
    ctx.commands.pump = true;
    ctx.regulate_heat(setpoint);

    if !ctx.session.timer_running {
        let warm = ctx.readings.kettle.is_some_and(|t| t >= gate);
        if ctx.confirm_when(warm) {
            info!("MASHING: rest temperature confirmed, {} s countdown", ctx.config.mash_secs);
            ctx.arm_countdown();
        }
        return None;
    }

    let expired = ctx.remaining_secs(BrewStage::Mashing) == 0;
    if ctx.confirm_when(expired) {
        info!("MASHING: complete, moving to mash-out");
        ctx.reset_countdown();
        return Some(BrewStage::MashOut);
    }
    None
}

fn mash_out_update(ctx: &mut BrewContext) -> Option<BrewStage> {
    let setpoint = ctx.config.mash_out_setpoint_c;
    ctx.commands.pump = true;
    ctx.regulate_heat(setpoint);

    if !ctx.session.timer_running {
        let hot = ctx.readings.kettle.is_some_and(|t| t >= setpoint);
        if ctx.confirm_when(hot) {
            info!("MASH-OUT: temperature confirmed, {} s countdown", ctx.config.mash_out_secs);
            ctx.arm_countdown();
        }
        return None;
    }

    let expired = ctx.remaining_secs(BrewStage::MashOut) == 0;
    if ctx.confirm_when(expired) {
        info!("MASH-OUT: complete, boil heat-up for {} s", ctx.config.boil_heatup_secs);
        // Heat-up has no gate: its countdown starts on entry.
        ctx.reset_countdown();
        ctx.arm_countdown();
        return Some(BrewStage::BoilHeatup);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOIL HEAT-UP / BOILING: pump off, constant heat
// ═══════════════════════════════════════════════════════════════════════════

fn kettle_only_enter(ctx: &mut BrewContext) {
    ctx.commands.pump = false;
}

fn boil_heatup_update(ctx: &mut BrewContext) -> Option<BrewStage> {
    ctx.commands.pump = false;
    ctx.force_heat(true);

    let expired = ctx.remaining_secs(BrewStage::BoilHeatup) == 0;
    if ctx.confirm_when(expired) {
        info!("BOIL HEAT-UP: done, waiting for boil point");
        ctx.reset_countdown();
        return Some(BrewStage::Boiling);
    }
    None
}

fn boiling_update(ctx: &mut BrewContext) -> Option<BrewStage> {
    ctx.commands.pump = false;

    if !ctx.session.timer_running {
        ctx.force_heat(true);
        if ctx.confirm_when(true) {
            info!("BOILING: boil point confirmed, {} s countdown", ctx.config.boil_secs);
            ctx.arm_countdown();
        }
        return None;
    }

    if !ctx.session.boil_complete && ctx.remaining_secs(BrewStage::Boiling) == 0 {
        info!("BOILING: countdown finished");
        ctx.session.boil_complete = true;
    }
    ctx.force_heat(!ctx.session.boil_complete);

    if ctx.confirm_when(ctx.session.boil_complete) {
        info!("BOILING: brew finished");
        return Some(BrewStage::Idle);
    }
    None
}

fn boiling_exit(ctx: &mut BrewContext) {
    ctx.session.boil_complete = false;
}

// ═══════════════════════════════════════════════════════════════════════════
//  PAUSED: everything off, countdown frozen in the session
// ═══════════════════════════════════════════════════════════════════════════

fn paused_enter(ctx: &mut BrewContext) {
    ctx.set_heat_now(false);
    ctx.commands.pump = false;
    ctx.clear_alert();
    info!(
        "PAUSED: {:?} banked at {} ms",
        ctx.session.stage_before_pause, ctx.session.pause_elapsed_ms
    );
}

fn paused_update(_ctx: &mut BrewContext) -> Option<BrewStage> {
    None
}
