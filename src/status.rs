//! Human-readable status for the display, web page and telemetry.
//!
//! Everything here is a pure function of the stage and the
//! [`BrewContext`]; nothing is cached.

use core::fmt::Write;

use heapless::String;

use crate::fsm::context::BrewContext;
use crate::fsm::BrewStage;

/// Status line buffer. Fits the longest line with a 6-digit minute count.
pub type StatusText = String<64>;
/// `MM:SS`, where minutes may exceed 99.
pub type Remaining = String<12>;
/// `HH:MM:SS`.
pub type ClockText = String<8>;

const SECS_PER_DAY: i64 = 86_400;

/// Display name, distinguishing a boil that has not reached its boil point.
pub fn stage_name(stage: BrewStage, ctx: &BrewContext) -> &'static str {
    match stage {
        BrewStage::Idle => "Idle",
        BrewStage::Mashing => "Mashing",
        BrewStage::MashOut => "Mash-out",
        BrewStage::BoilHeatup => "Boil heat-up",
        BrewStage::Boiling if ctx.session.timer_running => "Boiling",
        BrewStage::Boiling => "Waiting for boil",
        BrewStage::Paused => "Paused",
    }
}

/// One-line status, e.g. `Mashing - Time: 42:17` or `Heating to 64.0 °C - Time: 90 min`.
pub fn status_text(stage: BrewStage, ctx: &BrewContext) -> StatusText {
    let mut buf = StatusText::new();
    let minutes = ctx.stage_duration_secs(stage) / 60;

    match stage {
        BrewStage::Idle | BrewStage::Paused => {
            let _ = buf.push_str(stage_name(stage, ctx));
        }
        BrewStage::Boiling if ctx.session.boil_complete => {
            let _ = buf.push_str("Boil complete - press to finish");
        }
        _ if ctx.session.timer_running => {
            let _ = write!(
                buf,
                "{} - Time: {}",
                stage_name(stage, ctx),
                format_mm_ss(ctx.remaining_secs(stage))
            );
        }
        BrewStage::Mashing => {
            let _ = write!(buf, "Heating to {:.1} °C - Time: {} min", ctx.config.mash_setpoint_c, minutes);
        }
        BrewStage::MashOut => {
            let _ = write!(
                buf,
                "Heating to {:.1} °C - Time: {} min",
                ctx.config.mash_out_setpoint_c, minutes
            );
        }
        BrewStage::BoilHeatup => {
            let _ = write!(buf, "Boil heat-up ({} min)", minutes);
        }
        BrewStage::Boiling => {
            let _ = write!(buf, "Waiting for boil point - Time: {} min", minutes);
        }
    }
    buf
}

/// `MM:SS` with unbounded minutes.
pub fn format_mm_ss(secs: u32) -> Remaining {
    let mut buf = Remaining::new();
    let _ = write!(buf, "{:02}:{:02}", secs / 60, secs % 60);
    buf
}

/// Wall-clock `HH:MM:SS` for `epoch_secs` shifted by `utc_offset_secs`.
pub fn format_clock(epoch_secs: u64, utc_offset_secs: i32) -> ClockText {
    let epoch = i64::try_from(epoch_secs).unwrap_or(i64::MAX);
    let local = epoch
        .saturating_add(i64::from(utc_offset_secs))
        .rem_euclid(SECS_PER_DAY);
    let mut buf = ClockText::new();
    let _ = write!(
        buf,
        "{:02}:{:02}:{:02}",
        local / 3600,
        (local % 3600) / 60,
        local % 60
    );
    buf
}

/// Local start time of the current stage, `None` without a synced clock.
pub fn start_time(stage: BrewStage, ctx: &BrewContext) -> Option<ClockText> {
    if stage == BrewStage::Idle || ctx.session.stage_start_epoch == 0 {
        return None;
    }
    Some(format_clock(ctx.session.stage_start_epoch, ctx.config.utc_offset_secs))
}

/// Projected end time: start plus stage duration. `None` until the
/// countdown is armed.
pub fn end_time(stage: BrewStage, ctx: &BrewContext) -> Option<ClockText> {
    if !stage.is_active() || !ctx.session.timer_running || ctx.session.stage_start_epoch == 0 {
        return None;
    }
    let end = ctx
        .session
        .stage_start_epoch
        .saturating_add(u64::from(ctx.stage_duration_secs(stage)));
    Some(format_clock(end, ctx.config.utc_offset_secs))
}

/// Compact glyph for minimal displays.
pub fn symbol(stage: BrewStage) -> char {
    match stage {
        BrewStage::Idle => '░',
        BrewStage::Paused => '║',
        _ => '►',
    }
}
