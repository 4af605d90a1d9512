//! End-to-end brew sequencing through `BrewService` against mock adapters.
//!
//! Every test drives the service the way the control loop does: one
//! `tick()` per simulated step, confirmation edges injected through the
//! mock button, outputs observed through the recorded actuator calls.

use crate::mock_hw::{MockHardware, MockStore, RecordingSink, SimClock};

use brewctl::app::commands::AppCommand;
use brewctl::app::events::AppEvent;
use brewctl::app::service::BrewService;
use brewctl::config::{ConfigField, SessionConfig};
use brewctl::error::BrewFault;
use brewctl::fsm::BrewStage;

struct Brew {
    svc: BrewService,
    hw: MockHardware,
    store: MockStore,
    sink: RecordingSink,
    clock: SimClock,
}

impl Brew {
    fn new(config: SessionConfig) -> Self {
        let mut store = MockStore::new();
        let mut sink = RecordingSink::new();
        let clock = SimClock::boot();
        let mut svc = BrewService::new(config);
        svc.start(clock.now(), &mut store, &mut sink).unwrap();
        Self {
            svc,
            hw: MockHardware::new(),
            store,
            sink,
            clock,
        }
    }

    fn tick(&mut self, secs: u64) {
        let now = self.clock.advance(secs);
        self.svc
            .tick(now, &mut self.hw, &mut self.store, &mut self.sink)
            .unwrap();
    }

    /// Press the button and run the tick that sees it.
    fn confirm(&mut self) {
        self.hw.press();
        self.tick(1);
    }

    fn command(&mut self, cmd: AppCommand) {
        let now = self.clock.advance(1);
        self.svc
            .handle_command(cmd, now, &mut self.hw, &mut self.store, &mut self.sink)
            .unwrap();
    }

    fn stage(&self) -> BrewStage {
        self.svc.stage()
    }
}

fn mash_config() -> SessionConfig {
    SessionConfig {
        mash_secs: 5400,
        mash_setpoint_c: 64.0,
        hysteresis_c: 1.0,
        ..SessionConfig::default()
    }
}

#[test]
fn mash_rest_runs_to_mash_out() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);
    assert_eq!(b.stage(), BrewStage::Mashing);
    assert!(b.hw.pump_on());

    b.hw.set_temps(Some(63.5), Some(60.0));
    b.tick(1);
    assert!(b.svc.awaiting_confirmation());
    assert!(b.hw.alert_on());
    assert!(!b.svc.is_timer_running());

    b.confirm();
    assert!(b.svc.is_timer_running());
    assert!(!b.hw.alert_on());
    assert_eq!(b.svc.remaining_secs(), 5400);

    b.tick(5400);
    assert_eq!(b.stage(), BrewStage::Mashing);
    assert_eq!(b.svc.remaining_secs(), 0);
    assert!(b.svc.awaiting_confirmation());

    b.confirm();
    assert_eq!(b.stage(), BrewStage::MashOut);
    assert!(!b.svc.is_timer_running());
    assert_eq!(b.store.stored().stage, BrewStage::MashOut);
}

#[test]
fn early_press_does_not_arm_the_countdown() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);

    b.hw.set_temps(Some(40.0), Some(40.0));
    b.confirm();
    b.tick(1);
    assert!(!b.svc.is_timer_running());
    assert!(!b.svc.awaiting_confirmation());

    // Warm now, but the earlier press was not carried over.
    b.hw.set_temps(Some(63.0), Some(62.0));
    b.tick(1);
    b.tick(1);
    assert!(!b.svc.is_timer_running());
    assert!(b.svc.awaiting_confirmation());

    b.confirm();
    assert!(b.svc.is_timer_running());
}

#[test]
fn press_while_kettle_has_cooled_waits_for_it_to_warm() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);

    b.hw.set_temps(Some(63.5), Some(60.0));
    b.tick(1);
    assert!(b.svc.awaiting_confirmation());

    b.hw.set_temps(Some(40.0), Some(40.0));
    b.confirm();
    b.tick(1);
    assert!(!b.svc.is_timer_running());
    assert!(b.svc.awaiting_confirmation());

    b.hw.set_temps(None, Some(40.0));
    b.tick(1);
    assert!(!b.svc.is_timer_running());

    // Back at temperature, the held press arms the rest.
    b.hw.set_temps(Some(63.5), Some(60.0));
    b.tick(1);
    assert!(b.svc.is_timer_running());
    assert!(!b.svc.awaiting_confirmation());
    assert_eq!(b.svc.remaining_secs(), 5400);
}

#[test]
fn reset_right_after_start_clears_everything() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);
    assert!(!b.store.stored().is_empty());

    b.command(AppCommand::Reset);
    assert_eq!(b.stage(), BrewStage::Idle);
    assert_eq!(b.store.stored().start_epoch, 0);
    assert_eq!(b.svc.remaining_secs(), 5400);
    assert!(!b.hw.heat_on());
    assert!(!b.hw.pump_on());
    assert_eq!(b.svc.symbol(), '░');
}

#[test]
fn full_brew_day() {
    let mut b = Brew::new(SessionConfig::default());
    let cfg = b.svc.current_config();

    b.command(AppCommand::StartMashing);
    b.hw.set_temps(Some(64.0), Some(62.0));
    b.tick(1);
    b.confirm();
    b.tick(u64::from(cfg.mash_secs));
    b.confirm();
    assert_eq!(b.stage(), BrewStage::MashOut);

    b.hw.set_temps(Some(75.0), Some(74.0));
    b.tick(1);
    assert!(b.svc.awaiting_confirmation());
    b.confirm();
    assert!(b.svc.is_timer_running());
    b.tick(u64::from(cfg.mash_out_secs));
    b.confirm();

    assert_eq!(b.stage(), BrewStage::BoilHeatup);
    assert!(b.svc.is_timer_running());
    assert!(!b.hw.pump_on());
    assert_eq!(b.sink.count(|e| matches!(e, AppEvent::HeatupStarted)), 1);

    b.tick(5);
    assert!(b.hw.heat_on());
    assert_eq!(b.svc.status_text().as_str(), "Boil heat-up - Time: 09:55");

    b.tick(u64::from(cfg.boil_heatup_secs));
    assert!(b.svc.awaiting_confirmation());
    b.confirm();
    assert_eq!(b.stage(), BrewStage::Boiling);
    assert!(!b.svc.is_timer_running());
    assert_eq!(b.svc.stage_name(), "Waiting for boil");

    b.tick(1);
    assert!(b.svc.awaiting_confirmation());
    assert_eq!(b.svc.end_time_formatted(), None);
    b.confirm();
    assert!(b.svc.is_timer_running());
    assert_eq!(b.svc.stage_name(), "Boiling");
    assert!(b.svc.end_time_formatted().is_some());

    b.tick(u64::from(cfg.boil_secs));
    assert!(!b.hw.heat_on());
    assert_eq!(b.svc.status_text().as_str(), "Boil complete - press to finish");
    assert_eq!(b.stage(), BrewStage::Boiling);

    b.confirm();
    assert_eq!(b.stage(), BrewStage::Idle);
    assert!(b.store.stored().is_empty());

    let stages: Vec<_> = b
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StageChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        [
            BrewStage::Mashing,
            BrewStage::MashOut,
            BrewStage::BoilHeatup,
            BrewStage::Boiling,
            BrewStage::Idle,
        ]
    );
}

#[test]
fn pause_and_resume_keep_the_countdown() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);
    b.hw.set_temps(Some(64.0), Some(60.0));
    b.tick(1);
    b.confirm();
    b.tick(600);
    let before = b.svc.remaining_secs();

    b.command(AppCommand::Pause);
    assert_eq!(b.stage(), BrewStage::Paused);
    assert!(!b.hw.heat_on());
    assert!(!b.hw.pump_on());
    assert_eq!(b.svc.symbol(), '║');

    let cp = b.store.stored();
    assert_eq!(cp.stage, BrewStage::Paused);
    assert_eq!(cp.resume_stage, Some(BrewStage::Mashing));

    b.tick(1800);
    assert_eq!(b.svc.remaining_secs(), before - 1);

    b.command(AppCommand::Resume);
    assert_eq!(b.stage(), BrewStage::Mashing);
    assert!(b.svc.is_timer_running());
    assert_eq!(b.svc.remaining_secs(), before - 1);
}

#[test]
fn pause_and_resume_are_noops_outside_a_brew() {
    let mut b = Brew::new(SessionConfig::default());
    b.command(AppCommand::Pause);
    assert_eq!(b.stage(), BrewStage::Idle);
    b.command(AppCommand::Resume);
    assert_eq!(b.stage(), BrewStage::Idle);
    assert_eq!(b.store.writes, 0);
}

#[test]
fn valve_ceiling_overrides_cold_kettle() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);
    b.hw.set_temps(Some(55.0), Some(55.0));
    b.tick(1);
    assert!(b.hw.heat_on());

    b.hw.set_temps(Some(55.0), Some(69.0));
    b.tick(5);
    assert!(!b.hw.heat_on());
    assert_ne!(b.svc.fault_flags() & BrewFault::ValveCeiling.mask(), 0);
    assert_eq!(b.stage(), BrewStage::Mashing);
}

#[test]
fn heat_switches_respect_dwell() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);

    let mut switches = Vec::new();
    let mut last = false;
    for i in 0..60 {
        let kettle = if i % 2 == 0 { 60.0 } else { 65.0 };
        b.hw.set_temps(Some(kettle), Some(60.0));
        b.tick(1);
        if b.svc.heat_on() != last {
            last = b.svc.heat_on();
            switches.push(b.clock.mono_ms);
        }
    }
    assert!(switches.len() > 2);
    for pair in switches.windows(2) {
        assert!(pair[1] - pair[0] >= 5000);
    }
}

#[test]
fn missing_probe_is_reported_not_fatal() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);
    b.hw.set_temps(None, Some(60.0));
    b.tick(1);

    assert_eq!(b.stage(), BrewStage::Mashing);
    assert!(!b.hw.heat_on());
    assert_ne!(b.svc.fault_flags() & BrewFault::KettleProbe.mask(), 0);
    assert_eq!(
        b.sink.count(|e| matches!(e, AppEvent::SensorFault(_))),
        1
    );
    assert!(b.svc.status_text().starts_with("Heating to 64.0"));
}

#[test]
fn stop_cuts_outputs_immediately() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);
    b.hw.set_temps(Some(50.0), Some(50.0));
    b.tick(1);
    assert!(b.hw.heat_on());

    b.command(AppCommand::Stop);
    assert_eq!(b.stage(), BrewStage::Idle);
    assert!(!b.hw.heat_on());
    assert!(!b.hw.pump_on());
    assert!(b.store.stored().is_empty());
}

#[test]
fn failed_write_surfaces_but_keeps_state() {
    let mut b = Brew::new(mash_config());
    b.store.fail_writes = true;
    let now = b.clock.advance(1);
    let res = b
        .svc
        .handle_command(AppCommand::StartMashing, now, &mut b.hw, &mut b.store, &mut b.sink);
    assert!(res.is_err());
    assert_eq!(b.stage(), BrewStage::Mashing);
    assert_ne!(b.svc.fault_flags() & BrewFault::CheckpointUnsaved.mask(), 0);
}

#[test]
fn failed_stop_is_retried_once_storage_recovers() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::StartMashing);
    assert_eq!(b.store.stored().stage, BrewStage::Mashing);

    b.store.fail_writes = true;
    let now = b.clock.advance(1);
    let res = b
        .svc
        .handle_command(AppCommand::Stop, now, &mut b.hw, &mut b.store, &mut b.sink);
    assert!(res.is_err());
    assert_eq!(b.stage(), BrewStage::Idle);

    let now = b.clock.advance(1);
    assert!(b
        .svc
        .tick(now, &mut b.hw, &mut b.store, &mut b.sink)
        .is_err());
    assert_eq!(b.store.stored().stage, BrewStage::Mashing);

    b.store.fail_writes = false;
    for _ in 0..10 {
        b.tick(1);
    }
    assert!(b.store.stored().is_empty());
    assert_eq!(b.svc.fault_flags() & BrewFault::CheckpointUnsaved.mask(), 0);
    assert_eq!(
        b.sink.count(|e| matches!(e, AppEvent::PersistenceFailed)),
        1
    );

    let mut sink = RecordingSink::new();
    let mut rebooted = BrewService::new(mash_config());
    rebooted
        .start(SimClock::reboot_at(20).now(), &mut b.store, &mut sink)
        .unwrap();
    assert_eq!(rebooted.stage(), BrewStage::Idle);
}

#[test]
fn saved_config_reaches_the_store() {
    let mut b = Brew::new(mash_config());
    b.command(AppCommand::SetConfig(ConfigField::MashSetpoint(66.0)));
    assert!(!b.svc.auto_save_if_needed(b.clock.mono_ms, &mut b.store));

    b.command(AppCommand::SaveConfig);
    assert!(b.svc.auto_save_if_needed(b.clock.mono_ms, &mut b.store));
    let stored = b.store.config.clone().unwrap();
    assert_eq!(stored.mash_setpoint_c, 66.0);
    assert_eq!(stored.mash_secs, 5400);
}
