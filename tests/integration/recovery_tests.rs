//! Reboot recovery: a session written through the real (host-backed)
//! `NvsAdapter` is restored by a fresh `BrewService`.

use crate::mock_hw::{BOOT_EPOCH, MockHardware, MockStore, RecordingSink, SimClock};

use brewctl::adapters::nvs::NvsAdapter;
use brewctl::app::commands::AppCommand;
use brewctl::app::events::AppEvent;
use brewctl::app::ports::{CheckpointPort, StoragePort, Timestamp};
use brewctl::app::service::BrewService;
use brewctl::checkpoint::{Checkpoint, Restore, STALE_AFTER_SECS};
use brewctl::config::SessionConfig;
use brewctl::fsm::BrewStage;

fn boot(store: &mut impl CheckpointPort, now: Timestamp) -> (BrewService, RecordingSink) {
    let mut sink = RecordingSink::new();
    let mut svc = BrewService::new(SessionConfig::default());
    svc.start(now, store, &mut sink).unwrap();
    (svc, sink)
}

/// Start mashing, arm the countdown at `BOOT_EPOCH + 3` and run 600 s.
fn mash_for_ten_minutes(store: &mut impl CheckpointPort) -> (BrewService, SimClock) {
    let mut clock = SimClock::boot();
    let (mut svc, mut sink) = boot(store, clock.now());
    let mut hw = MockHardware::new();

    svc.handle_command(AppCommand::StartMashing, clock.advance(1), &mut hw, store, &mut sink)
        .unwrap();
    hw.set_temps(Some(64.0), Some(60.0));
    svc.tick(clock.advance(1), &mut hw, store, &mut sink).unwrap();
    hw.press();
    svc.tick(clock.advance(1), &mut hw, store, &mut sink).unwrap();
    assert!(svc.is_timer_running());
    svc.tick(clock.advance(600), &mut hw, store, &mut sink).unwrap();
    (svc, clock)
}

#[test]
fn countdown_continues_across_reboot() {
    let mut nvs = NvsAdapter::new().unwrap();
    let (before, clock) = mash_for_ten_minutes(&mut nvs);
    let remaining_before = before.remaining_secs();
    let start_before = before.start_time_formatted();

    // Two minutes without power.
    let reboot = SimClock::reboot_at(clock.epoch - BOOT_EPOCH + 120);
    let (after, sink) = boot(&mut nvs, reboot.now());

    assert_eq!(after.stage(), BrewStage::Mashing);
    assert!(after.is_timer_running());
    assert_eq!(after.remaining_secs(), remaining_before - 120);
    assert_eq!(after.start_time_formatted(), start_before);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::CheckpointRestored { stage: BrewStage::Mashing, age_secs: 720 }
    )));
}

#[test]
fn restored_session_keeps_running() {
    let mut store = MockStore::new();
    let (_, clock) = mash_for_ten_minutes(&mut store);
    let mut reboot = SimClock::reboot_at(clock.epoch - BOOT_EPOCH + 30);
    let (mut svc, mut sink) = boot(&mut store, reboot.now());
    let mut hw = MockHardware::new();
    hw.set_temps(Some(64.0), Some(60.0));

    let remaining = svc.remaining_secs();
    svc.tick(reboot.advance(60), &mut hw, &mut store, &mut sink).unwrap();
    assert_eq!(svc.remaining_secs(), remaining - 60);
    assert!(hw.pump_on());
}

#[test]
fn stale_checkpoint_is_discarded_and_cleared() {
    let mut nvs = NvsAdapter::new().unwrap();
    let _ = mash_for_ten_minutes(&mut nvs);
    let stored = nvs.load_checkpoint();
    assert_eq!(stored.stage, BrewStage::Mashing);

    let reboot = SimClock::reboot_at(stored.start_epoch - BOOT_EPOCH + STALE_AFTER_SECS);
    let (svc, sink) = boot(&mut nvs, reboot.now());

    assert_eq!(svc.stage(), BrewStage::Idle);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::CheckpointRejected(Restore::Stale { .. })
    )));
    assert!(nvs.load_checkpoint().is_empty());
    assert!(!nvs.exists("brew", "ckpt"));
}

#[test]
fn unsynced_clock_rejects_checkpoint() {
    let mut store = MockStore::new();
    let _ = mash_for_ten_minutes(&mut store);

    let (svc, sink) = boot(&mut store, Timestamp::new(0, None));
    assert_eq!(svc.stage(), BrewStage::Idle);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::CheckpointRejected(Restore::NoClock)
    )));
    assert!(store.stored().is_empty());
}

#[test]
fn checkpoint_from_the_future_is_rejected() {
    let mut store = MockStore::new();
    store.checkpoint = Some(Checkpoint {
        start_epoch: BOOT_EPOCH + 500,
        stage: BrewStage::Boiling,
        timer_running: true,
        resume_stage: None,
        pause_elapsed_secs: 0,
    });
    let (svc, _) = boot(&mut store, SimClock::boot().now());
    assert_eq!(svc.stage(), BrewStage::Idle);
    assert!(store.stored().is_empty());
}

#[test]
fn paused_session_restores_paused() {
    let mut store = MockStore::new();
    let (mut svc, mut clock) = mash_for_ten_minutes(&mut store);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    svc.handle_command(AppCommand::Pause, clock.advance(1), &mut hw, &mut store, &mut sink)
        .unwrap();
    let banked = svc.remaining_secs();

    let mut reboot = SimClock::reboot_at(clock.epoch - BOOT_EPOCH + 900);
    let (mut after, mut sink) = boot(&mut store, reboot.now());
    assert_eq!(after.stage(), BrewStage::Paused);
    assert_eq!(after.remaining_secs(), banked);

    after
        .handle_command(AppCommand::Resume, reboot.advance(5), &mut hw, &mut store, &mut sink)
        .unwrap();
    assert_eq!(after.stage(), BrewStage::Mashing);
    assert!(after.is_timer_running());
    assert_eq!(after.remaining_secs(), banked);
}

#[test]
fn unarmed_stage_restores_unarmed() {
    let mut store = MockStore::new();
    let mut clock = SimClock::boot();
    let (mut svc, mut sink) = boot(&mut store, clock.now());
    let mut hw = MockHardware::new();
    svc.handle_command(AppCommand::StartMashOut, clock.advance(1), &mut hw, &mut store, &mut sink)
        .unwrap();

    let (after, _) = boot(&mut store, SimClock::reboot_at(60).now());
    assert_eq!(after.stage(), BrewStage::MashOut);
    assert!(!after.is_timer_running());
    assert_eq!(after.remaining_secs(), after.current_config().mash_out_secs);
}

#[test]
fn corrupt_record_boots_idle() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.write("brew", "ckpt", &[0xFF, 0xFF]).unwrap();
    let (svc, sink) = boot(&mut nvs, SimClock::boot().now());
    assert_eq!(svc.stage(), BrewStage::Idle);
    assert!(!sink.events.iter().any(|e| matches!(e, AppEvent::CheckpointRejected(_))));
}
