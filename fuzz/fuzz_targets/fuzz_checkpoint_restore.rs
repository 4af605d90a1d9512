//! Fuzz target: checkpoint decode and boot-time restore
//!
//! Writes arbitrary bytes as the stored checkpoint record, then boots a
//! `BrewService` from it at a fuzz-chosen wall-clock time.
//!
//! Invariants checked:
//! - No panics under any byte sequence or clock value
//! - The service either restores the stored stage or boots `Idle`
//! - A session that boots `Idle` leaves no checkpoint behind
//!
//! cargo fuzz run fuzz_checkpoint_restore

#![no_main]

use brewctl::adapters::nvs::NvsAdapter;
use brewctl::app::events::AppEvent;
use brewctl::app::ports::{CheckpointPort, EventSink, StoragePort, Timestamp};
use brewctl::app::service::BrewService;
use brewctl::config::SessionConfig;
use brewctl::fsm::BrewStage;
use libfuzzer_sys::fuzz_target;

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 9 {
        return;
    }
    let (clock, record) = data.split_at(9);
    let epoch = u64::from_le_bytes(clock[1..9].try_into().unwrap());
    let now = Timestamp::new(u64::from(clock[0]) * 1000, (clock[0] & 1 == 0).then_some(epoch));

    let mut nvs = NvsAdapter::new().unwrap();
    nvs.write("brew", "ckpt", record).unwrap();
    let stored = nvs.load_checkpoint();

    let mut svc = BrewService::new(SessionConfig::default());
    svc.start(now, &mut nvs, &mut Discard).unwrap();

    let stage = svc.stage();
    assert!(stage == BrewStage::Idle || stage == stored.stage);
    if stage == BrewStage::Idle {
        assert!(nvs.load_checkpoint().is_empty());
    }
    let _ = svc.status_text();
    let _ = svc.remaining_formatted();
});
