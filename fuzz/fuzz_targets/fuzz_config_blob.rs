//! Fuzz target: persisted `SessionConfig` blob
//!
//! Stores arbitrary bytes under the config key and loads them back.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Whatever `load` accepts also passes `validate`
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use brewctl::adapters::nvs::NvsAdapter;
use brewctl::app::ports::{ConfigPort, StoragePort};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.write("brew", "cfg", data).unwrap();

    if let Ok(cfg) = nvs.load() {
        assert!(cfg.validate().is_ok());
        nvs.save(&cfg).unwrap();
    }
});
