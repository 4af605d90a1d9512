//! Brew kettle controller library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod checkpoint;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod indicator;
pub mod pins;
pub mod safety;
pub mod status;

// Hardware-facing layers; the ESP-IDF parts are cfg-gated inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
