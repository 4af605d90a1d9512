//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the brew controller's use cases: stage sequencing via
//! the FSM, heat control, checkpointing and fault tracking. All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
