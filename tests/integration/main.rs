//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the brew service
//! against mock adapters. All tests run on the host with no real
//! hardware required.

mod brew_flow_tests;
mod mock_hw;
mod recovery_tests;
