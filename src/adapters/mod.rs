//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `hardware` | TemperaturePort    | One-wire probe cells        |
//! |            | ActuatorPort       | Relay GPIOs, button GPIO    |
//! | `log_sink` | EventSink          | Serial log output           |
//! | `nvs`      | ConfigPort         | NVS / in-memory store       |
//! |            | CheckpointPort     |                             |
//! |            | StoragePort        |                             |
//! | `time`     | ClockPort          | ESP32 system timer, SNTP    |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
