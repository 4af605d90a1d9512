//! GPIO / peripheral pin assignments for the brew kettle controller board.
//!
//! Single source of truth: `main.rs` takes every pin from here rather than
//! hard-coding numbers.

// ---------------------------------------------------------------------------
// Temperature probes (DS18B20, one bus each, 4.7 kΩ pull-up)
// ---------------------------------------------------------------------------

/// Kettle (wort) probe.
pub const KETTLE_PROBE_GPIO: i32 = 4;
/// Return-line probe after the valve.
pub const VALVE_PROBE_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Relays (active-low relay board)
// ---------------------------------------------------------------------------

/// Circulation pump relay.
pub const PUMP_RELAY_GPIO: i32 = 18;
/// Gas valve relay. Released (closed valve) whenever the pin floats.
pub const GAS_RELAY_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Operator I/O
// ---------------------------------------------------------------------------

/// Piezo buzzer, active-high.
pub const BUZZER_GPIO: i32 = 21;
/// Confirmation / start push-button, active-low with internal pull-up.
pub const BUTTON_GPIO: i32 = 15;
/// WS2812 status LED data line (RMT channel 0).
pub const STATUS_LED_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Brightness applied to the solid "active" colour (0–255).
pub const STATUS_LED_BRIGHTNESS: u8 = 64;
