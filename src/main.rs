//! Brew kettle controller firmware, main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter   Esp32Clock │
//! │  (Temperature+Actuator) (EventSink)    (Config+     (Clock)    │
//! │                                         Checkpoint)            │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              BrewService (pure logic)                  │    │
//! │  │  Stage FSM · Thermostat · Faults · Checkpoint          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Probe task (core 0) ──▶ ProbeCells ──▶ TemperatureHub         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One cooperative loop: the button is sampled every few milliseconds,
//! the brew service ticks every `control_loop_interval_ms`.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::TxRmtDriver;
use log::{info, warn};

use brewctl::adapters::hardware::HardwareAdapter;
use brewctl::adapters::log_sink::LogEventSink;
use brewctl::adapters::nvs::NvsAdapter;
use brewctl::adapters::time::Esp32Clock;
use brewctl::app::commands::AppCommand;
use brewctl::app::events::AppEvent;
use brewctl::app::ports::{ActuatorPort, ClockPort, ConfigPort, EventSink};
use brewctl::app::service::BrewService;
use brewctl::config::SessionConfig;
use brewctl::drivers::button::{ButtonDriver, ButtonEvent};
use brewctl::drivers::ds18b20::Ds18b20;
use brewctl::drivers::relay::{Polarity, Relay};
use brewctl::drivers::status_led::StatusLed;
use brewctl::drivers::task_pin::PROBE_TASK;
use brewctl::drivers::watchdog::Watchdog;
use brewctl::fsm::BrewStage;
use brewctl::indicator::{COLOUR_OFF, Indicator, PatternId};
use brewctl::pins;
use brewctl::sensors::TemperatureHub;
use brewctl::sensors::probe_task::ProbeTask;
use brewctl::sensors::temperature::ProbeCell;

/// Button sampling period; well under the 50 ms debounce.
const POLL_MS: u32 = 10;
const WATCHDOG_TIMEOUT_MS: u32 = 5000;

fn report(result: brewctl::error::Result<()>) {
    if let Err(e) = result {
        warn!("Brew service: {}", e);
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  brewctl v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Relays first, so the gas valve is closed before anything else ──
    // SAFETY: every GPIO number in `pins` is claimed exactly once, here.
    let (gas, pump, buzzer, button, kettle_bus, valve_bus, led_pin) = unsafe {
        (
            AnyOutputPin::new(pins::GAS_RELAY_GPIO),
            AnyOutputPin::new(pins::PUMP_RELAY_GPIO),
            AnyOutputPin::new(pins::BUZZER_GPIO),
            AnyInputPin::new(pins::BUTTON_GPIO),
            AnyIOPin::new(pins::KETTLE_PROBE_GPIO),
            AnyIOPin::new(pins::VALVE_PROBE_GPIO),
            AnyOutputPin::new(pins::STATUS_LED_GPIO),
        )
    };
    let heat = Relay::new("gas valve", PinDriver::output(gas)?, Polarity::ActiveLow);
    let pump = Relay::new("pump", PinDriver::output(pump)?, Polarity::ActiveLow);
    let buzzer = Relay::new("buzzer", PinDriver::output(buzzer)?, Polarity::ActiveHigh);

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SessionConfig::default()
        }
    };

    // ── 4. Probe task ─────────────────────────────────────────
    let kettle_cell = ProbeCell::new();
    let valve_cell = ProbeCell::new();
    let probes = ProbeTask::new(
        (
            Ds18b20::new(PinDriver::input_output_od(kettle_bus)?, Ets),
            kettle_cell.clone(),
        ),
        (
            Ds18b20::new(PinDriver::input_output_od(valve_bus)?, Ets),
            valve_cell.clone(),
        ),
    );
    PROBE_TASK.spawn(move || probes.run(FreeRtos::delay_ms))?;

    // ── 5. Construct adapters ─────────────────────────────────
    let mut button_pin = PinDriver::input(button)?;
    button_pin.set_pull(Pull::Up)?;

    let mut hw = HardwareAdapter::new(
        TemperatureHub::new(kettle_cell, valve_cell),
        heat,
        pump,
        buzzer,
        ButtonDriver::new(button_pin, config.long_press_ms),
    );
    hw.all_off();

    let tx = TxRmtDriver::new(
        peripherals.rmt.channel0,
        led_pin,
        &TransmitConfig::new().clock_divider(1),
    )?;
    let mut led = StatusLed::new(tx);
    let mut indicator = Indicator::new(pins::STATUS_LED_BRIGHTNESS);
    indicator.set_base_pattern(COLOUR_OFF, PatternId::Off);

    let clock = Esp32Clock::new();
    let mut log_sink = LogEventSink::new();

    // ── 6. Brew service: restore, then run ────────────────────
    let mut service = BrewService::new(config.clone());
    report(service.start(clock.now(), &mut nvs, &mut log_sink));

    let watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);
    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    let mut last_poll_ms = clock.monotonic_ms();
    let mut last_tick_ms = last_poll_ms;
    let mut last_telemetry_ms = last_poll_ms;

    loop {
        let now = clock.now();
        let config = service.current_config();

        if hw.poll_button(now.mono_ms) == Some(ButtonEvent::LongPress) {
            if service.stage() == BrewStage::Idle {
                info!("Button: long press -> start mashing");
                report(service.handle_command(
                    AppCommand::StartMashing,
                    now,
                    &mut hw,
                    &mut nvs,
                    &mut log_sink,
                ));
            } else {
                info!("Button: long press ignored during {:?}", service.stage());
            }
        }

        if now.mono_ms.wrapping_sub(last_tick_ms) >= u64::from(config.control_loop_interval_ms) {
            last_tick_ms = now.mono_ms;
            report(service.tick(now, &mut hw, &mut nvs, &mut log_sink));
        }

        let telemetry_ms = u64::from(config.telemetry_interval_secs) * 1000;
        if now.mono_ms.wrapping_sub(last_telemetry_ms) >= telemetry_ms {
            last_telemetry_ms = now.mono_ms;
            log_sink.emit(&AppEvent::Telemetry(service.build_telemetry()));
        }

        indicator.set_brew_state(service.stage().is_active(), service.awaiting_confirmation());
        led.set_colour(indicator.tick(now.mono_ms.wrapping_sub(last_poll_ms)));
        last_poll_ms = now.mono_ms;

        // Config auto-save (5 s debounce after last change).
        service.auto_save_if_needed(now.mono_ms, &mut nvs);

        watchdog.feed();
        FreeRtos::delay_ms(POLL_MS);
    }
}
