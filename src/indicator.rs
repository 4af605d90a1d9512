//! Status LED pattern engine with priority-based pattern selection.
//!
//! Produces the RGB value for the on-board addressable LED. The main loop
//! feeds it the brew state each iteration and writes the returned colour
//! to [`StatusLed`](crate::drivers::status_led::StatusLed).
//!
//! ## Priority hierarchy (highest first)
//!
//! 1. **Awaiting confirmation**: red/blue alternation, 250 ms per colour
//! 2. **Process active**: solid green at the configured brightness
//! 3. **Base**: whatever the caller sets (off by default)

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const COLOUR_OFF: Rgb = (0, 0, 0);
pub const COLOUR_ALERT_A: Rgb = (255, 0, 0);
pub const COLOUR_ALERT_B: Rgb = (0, 0, 255);
pub const COLOUR_ACTIVE: Rgb = (0, 255, 0);

const ALERT_TOGGLE_MS: u64 = 250;

/// Pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    Off,
    Solid,
    /// Two colours alternating every `ALERT_TOGGLE_MS`.
    Alternate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PatternRequest {
    colour: Rgb,
    alt: Rgb,
    pattern: PatternId,
    priority: u8,
}

/// LED pattern engine. Stack-allocated, no heap.
pub struct Indicator {
    brightness: u8,
    phase_ms: u64,
    active: Option<PatternRequest>,
    awaiting: bool,
    process_active: bool,
    base: Option<PatternRequest>,
}

impl Indicator {
    pub fn new(brightness: u8) -> Self {
        Self {
            brightness,
            phase_ms: 0,
            active: None,
            awaiting: false,
            process_active: false,
            base: None,
        }
    }

    /// Feed the brew state for this loop iteration.
    pub fn set_brew_state(&mut self, process_active: bool, awaiting_confirmation: bool) {
        self.process_active = process_active;
        self.awaiting = awaiting_confirmation;
    }

    /// Lowest-priority layer, shown when no brew pattern applies.
    pub fn set_base_pattern(&mut self, colour: Rgb, pattern: PatternId) {
        self.base = Some(PatternRequest {
            colour,
            alt: COLOUR_OFF,
            pattern,
            priority: 3,
        });
    }

    /// Advance the pattern phase by `delta_ms` and return the current colour.
    /// The phase restarts whenever the selected pattern changes, so an alert
    /// always opens with red.
    pub fn tick(&mut self, delta_ms: u64) -> Rgb {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);

        let selected = self.select_active();
        if selected != self.active {
            self.phase_ms = 0;
        }
        self.active = selected;

        match &self.active {
            Some(req) => self.generate(req),
            None => COLOUR_OFF,
        }
    }

    fn select_active(&self) -> Option<PatternRequest> {
        if self.awaiting {
            return Some(PatternRequest {
                colour: COLOUR_ALERT_A,
                alt: COLOUR_ALERT_B,
                pattern: PatternId::Alternate,
                priority: 1,
            });
        }
        if self.process_active {
            return Some(PatternRequest {
                colour: Self::scale(COLOUR_ACTIVE, self.brightness),
                alt: COLOUR_OFF,
                pattern: PatternId::Solid,
                priority: 2,
            });
        }
        self.base
    }

    fn generate(&self, req: &PatternRequest) -> Rgb {
        match req.pattern {
            PatternId::Off => COLOUR_OFF,
            PatternId::Solid => req.colour,
            PatternId::Alternate => {
                if (self.phase_ms / ALERT_TOGGLE_MS) % 2 == 0 {
                    req.colour
                } else {
                    req.alt
                }
            }
        }
    }

    fn scale((r, g, b): Rgb, brightness: u8) -> Rgb {
        let br = u16::from(brightness);
        (
            ((u16::from(r) * br + 127) / 255) as u8,
            ((u16::from(g) * br + 127) / 255) as u8,
            ((u16::from(b) * br + 127) / 255) as u8,
        )
    }
}
