//! Inbound commands to the application service.
//!
//! These represent operator actions (button, web page, serial console)
//! that the [`BrewService`](super::service::BrewService) interprets and
//! acts upon.

use crate::config::{ConfigField, SessionConfig};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Begin the mash stage (also triggered by a long button press).
    StartMashing,
    /// Skip straight to mash-out.
    StartMashOut,
    /// Skip straight to the boil with its countdown armed.
    StartBoiling,
    /// Abort the session and return to idle.
    Stop,
    Pause,
    Resume,
    /// Hard reset: idle, checkpoint cleared.
    Reset,

    /// Manual heat override, honoured only while idle or paused.
    ToggleHeat,
    /// Manual pump override, honoured only while idle or paused.
    TogglePump,

    /// Change a single setting (validated before it is applied).
    SetConfig(ConfigField),
    /// Replace the whole configuration.
    UpdateConfig(SessionConfig),
    /// Persist the current config to NVS immediately.
    SaveConfig,
}
