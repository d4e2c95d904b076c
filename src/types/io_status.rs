//! IO status code classification

use serde::{Deserialize, Serialize};

/// Status code reported when the ignition is on.
pub const ENGINE_ON: &str = "1000";
/// Status code reported when the ignition is on and a door is open.
pub const ENGINE_ON_DOOR_OPEN: &str = "1C00";
/// Status code reported when the relay fired and the SOS button was pressed.
pub const RELAY_ACTIVATED_SOS_PRESSED: &str = "0101";
/// Status code reported when the device lost external power.
pub const DEVICE_DISCONNECTED: &str = "0200";

/// Device state derived from the IO status field.
///
/// Codes are compared by exact string equality, not as a bitmask, so at most
/// one state applies to any packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoStatus {
    EngineOn,
    EngineOnDoorOpen,
    RelayActivatedSosPressed,
    DeviceDisconnected,
    /// Any code without a known meaning
    Unrecognized,
}

impl IoStatus {
    /// Classify a raw IO status code
    pub fn classify(code: &str) -> Self {
        match code {
            ENGINE_ON => IoStatus::EngineOn,
            ENGINE_ON_DOOR_OPEN => IoStatus::EngineOnDoorOpen,
            RELAY_ACTIVATED_SOS_PRESSED => IoStatus::RelayActivatedSosPressed,
            DEVICE_DISCONNECTED => IoStatus::DeviceDisconnected,
            _ => IoStatus::Unrecognized,
        }
    }

    pub fn engine_on(self) -> bool {
        self == IoStatus::EngineOn
    }

    pub fn engine_on_door_open(self) -> bool {
        self == IoStatus::EngineOnDoorOpen
    }

    pub fn relay_activated_sos_pressed(self) -> bool {
        self == IoStatus::RelayActivatedSosPressed
    }

    pub fn device_disconnected(self) -> bool {
        self == IoStatus::DeviceDisconnected
    }
}
