//! Core types for tracker telemetry.
//!
//! - [`RawPacket`] is the verbatim bytes received from a tracker
//! - [`TelemetryRecord`] is a decoded full packet with derived values
//! - [`DecodeOutcome`] distinguishes full, header-only and truncated packets
//! - [`IoStatus`] classifies the IO status code into a device state
//!
//! ## Usage Example
//!
//! ```rust
//! use tracklink::types::IoStatus;
//!
//! let line = "$TRK,S,2234,5678,11345,6789,0.5,120,150923,0.0,E,A,1.2,45,0200,0001,FF,1000,RF01";
//! let record = tracklink::decode(line).into_record().unwrap();
//!
//! assert_eq!(record.io_status, IoStatus::DeviceDisconnected);
//! assert_eq!(record.battery_voltage_volts, Some(1.494140625));
//! assert_eq!(record.display_date(), "15/09/2023");
//! assert!(!tracklink::decode("$TRK,S").is_full());
//! ```

mod io_status;
mod outcome;
mod packet;
mod record;

pub use io_status::{
    DEVICE_DISCONNECTED, ENGINE_ON, ENGINE_ON_DOOR_OPEN, IoStatus, RELAY_ACTIVATED_SOS_PRESSED,
};
pub use outcome::DecodeOutcome;
pub use packet::RawPacket;
pub use record::{Hemisphere, MalformedField, TelemetryRecord};
