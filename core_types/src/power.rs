//! Power states carried in power-change signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A system or driver power level.
///
/// This is not a state machine with fixed transitions: each driver and task
/// independently accepts or rejects a requested target. The only structure
/// the coordinator relies on is the up/down split in [`PowerState::powers_up`],
/// which decides sweep direction and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    /// No power state has been established yet
    Undefined,
    /// Initial bring-up after reset
    Startup,
    /// Fully powered and operational
    On,
    /// Powered down but still configured
    Off,
    /// Light sleep, fast wake
    Sleep,
    /// Deeper sleep, peripherals gated
    Stop,
    /// Standby, most state lost
    Standby,
    /// Hibernate, state preserved externally
    Hibernate,
    /// Final teardown before poweroff or reboot
    Shutdown,
    /// Running on backup battery power
    Battery,
}

impl PowerState {
    /// Returns true when entering this state powers the system up.
    ///
    /// Up-transitions sweep drivers before tasks and walk power priorities
    /// from highest to lowest; every other target is a down-transition with
    /// the reverse ordering.
    pub const fn powers_up(&self) -> bool {
        matches!(self, PowerState::Startup | PowerState::On)
    }

    /// Returns the 16-bit payload value carried in a power signal.
    pub const fn to_wire(&self) -> u16 {
        *self as u16
    }

    /// Decodes a power signal payload.
    pub const fn from_wire(raw: u16) -> Option<PowerState> {
        Some(match raw {
            0 => PowerState::Undefined,
            1 => PowerState::Startup,
            2 => PowerState::On,
            3 => PowerState::Off,
            4 => PowerState::Sleep,
            5 => PowerState::Stop,
            6 => PowerState::Standby,
            7 => PowerState::Hibernate,
            8 => PowerState::Shutdown,
            9 => PowerState::Battery,
            _ => return None,
        })
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerState::Undefined => "undefined",
            PowerState::Startup => "startup",
            PowerState::On => "on",
            PowerState::Off => "off",
            PowerState::Sleep => "sleep",
            PowerState::Stop => "stop",
            PowerState::Standby => "standby",
            PowerState::Hibernate => "hibernate",
            PowerState::Shutdown => "shutdown",
            PowerState::Battery => "battery",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PowerState; 10] = [
        PowerState::Undefined,
        PowerState::Startup,
        PowerState::On,
        PowerState::Off,
        PowerState::Sleep,
        PowerState::Stop,
        PowerState::Standby,
        PowerState::Hibernate,
        PowerState::Shutdown,
        PowerState::Battery,
    ];

    #[test]
    fn test_wire_roundtrip() {
        for state in ALL {
            assert_eq!(PowerState::from_wire(state.to_wire()), Some(state));
        }
    }

    #[test]
    fn test_unknown_wire_value() {
        assert_eq!(PowerState::from_wire(10), None);
        assert_eq!(PowerState::from_wire(u16::MAX), None);
    }

    #[test]
    fn test_direction_split() {
        assert!(PowerState::Startup.powers_up());
        assert!(PowerState::On.powers_up());
        for state in [
            PowerState::Off,
            PowerState::Sleep,
            PowerState::Stop,
            PowerState::Standby,
            PowerState::Hibernate,
            PowerState::Shutdown,
            PowerState::Battery,
            PowerState::Undefined,
        ] {
            assert!(!state.powers_up());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PowerState::On.to_string(), "on");
        assert_eq!(PowerState::Shutdown.to_string(), "shutdown");
    }
}
