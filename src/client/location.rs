// MIT License - Copyright (c) 2026 Peter Wright
// Location, partition and security device models

use std::collections::BTreeMap;

use bitflags::bitflags;

use super::arming::ArmingState;
use super::zone::Zone;

bitflags! {
    /// Location-wide trouble conditions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LocationConditions: u8 {
        const AC_LOSS      = 0b001;
        const LOW_BATTERY  = 0b010;
        const COVER_TAMPER = 0b100;
    }
}

/// An independently armable sub-area of a location.
///
/// Partition 1 is distinguished: it carries the location's primary identity
/// for entities, so single-partition setups keep stable identifiers.
#[derive(Debug, Clone)]
pub struct Partition {
    pub id: u8,
    pub arming_state: ArmingState,
}

impl Partition {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            arming_state: ArmingState::Disarmed,
        }
    }
}

/// A physical security panel registered at a location.
#[derive(Debug, Clone)]
pub struct SecurityDevice {
    pub id: u32,
    pub name: String,
    /// Stable external identifier.
    pub serial_number: String,
}

/// One physical monitored premises.
///
/// Owned by the client; the adapter layer reads through and never caches the
/// partition/zone/device associations itself.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: u32,
    pub name: String,
    pub partitions: BTreeMap<u8, Partition>,
    pub zones: BTreeMap<u32, Zone>,
    pub devices: BTreeMap<u32, SecurityDevice>,
    /// Which of `devices` is the security panel itself.
    pub security_device_id: u32,
    pub arming_state: ArmingState,
    pub conditions: LocationConditions,
    /// The one option the adapter writes back on configuration change.
    pub auto_bypass_low_battery: bool,
}

impl Location {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            partitions: BTreeMap::new(),
            zones: BTreeMap::new(),
            devices: BTreeMap::new(),
            security_device_id: 0,
            arming_state: ArmingState::Disarmed,
            conditions: LocationConditions::empty(),
            auto_bypass_low_battery: false,
        }
    }

    /// The security panel device, if the service reported one.
    pub fn security_device(&self) -> Option<&SecurityDevice> {
        self.devices.get(&self.security_device_id)
    }

    pub fn is_ac_loss(&self) -> bool {
        self.conditions.contains(LocationConditions::AC_LOSS)
    }

    pub fn is_low_battery(&self) -> bool {
        self.conditions.contains(LocationConditions::LOW_BATTERY)
    }

    pub fn is_cover_tampered(&self) -> bool {
        self.conditions.contains(LocationConditions::COVER_TAMPER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_predicates() {
        let mut location = Location::new(123456, "Home");
        assert!(!location.is_ac_loss());
        assert!(!location.is_low_battery());

        location.conditions = LocationConditions::AC_LOSS | LocationConditions::COVER_TAMPER;
        assert!(location.is_ac_loss());
        assert!(location.is_cover_tampered());
        assert!(!location.is_low_battery());
    }

    #[test]
    fn test_security_device_lookup() {
        let mut location = Location::new(123456, "Home");
        location.devices.insert(
            7,
            SecurityDevice {
                id: 7,
                name: "Security Panel".into(),
                serial_number: "1234567890".into(),
            },
        );
        assert!(location.security_device().is_none());

        location.security_device_id = 7;
        assert_eq!(location.security_device().map(|d| d.id), Some(7));
    }
}
