// MIT License - Copyright (c) 2026 Peter Wright
// Zone model

use bitflags::bitflags;

bitflags! {
    /// Zone status bitmask as reported by the monitoring service.
    ///
    /// The bit values are the service's own; the gaps are codes it defines
    /// but this bridge has no use for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ZoneStatus: u32 {
        const BYPASSED    = 1;
        const FAULT       = 2;
        /// Trouble / cover tamper.
        const TAMPER      = 8;
        const LOW_BATTERY = 64;
        const TRIGGERED   = 256;
    }
}

/// Sensor category of a zone.
///
/// The service reports one numeric type per zone; the adapter only cares
/// about the families exposed as predicates on [`Zone`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    /// Perimeter/entry security sensor (doors, windows, glass break).
    Security,
    Motion,
    Fire,
    CarbonMonoxide,
    Medical,
    Temperature,
    /// Panic/wireless button. Button zones get no diagnostic sensors.
    Button,
    Unknown,
}

/// A single monitored sensor point.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: u32,
    pub description: String,
    /// The partition this zone belongs to for its lifetime.
    pub partition_id: u8,
    pub zone_type: ZoneType,
    pub can_be_bypassed: bool,
    /// Serial number of the physical sensor, when the service reports one.
    pub sensor_serial_number: Option<String>,
    pub status: ZoneStatus,
}

impl Zone {
    pub fn new(id: u32, description: impl Into<String>, partition_id: u8) -> Self {
        Self {
            id,
            description: description.into(),
            partition_id,
            zone_type: ZoneType::Security,
            can_be_bypassed: true,
            sensor_serial_number: None,
            status: ZoneStatus::empty(),
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.status.contains(ZoneStatus::BYPASSED)
    }

    pub fn is_faulted(&self) -> bool {
        self.status.contains(ZoneStatus::FAULT)
    }

    pub fn is_tampered(&self) -> bool {
        self.status.contains(ZoneStatus::TAMPER)
    }

    pub fn is_low_battery(&self) -> bool {
        self.status.contains(ZoneStatus::LOW_BATTERY)
    }

    pub fn is_triggered(&self) -> bool {
        self.status.contains(ZoneStatus::TRIGGERED)
    }

    pub fn is_type_motion(&self) -> bool {
        matches!(self.zone_type, ZoneType::Motion)
    }

    pub fn is_type_fire(&self) -> bool {
        matches!(self.zone_type, ZoneType::Fire)
    }

    pub fn is_type_carbon_monoxide(&self) -> bool {
        matches!(self.zone_type, ZoneType::CarbonMonoxide)
    }

    pub fn is_type_medical(&self) -> bool {
        matches!(self.zone_type, ZoneType::Medical)
    }

    pub fn is_type_temperature(&self) -> bool {
        matches!(self.zone_type, ZoneType::Temperature)
    }

    pub fn is_type_button(&self) -> bool {
        matches!(self.zone_type, ZoneType::Button)
    }
}
