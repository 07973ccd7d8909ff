// MIT License - Copyright (c) 2026 Peter Wright
// Binary sensor adapters

use crate::client::{Location, Zone};

/// Home Assistant binary_sensor device class, as published in discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Battery,
    Tamper,
    Power,
    Smoke,
    CarbonMonoxide,
    Safety,
    Motion,
    Door,
    Window,
    Sound,
    Problem,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Battery => "battery",
            Self::Tamper => "tamper",
            Self::Power => "power",
            Self::Smoke => "smoke",
            Self::CarbonMonoxide => "carbon_monoxide",
            Self::Safety => "safety",
            Self::Motion => "motion",
            Self::Door => "door",
            Self::Window => "window",
            Self::Sound => "sound",
            Self::Problem => "problem",
        }
    }
}

/// Location-level sensors, one of each per location.
///
/// Each variant is a fixed predicate over the location object — evaluated
/// fresh on every coordinator update, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSensorKind {
    LowBattery,
    Tamper,
    /// AC power present (the client reports loss; inverted here).
    Power,
    Smoke,
    CarbonMonoxide,
    Police,
}

impl LocationSensorKind {
    pub const ALL: [Self; 6] = [
        Self::LowBattery,
        Self::Tamper,
        Self::Power,
        Self::Smoke,
        Self::CarbonMonoxide,
        Self::Police,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::LowBattery => "low_battery",
            Self::Tamper => "tamper",
            Self::Power => "power",
            Self::Smoke => "smoke",
            Self::CarbonMonoxide => "carbon_monoxide",
            Self::Police => "police",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LowBattery => "Battery",
            Self::Tamper => "Tamper",
            Self::Power => "Power",
            Self::Smoke => "Smoke",
            Self::CarbonMonoxide => "Carbon monoxide",
            Self::Police => "Police emergency",
        }
    }

    pub fn device_class(&self) -> DeviceClass {
        match self {
            Self::LowBattery => DeviceClass::Battery,
            Self::Tamper => DeviceClass::Tamper,
            Self::Power => DeviceClass::Power,
            Self::Smoke => DeviceClass::Smoke,
            Self::CarbonMonoxide => DeviceClass::CarbonMonoxide,
            Self::Police => DeviceClass::Safety,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::LowBattery | Self::Tamper | Self::Power)
    }

    pub fn evaluate(&self, location: &Location) -> bool {
        match self {
            Self::LowBattery => location.is_low_battery(),
            Self::Tamper => location.is_cover_tampered(),
            Self::Power => !location.is_ac_loss(),
            Self::Smoke => location.arming_state.is_triggered_fire(),
            Self::CarbonMonoxide => location.arming_state.is_triggered_gas(),
            Self::Police => location.arming_state.is_triggered_police(),
        }
    }
}

/// Zone-level sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSensorKind {
    /// Composite faulted-or-triggered sensor; its device class depends on
    /// the zone.
    Fault,
    Bypass,
    LowBattery,
    Tamper,
}

impl ZoneSensorKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Fault => "zone",
            Self::Bypass => "bypass",
            Self::LowBattery => "low_battery",
            Self::Tamper => "tamper",
        }
    }

    /// `None` keeps the zone's own description as the entity name.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Fault => None,
            Self::Bypass => Some("Bypass"),
            Self::LowBattery => Some("Battery"),
            Self::Tamper => Some("Tamper"),
        }
    }

    pub fn device_class(&self, zone: &Zone) -> Option<DeviceClass> {
        match self {
            Self::Fault => Some(security_zone_device_class(zone)),
            Self::Bypass => None,
            Self::LowBattery => Some(DeviceClass::Battery),
            Self::Tamper => Some(DeviceClass::Tamper),
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, Self::Fault)
    }

    pub fn evaluate(&self, zone: &Zone) -> bool {
        match self {
            Self::Fault => zone.is_faulted() || zone.is_triggered(),
            Self::Bypass => zone.is_bypassed(),
            Self::LowBattery => zone.is_low_battery(),
            Self::Tamper => zone.is_tampered(),
        }
    }
}

/// The sensor set for a zone. Button zones expose only the composite fault
/// sensor.
pub fn zone_sensors(zone: &Zone) -> Vec<ZoneSensorKind> {
    if zone.is_type_button() {
        vec![ZoneSensorKind::Fault]
    } else {
        vec![
            ZoneSensorKind::Fault,
            ZoneSensorKind::Bypass,
            ZoneSensorKind::LowBattery,
            ZoneSensorKind::Tamper,
        ]
    }
}

/// Device class of a security zone's fault sensor: type flags first, then
/// keyword matching on the description, then the generic problem class.
pub fn security_zone_device_class(zone: &Zone) -> DeviceClass {
    if zone.is_type_carbon_monoxide() {
        return DeviceClass::CarbonMonoxide;
    }
    if zone.is_type_fire() {
        return DeviceClass::Smoke;
    }
    if zone.is_type_medical() {
        return DeviceClass::Safety;
    }
    if zone.is_type_motion() {
        return DeviceClass::Motion;
    }
    if zone.is_type_temperature() {
        return DeviceClass::Problem;
    }
    let description = zone.description.to_lowercase();
    if description.contains("door") {
        DeviceClass::Door
    } else if description.contains("glass break") {
        DeviceClass::Sound
    } else if description.contains("window") {
        DeviceClass::Window
    } else {
        DeviceClass::Problem
    }
}
