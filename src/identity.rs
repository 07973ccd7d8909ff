// MIT License - Copyright (c) 2026 Peter Wright
// Device and identity mapping

use crate::client::{Location, Zone};

/// Manufacturer reported when the override table has no entry.
pub const DEFAULT_MANUFACTURER: &str = "Resideo";

/// Hardware the service API does not describe, keyed by location id.
/// Zone entries are keyed by zone id within that location.
struct LocationHardware {
    location_id: u32,
    manufacturer: Option<&'static str>,
    model: Option<&'static str>,
    zones: &'static [(u32, ZoneHardware)],
}

struct ZoneHardware {
    manufacturer: Option<&'static str>,
    model: Option<&'static str>,
}

const fn zone_model(model: &'static str) -> ZoneHardware {
    ZoneHardware {
        manufacturer: None,
        model: Some(model),
    }
}

static LOCATION_HARDWARE: [LocationHardware; 1] = [LocationHardware {
    location_id: 1037428,
    manufacturer: None,
    model: Some("VISTA-21iP"),
    zones: &[
        (1, zone_model("2W-B")),
        (2, zone_model("FG1625F")),
        (3, zone_model("944TSP")),
        (4, zone_model("944TSP")),
        (5, zone_model("944TSP")),
        (9, zone_model("944TSP")),
        (10, zone_model("944TSP")),
        (11, zone_model("944TSP")),
        (12, zone_model("944TSP")),
        (13, zone_model("944TSP")),
        (17, zone_model("5820L")),
        (18, zone_model("5820L")),
        (19, zone_model("5820L")),
        (20, zone_model("5820L")),
        (21, zone_model("5800MINI")),
        (22, zone_model("5800MINI")),
    ],
}];

fn location_hardware(location_id: u32) -> Option<&'static LocationHardware> {
    LOCATION_HARDWARE
        .iter()
        .find(|entry| entry.location_id == location_id)
}

fn zone_hardware(location_id: u32, zone_id: u32) -> Option<&'static ZoneHardware> {
    location_hardware(location_id)?
        .zones
        .iter()
        .find(|(id, _)| *id == zone_id)
        .map(|(_, hw)| hw)
}

pub fn location_device_manufacturer(location_id: u32) -> &'static str {
    location_hardware(location_id)
        .and_then(|hw| hw.manufacturer)
        .unwrap_or(DEFAULT_MANUFACTURER)
}

pub fn location_device_model(location_id: u32) -> Option<&'static str> {
    location_hardware(location_id)?.model
}

pub fn zone_device_manufacturer(location_id: u32, zone_id: u32) -> &'static str {
    zone_hardware(location_id, zone_id)
        .and_then(|hw| hw.manufacturer)
        .unwrap_or(DEFAULT_MANUFACTURER)
}

pub fn zone_device_model(location_id: u32, zone_id: u32) -> Option<&'static str> {
    zone_hardware(location_id, zone_id)?.model
}

/// Human-facing name of the location's panel device:
/// location name followed by the device's own name.
pub fn location_device_name(location: &Location) -> String {
    match location.security_device() {
        Some(device) => format!("{} {}", location.name, device.name),
        None => location.name.clone(),
    }
}

/// Stable identifier for the location's panel device.
pub fn location_device_identifier(location: &Location) -> Option<String> {
    location
        .security_device()
        .map(|device| device.serial_number.clone())
}

/// Stable identifier for a zone's sensor device: its serial number, or a
/// synthetic `zone_<id>` when the service reports none.
pub fn zone_device_identifier(zone: &Zone) -> String {
    zone.sensor_serial_number
        .clone()
        .unwrap_or_else(|| format!("zone_{}", zone.id))
}

/// Unique id for an alarm panel entity. Partition 1 keeps the bare location
/// id so single-partition setups don't change identity under multi-partition
/// support.
pub fn alarm_unique_id(location_id: u32, partition_id: u8) -> String {
    if partition_id == 1 {
        location_id.to_string()
    } else {
        format!("{location_id}_{partition_id}")
    }
}

pub fn location_entity_unique_id(location_id: u32, key: &str) -> String {
    format!("{location_id}_{key}")
}

pub fn zone_entity_unique_id(location_id: u32, zone_id: u32, key: &str) -> String {
    format!("{location_id}_{zone_id}_{key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SecurityDevice;

    #[test]
    fn test_known_location_override() {
        assert_eq!(location_device_model(1037428), Some("VISTA-21iP"));
        assert_eq!(location_device_manufacturer(1037428), DEFAULT_MANUFACTURER);
    }

    #[test]
    fn test_unknown_location_falls_back() {
        assert_eq!(location_device_model(42), None);
        assert_eq!(location_device_manufacturer(42), DEFAULT_MANUFACTURER);
    }

    #[test]
    fn test_zone_override_lookup() {
        assert_eq!(zone_device_model(1037428, 2), Some("FG1625F"));
        assert_eq!(zone_device_model(1037428, 21), Some("5800MINI"));
        assert_eq!(zone_device_manufacturer(1037428, 2), DEFAULT_MANUFACTURER);

        // Unknown zone in a known location, and unknown location.
        assert_eq!(zone_device_model(1037428, 99), None);
        assert_eq!(zone_device_model(42, 1), None);
        assert_eq!(zone_device_manufacturer(42, 1), DEFAULT_MANUFACTURER);
    }

    #[test]
    fn test_location_device_name_concatenates() {
        let mut location = Location::new(1, "Beach House");
        location.devices.insert(
            3,
            SecurityDevice {
                id: 3,
                name: "Security Panel".into(),
                serial_number: "00112233".into(),
            },
        );
        location.security_device_id = 3;
        assert_eq!(location_device_name(&location), "Beach House Security Panel");
    }

    #[test]
    fn test_zone_identifier_fallback() {
        let mut zone = Zone::new(14, "Hall Motion", 1);
        assert_eq!(zone_device_identifier(&zone), "zone_14");

        zone.sensor_serial_number = Some("A1B2C3".into());
        assert_eq!(zone_device_identifier(&zone), "A1B2C3");
    }

    #[test]
    fn test_alarm_unique_id_partition_rule() {
        assert_eq!(alarm_unique_id(123456, 1), "123456");
        assert_eq!(alarm_unique_id(123456, 2), "123456_2");
    }

    #[test]
    fn test_entity_unique_ids() {
        assert_eq!(location_entity_unique_id(123456, "tamper"), "123456_tamper");
        assert_eq!(zone_entity_unique_id(123456, 7, "bypass"), "123456_7_bypass");
    }
}
