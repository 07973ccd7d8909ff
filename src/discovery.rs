// MIT License - Copyright (c) 2026 Peter Wright
// Home Assistant MQTT discovery payloads and topic layout

use serde::Serialize;

use crate::binary_sensor::{LocationSensorKind, ZoneSensorKind};
use crate::button::{LocationButtonKind, ZoneButtonKind};
use crate::client::{Location, Zone};
use crate::identity;

pub const PAYLOAD_ONLINE: &str = "online";
pub const PAYLOAD_OFFLINE: &str = "offline";
pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";
pub const PAYLOAD_PRESS: &str = "PRESS";

/// Command template forwarding the action and any entered code as JSON.
const ALARM_COMMAND_TEMPLATE: &str = r#"{"action": "{{ action }}", "code": "{{ code }}"}"#;

/// Topic layout under the configured base and discovery prefixes.
#[derive(Debug, Clone)]
pub struct Topics {
    base: String,
    discovery_prefix: String,
}

impl Topics {
    pub fn new(base: impl Into<String>, discovery_prefix: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            discovery_prefix: discovery_prefix.into(),
        }
    }

    /// Bridge-wide availability topic; doubles as the update-failure surface.
    pub fn availability(&self) -> String {
        format!("{}/availability", self.base)
    }

    pub fn alarm_state(&self, unique_id: &str) -> String {
        format!("{}/alarm/{unique_id}/state", self.base)
    }

    pub fn alarm_command(&self, unique_id: &str) -> String {
        format!("{}/alarm/{unique_id}/set", self.base)
    }

    pub fn alarm_attributes(&self, unique_id: &str) -> String {
        format!("{}/alarm/{unique_id}/attributes", self.base)
    }

    pub fn sensor_state(&self, unique_id: &str) -> String {
        format!("{}/sensor/{unique_id}/state", self.base)
    }

    pub fn button_command(&self, unique_id: &str) -> String {
        format!("{}/button/{unique_id}/press", self.base)
    }

    /// Retained discovery config topic for one entity.
    pub fn config(&self, component: &str, unique_id: &str) -> String {
        format!("{}/{component}/{unique_id}/config", self.discovery_prefix)
    }

    /// Wildcard matching every command topic the bridge subscribes to.
    pub fn command_subscription(&self) -> String {
        format!("{}/+/+/set", self.base)
    }

    pub fn press_subscription(&self) -> String {
        format!("{}/+/+/press", self.base)
    }
}

/// The `device` block shared by every discovery payload.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceBlock {
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_device: Option<String>,
}

/// Device block for a location's security panel.
pub fn location_device(location: &Location) -> DeviceBlock {
    let serial = identity::location_device_identifier(location);
    DeviceBlock {
        identifiers: vec![serial.clone().unwrap_or_else(|| location.id.to_string())],
        manufacturer: identity::location_device_manufacturer(location.id).to_string(),
        model: identity::location_device_model(location.id).map(str::to_string),
        name: identity::location_device_name(location),
        serial_number: serial,
        via_device: None,
    }
}

/// Device block for a zone's sensor, hanging off the panel device.
pub fn zone_device(location: &Location, zone: &Zone) -> DeviceBlock {
    DeviceBlock {
        identifiers: vec![identity::zone_device_identifier(zone)],
        manufacturer: identity::zone_device_manufacturer(location.id, zone.id).to_string(),
        model: identity::zone_device_model(location.id, zone.id).map(str::to_string),
        name: zone.description.clone(),
        serial_number: zone.sensor_serial_number.clone(),
        via_device: identity::location_device_identifier(location),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlarmPanelDiscovery {
    /// `None` (partition 1) takes the device name.
    pub name: Option<String>,
    pub unique_id: String,
    pub state_topic: String,
    pub command_topic: String,
    pub command_template: String,
    pub json_attributes_topic: String,
    pub availability_topic: String,
    pub payload_disarm: String,
    pub payload_arm_home: String,
    pub payload_arm_away: String,
    pub payload_arm_night: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub code_arm_required: bool,
    pub code_disarm_required: bool,
    pub device: DeviceBlock,
}

/// Discovery config for one (location, partition) alarm panel.
pub fn alarm_panel(
    topics: &Topics,
    location: &Location,
    partition_id: u8,
    code_required: bool,
) -> (String, AlarmPanelDiscovery) {
    let unique_id = identity::alarm_unique_id(location.id, partition_id);
    let payload = AlarmPanelDiscovery {
        name: (partition_id != 1).then(|| format!("Partition {partition_id}")),
        unique_id: unique_id.clone(),
        state_topic: topics.alarm_state(&unique_id),
        command_topic: topics.alarm_command(&unique_id),
        command_template: ALARM_COMMAND_TEMPLATE.to_string(),
        json_attributes_topic: topics.alarm_attributes(&unique_id),
        availability_topic: topics.availability(),
        payload_disarm: "DISARM".to_string(),
        payload_arm_home: "ARM_HOME".to_string(),
        payload_arm_away: "ARM_AWAY".to_string(),
        payload_arm_night: "ARM_NIGHT".to_string(),
        // REMOTE_CODE keeps validation on this side of the broker.
        code: code_required.then(|| "REMOTE_CODE".to_string()),
        code_arm_required: code_required,
        code_disarm_required: code_required,
        device: location_device(location),
    };
    (topics.config("alarm_control_panel", &unique_id), payload)
}

#[derive(Debug, Clone, Serialize)]
pub struct BinarySensorDiscovery {
    pub name: Option<String>,
    pub unique_id: String,
    pub state_topic: String,
    pub availability_topic: String,
    pub payload_on: String,
    pub payload_off: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,
    pub device: DeviceBlock,
}

fn binary_sensor(
    topics: &Topics,
    unique_id: String,
    name: Option<String>,
    device_class: Option<&'static str>,
    diagnostic: bool,
    device: DeviceBlock,
) -> (String, BinarySensorDiscovery) {
    let payload = BinarySensorDiscovery {
        name,
        unique_id: unique_id.clone(),
        state_topic: topics.sensor_state(&unique_id),
        availability_topic: topics.availability(),
        payload_on: PAYLOAD_ON.to_string(),
        payload_off: PAYLOAD_OFF.to_string(),
        device_class: device_class.map(str::to_string),
        entity_category: diagnostic.then(|| "diagnostic".to_string()),
        device,
    };
    (topics.config("binary_sensor", &unique_id), payload)
}

pub fn location_sensor(
    topics: &Topics,
    location: &Location,
    kind: LocationSensorKind,
) -> (String, BinarySensorDiscovery) {
    binary_sensor(
        topics,
        identity::location_entity_unique_id(location.id, kind.key()),
        Some(kind.name().to_string()),
        Some(kind.device_class().as_str()),
        kind.is_diagnostic(),
        location_device(location),
    )
}

pub fn zone_sensor(
    topics: &Topics,
    location: &Location,
    zone: &Zone,
    kind: ZoneSensorKind,
) -> (String, BinarySensorDiscovery) {
    binary_sensor(
        topics,
        identity::zone_entity_unique_id(location.id, zone.id, kind.key()),
        kind.name().map(str::to_string),
        kind.device_class(zone).map(|class| class.as_str()),
        kind.is_diagnostic(),
        zone_device(location, zone),
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct ButtonDiscovery {
    pub name: Option<String>,
    pub unique_id: String,
    pub command_topic: String,
    pub payload_press: String,
    pub availability_topic: String,
    pub entity_category: String,
    pub device: DeviceBlock,
}

fn button(
    topics: &Topics,
    unique_id: String,
    name: &str,
    device: DeviceBlock,
) -> (String, ButtonDiscovery) {
    let payload = ButtonDiscovery {
        name: Some(name.to_string()),
        unique_id: unique_id.clone(),
        command_topic: topics.button_command(&unique_id),
        payload_press: PAYLOAD_PRESS.to_string(),
        availability_topic: topics.availability(),
        entity_category: "diagnostic".to_string(),
        device,
    };
    (topics.config("button", &unique_id), payload)
}

pub fn location_button(
    topics: &Topics,
    location: &Location,
    kind: LocationButtonKind,
) -> (String, ButtonDiscovery) {
    button(
        topics,
        identity::location_entity_unique_id(location.id, kind.key()),
        kind.name(),
        location_device(location),
    )
}

pub fn zone_button(
    topics: &Topics,
    location: &Location,
    zone: &Zone,
    kind: ZoneButtonKind,
) -> (String, ButtonDiscovery) {
    button(
        topics,
        identity::zone_entity_unique_id(location.id, zone.id, kind.key()),
        kind.name(),
        zone_device(location, zone),
    )
}
