// MIT License - Copyright (c) 2026 Peter Wright
// Persisted configuration record

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write config file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("MQTT URL must be in format mqtt://host:port, got {0:?}")]
    InvalidMqttUrl(String),
}

/// The full persisted record: credentials, per-location usercodes, options
/// and the MQTT connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub username: String,
    pub password: String,
    /// Access codes keyed by location id. TOML table keys are strings, so
    /// the map is converted on the way in and out.
    #[serde(
        default,
        serialize_with = "serialize_usercodes",
        deserialize_with = "deserialize_usercodes"
    )]
    pub usercodes: HashMap<u32, String>,
}

fn serialize_usercodes<S>(map: &HashMap<u32, String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    // BTreeMap for a stable key order in the written file.
    let string_map: BTreeMap<String, &String> =
        map.iter().map(|(id, code)| (id.to_string(), code)).collect();
    string_map.serialize(serializer)
}

fn deserialize_usercodes<'de, D>(deserializer: D) -> Result<HashMap<u32, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let string_map: HashMap<String, String> = HashMap::deserialize(deserializer)?;
    string_map
        .into_iter()
        .map(|(k, v)| {
            k.parse::<u32>()
                .map(|id| (id, v))
                .map_err(|_| serde::de::Error::custom(format!("invalid location ID: {k}")))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub auto_bypass_low_battery: bool,
    /// When set, arm/disarm commands must carry the location's usercode.
    #[serde(default)]
    pub code_required: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            auto_bypass_low_battery: false,
            code_required: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_url")]
    pub url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    #[serde(default = "default_base_topic")]
    pub base_topic: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_mqtt_url() -> String {
    "mqtt://localhost:1883".to_string()
}
fn default_client_id() -> String {
    "totalconnect-bridge".to_string()
}
fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}
fn default_base_topic() -> String {
    "totalconnect".to_string()
}
fn default_poll_interval() -> u64 {
    30
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            url: default_mqtt_url(),
            client_id: default_client_id(),
            discovery_prefix: default_discovery_prefix(),
            base_topic: default_base_topic(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl MqttConfig {
    /// Split the broker URL into (host, port).
    pub fn host_port(&self) -> Result<(String, u16), ConfigError> {
        let stripped = self
            .url
            .strip_prefix("mqtt://")
            .or_else(|| self.url.strip_prefix("tcp://"))
            .unwrap_or(&self.url);

        let (host, port_str) = stripped
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidMqttUrl(self.url.clone()))?;

        let port: u16 = port_str
            .parse()
            .map_err(|_| ConfigError::InvalidMqttUrl(self.url.clone()))?;

        Ok((host.to_string(), port))
    }
}

impl BridgeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(ConfigError::Write)
    }

    /// The stored access code for a location.
    pub fn usercode(&self, location_id: u32) -> Option<&str> {
        self.service.usercodes.get(&location_id).map(String::as_str)
    }

    /// A record without usercodes predates usercode support and cannot run;
    /// setup has to be completed first.
    pub fn has_usercodes(&self) -> bool {
        !self.service.usercodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [service]
            username = "user@example.com"
            password = "hunter2"
            "#,
        )
        .unwrap();

        assert_eq!(config.mqtt.url, "mqtt://localhost:1883");
        assert_eq!(config.mqtt.discovery_prefix, "homeassistant");
        assert_eq!(config.mqtt.poll_interval_secs, 30);
        assert!(!config.options.code_required);
        assert!(!config.has_usercodes());
    }

    #[test]
    fn test_usercode_keys_parse_to_location_ids() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [service]
            username = "user@example.com"
            password = "hunter2"
            [service.usercodes]
            "123456" = "1234"
            "789012" = "4321"
            "#,
        )
        .unwrap();

        assert_eq!(config.usercode(123456), Some("1234"));
        assert_eq!(config.usercode(789012), Some("4321"));
        assert_eq!(config.usercode(1), None);
        assert!(config.has_usercodes());
    }

    #[test]
    fn test_invalid_usercode_key_rejected() {
        let result: Result<BridgeConfig, _> = toml::from_str(
            r#"
            [service]
            username = "user@example.com"
            password = "hunter2"
            [service.usercodes]
            "not-a-number" = "1234"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_through_file() {
        let mut config: BridgeConfig = toml::from_str(
            r#"
            [service]
            username = "user@example.com"
            password = "hunter2"
            "#,
        )
        .unwrap();
        config.service.usercodes.insert(123456, "1234".to_string());
        config.options.code_required = true;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        config.save(&path).unwrap();

        let loaded = BridgeConfig::load(&path).unwrap();
        assert_eq!(loaded.service.username, "user@example.com");
        assert_eq!(loaded.usercode(123456), Some("1234"));
        assert!(loaded.options.code_required);
    }

    #[test]
    fn test_mqtt_url_parsing() {
        let mut mqtt = MqttConfig::default();
        assert_eq!(mqtt.host_port().unwrap(), ("localhost".to_string(), 1883));

        mqtt.url = "tcp://broker.lan:8883".to_string();
        assert_eq!(mqtt.host_port().unwrap(), ("broker.lan".to_string(), 8883));

        mqtt.url = "no-port".to_string();
        assert!(mqtt.host_port().is_err());

        mqtt.url = "mqtt://host:notaport".to_string();
        assert!(mqtt.host_port().is_err());
    }
}
