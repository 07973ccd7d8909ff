// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge wiring

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::alarm::{AlarmPanel, PanelCommand};
use crate::binary_sensor::{self, LocationSensorKind, ZoneSensorKind};
use crate::button::{self, ButtonTarget, LocationButtonKind};
use crate::client::{self, ClientError, SharedClient};
use crate::config::{BridgeConfig, ConfigError};
use crate::coordinator::{Coordinator, UpdateEvent};
use crate::discovery::{self, PAYLOAD_OFF, PAYLOAD_OFFLINE, PAYLOAD_ON, PAYLOAD_ONLINE, Topics};
use crate::error::CommandError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Setup is incomplete or the credentials are rejected; the wizard has
    /// to run before the bridge can.
    #[error("authentication required; run the setup or reauth wizard")]
    AuthRequired,

    #[error("initial refresh failed: {0}")]
    InitialRefresh(String),

    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Inbound payload on an alarm command topic.
#[derive(Debug, Deserialize)]
struct AlarmCommandPayload {
    action: String,
    #[serde(default)]
    code: Option<String>,
}

/// One alarm panel entity plus its publish topics.
struct PanelEntry {
    panel: AlarmPanel,
    state_topic: String,
    attributes_topic: String,
}

/// A sensor variant bound to its location/zone address.
enum SensorBinding {
    Location {
        location_id: u32,
        kind: LocationSensorKind,
    },
    Zone {
        location_id: u32,
        zone_id: u32,
        kind: ZoneSensorKind,
    },
}

impl SensorBinding {
    /// Evaluate against the client's cached objects. `None` when the
    /// location or zone has disappeared from the account.
    fn evaluate(&self, shared: &SharedClient) -> Option<bool> {
        let client = client::lock(shared);
        match *self {
            Self::Location { location_id, kind } => {
                Some(kind.evaluate(client.location(location_id)?))
            }
            Self::Zone {
                location_id,
                zone_id,
                kind,
            } => Some(kind.evaluate(client.location(location_id)?.zones.get(&zone_id)?)),
        }
    }
}

struct SensorEntry {
    binding: SensorBinding,
    state_topic: String,
}

/// Everything the bridge publishes and routes, rebuilt on config reload.
struct Entities {
    /// Keyed by command topic.
    panels: HashMap<String, PanelEntry>,
    sensors: Vec<SensorEntry>,
    /// Keyed by press topic.
    buttons: HashMap<String, ButtonTarget>,
    /// Retained discovery configs: (topic, JSON payload).
    discovery: Vec<(String, String)>,
}

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

fn to_json<T: Serialize>(payload: &T) -> String {
    // Discovery/state structs contain nothing a serializer can reject.
    serde_json::to_string(payload).unwrap_or_else(|e| {
        error!("Failed to serialize payload: {e}");
        String::new()
    })
}

/// Walk the client's locations and build the full entity inventory.
fn build_entities(
    shared: &SharedClient,
    coordinator: &Arc<Coordinator>,
    topics: &Topics,
    code_required: bool,
) -> Entities {
    let mut entities = Entities {
        panels: HashMap::new(),
        sensors: Vec::new(),
        buttons: HashMap::new(),
        discovery: Vec::new(),
    };

    let client = client::lock(shared);
    for location in client.locations().values() {
        for partition_id in location.partitions.keys().copied() {
            debug!(
                "Found alarm panel: location {} partition {partition_id}",
                location.id
            );
            let panel = AlarmPanel::new(
                Arc::clone(coordinator),
                location.id,
                partition_id,
                code_required,
            );
            let unique_id = panel.unique_id();
            let (config_topic, payload) =
                discovery::alarm_panel(topics, location, partition_id, code_required);
            entities.discovery.push((config_topic, to_json(&payload)));
            entities.panels.insert(
                topics.alarm_command(&unique_id),
                PanelEntry {
                    panel,
                    state_topic: topics.alarm_state(&unique_id),
                    attributes_topic: topics.alarm_attributes(&unique_id),
                },
            );
        }

        for kind in LocationSensorKind::ALL {
            let (config_topic, payload) = discovery::location_sensor(topics, location, kind);
            entities.sensors.push(SensorEntry {
                binding: SensorBinding::Location {
                    location_id: location.id,
                    kind,
                },
                state_topic: payload.state_topic.clone(),
            });
            entities.discovery.push((config_topic, to_json(&payload)));
        }

        for kind in LocationButtonKind::ALL {
            let (config_topic, payload) = discovery::location_button(topics, location, kind);
            entities.buttons.insert(
                payload.command_topic.clone(),
                ButtonTarget::Location {
                    location_id: location.id,
                    kind,
                },
            );
            entities.discovery.push((config_topic, to_json(&payload)));
        }

        for zone in location.zones.values() {
            debug!(
                "Found zone: {} (location {} partition {} zone {})",
                zone.description, location.id, zone.partition_id, zone.id
            );
            for kind in binary_sensor::zone_sensors(zone) {
                let (config_topic, payload) = discovery::zone_sensor(topics, location, zone, kind);
                entities.sensors.push(SensorEntry {
                    binding: SensorBinding::Zone {
                        location_id: location.id,
                        zone_id: zone.id,
                        kind,
                    },
                    state_topic: payload.state_topic.clone(),
                });
                entities.discovery.push((config_topic, to_json(&payload)));
            }
            for kind in button::zone_buttons(zone) {
                let (config_topic, payload) = discovery::zone_button(topics, location, zone, kind);
                entities.buttons.insert(
                    payload.command_topic.clone(),
                    ButtonTarget::Zone {
                        location_id: location.id,
                        zone_id: zone.id,
                        kind,
                    },
                );
                entities.discovery.push((config_topic, to_json(&payload)));
            }
        }
    }

    entities
}

/// The bridge: one client, one coordinator, one MQTT session.
pub struct Bridge {
    config: BridgeConfig,
    config_path: Option<PathBuf>,
    coordinator: Arc<Coordinator>,
}

impl Bridge {
    /// Wire a bridge around an already-authenticated client.
    pub fn new(config: BridgeConfig, client: SharedClient) -> Self {
        Self {
            config,
            config_path: None,
            coordinator: Arc::new(Coordinator::new(client)),
        }
    }

    /// Reload the configuration record from this path on SIGHUP.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Push the auto-bypass option through to every location.
    fn apply_options(&self) {
        let mut client = client::lock(self.coordinator.client());
        let ids: Vec<u32> = client.locations().keys().copied().collect();
        for id in ids {
            client.set_auto_bypass_low_battery(id, self.config.options.auto_bypass_low_battery);
        }
    }

    /// Run until SIGINT/SIGTERM. SIGHUP reloads the configuration record and
    /// rebuilds the entity inventory.
    pub async fn serve(mut self) -> Result<(), BridgeError> {
        if !self.config.has_usercodes() {
            // A record without usercodes predates setup completing.
            return Err(BridgeError::AuthRequired);
        }

        self.apply_options();

        // Initial refresh, synchronous with setup: entities never publish
        // from never-refreshed state.
        match self.coordinator.refresh().await {
            Ok(()) => {}
            Err(crate::error::UpdateError::AuthFailed) => return Err(BridgeError::AuthRequired),
            Err(crate::error::UpdateError::Failed(reason)) => {
                return Err(BridgeError::InitialRefresh(reason));
            }
        }

        let (host, port) = self.config.mqtt.host_port()?;
        let mut mqtt_opts = MqttOptions::new(&self.config.mqtt.client_id, host, port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        let (mqtt, mut eventloop) = AsyncClient::new(mqtt_opts, 256);

        let mut topics = Topics::new(
            &self.config.mqtt.base_topic,
            &self.config.mqtt.discovery_prefix,
        );
        let mut entities = build_entities(
            self.coordinator.client(),
            &self.coordinator,
            &topics,
            self.config.options.code_required,
        );
        info!(
            "Publishing {} panels, {} sensors, {} buttons",
            entities.panels.len(),
            entities.sensors.len(),
            entities.buttons.len()
        );

        subscribe_commands(&mqtt, &topics).await?;
        publish_discovery(&mqtt, &entities).await;
        publish_availability(&mqtt, &topics, true).await;
        publish_states(&mqtt, &entities, self.coordinator.client()).await;

        // The poll loop; stops itself on an authentication failure.
        let poll_interval = Duration::from_secs(self.config.mqtt.poll_interval_secs);
        let run_coordinator = Arc::clone(&self.coordinator);
        let poll_task = tokio::spawn(async move { run_coordinator.run(poll_interval).await });

        let mut updates = self.coordinator.subscribe();
        let mut sighup = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            .map_err(BridgeError::Signal)?;
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .map_err(BridgeError::Signal)?;

        info!("Bridge running. SIGHUP reloads config, SIGINT/SIGTERM stops.");
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Ok(UpdateEvent::Updated) => {
                        publish_availability(&mqtt, &topics, true).await;
                        publish_states(&mqtt, &entities, self.coordinator.client()).await;
                    }
                    Ok(UpdateEvent::UpdateFailed) => {
                        publish_availability(&mqtt, &topics, false).await;
                    }
                    Ok(UpdateEvent::ReauthRequired) => {
                        publish_availability(&mqtt, &topics, false).await;
                        error!(
                            "Credentials rejected; polling stopped. \
                             Run the reauth wizard, then restart the bridge."
                        );
                    }
                    Err(_) => {}
                },

                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // Brokers drop subscriptions across restarts; also
                        // re-publish retained discovery in case the broker
                        // lost its store.
                        info!("MQTT connected, subscribing to command topics");
                        subscribe_commands(&mqtt, &topics).await?;
                        publish_discovery(&mqtt, &entities).await;
                        publish_availability(&mqtt, &topics, true).await;
                        publish_states(&mqtt, &entities, self.coordinator.client()).await;
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        let payload = String::from_utf8_lossy(&msg.payload).to_string();
                        handle_message(&msg.topic, &payload, &entities, self.coordinator.client())
                            .await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        sleep(Duration::from_secs(1)).await;
                    }
                },

                _ = sighup.recv() => {
                    if let Some(reloaded) = self.reload_config() {
                        self.config = reloaded;
                        self.apply_options();
                        topics = Topics::new(
                            &self.config.mqtt.base_topic,
                            &self.config.mqtt.discovery_prefix,
                        );
                        entities = build_entities(
                            self.coordinator.client(),
                            &self.coordinator,
                            &topics,
                            self.config.options.code_required,
                        );
                        subscribe_commands(&mqtt, &topics).await?;
                        publish_discovery(&mqtt, &entities).await;
                        publish_states(&mqtt, &entities, self.coordinator.client()).await;
                        // Pick up option changes in the published state
                        // without waiting for the next tick.
                        self.coordinator.request_refresh();
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received SIGINT, shutting down");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
            }
        }

        publish_availability(&mqtt, &topics, false).await;
        poll_task.abort();
        Ok(())
    }

    /// Re-read the record from disk. Credential changes need a new client,
    /// so only options/mqtt settings take effect live.
    fn reload_config(&self) -> Option<BridgeConfig> {
        let path = match &self.config_path {
            Some(path) => path,
            None => {
                warn!("No config path set; SIGHUP ignored");
                return None;
            }
        };
        match BridgeConfig::load(path) {
            Ok(reloaded) => {
                if reloaded.service.username != self.config.service.username {
                    warn!("Username changed on disk; restart the bridge to switch accounts");
                }
                info!("Config reloaded from {}", path.display());
                Some(reloaded)
            }
            Err(e) => {
                warn!("Failed to reload config, keeping previous: {e}");
                None
            }
        }
    }
}

async fn subscribe_commands(mqtt: &AsyncClient, topics: &Topics) -> Result<(), BridgeError> {
    mqtt.subscribe(topics.command_subscription(), QoS::AtLeastOnce)
        .await?;
    mqtt.subscribe(topics.press_subscription(), QoS::AtLeastOnce)
        .await?;
    Ok(())
}

async fn publish_discovery(mqtt: &AsyncClient, entities: &Entities) {
    for (topic, payload) in &entities.discovery {
        if let Err(e) = mqtt
            .publish(topic, QoS::AtLeastOnce, true, payload.clone())
            .await
        {
            error!("Failed to publish discovery to {topic}: {e}");
        }
    }
}

async fn publish_availability(mqtt: &AsyncClient, topics: &Topics, online: bool) {
    let payload = if online { PAYLOAD_ONLINE } else { PAYLOAD_OFFLINE };
    if let Err(e) = mqtt
        .publish(topics.availability(), QoS::AtLeastOnce, true, payload)
        .await
    {
        error!("Failed to publish availability: {e}");
    }
}

/// Publish current state for every entity, reading through the client's
/// cached objects.
async fn publish_states(mqtt: &AsyncClient, entities: &Entities, shared: &SharedClient) {
    for entry in entities.panels.values() {
        match entry.panel.state() {
            Some(state) => {
                let source = match state {
                    crate::alarm::PanelState::Triggered(source) => Some(source.as_str()),
                    _ => None,
                };
                let attributes = json!({
                    "triggered_source": source,
                    "last_poll": now_epoch_ms()
                });
                publish_retained(mqtt, &entry.state_topic, state.as_str()).await;
                publish_retained(mqtt, &entry.attributes_topic, &attributes.to_string()).await;
            }
            // Unknown state: leave the last retained value standing.
            None => debug!(
                "No known state for alarm panel {}",
                entry.panel.unique_id()
            ),
        }
    }

    for entry in &entities.sensors {
        if let Some(on) = entry.binding.evaluate(shared) {
            let payload = if on { PAYLOAD_ON } else { PAYLOAD_OFF };
            publish_retained(mqtt, &entry.state_topic, payload).await;
        }
    }
}

async fn publish_retained(mqtt: &AsyncClient, topic: &str, payload: &str) {
    if let Err(e) = mqtt.publish(topic, QoS::AtLeastOnce, true, payload).await {
        error!("Failed to publish to {topic}: {e}");
    }
}

/// Route one inbound MQTT message to the entity that owns its topic.
async fn handle_message(topic: &str, payload: &str, entities: &Entities, shared: &SharedClient) {
    if let Some(entry) = entities.panels.get(topic) {
        let parsed: AlarmCommandPayload = match serde_json::from_str(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Malformed alarm command on {topic}: {e}");
                return;
            }
        };
        let Some(command) = PanelCommand::from_action(&parsed.action) else {
            warn!("Unknown alarm action {:?} on {topic}", parsed.action);
            return;
        };
        // The command template renders an empty string when no code was
        // entered.
        let code = parsed.code.as_deref().filter(|code| !code.is_empty());
        match entry.panel.execute(command, code).await {
            Ok(()) => info!("{} succeeded for {}", command.as_str(), entry.panel.unique_id()),
            Err(e) => error!("{} failed: {e}", command.as_str()),
        }
        return;
    }

    if let Some(target) = entities.buttons.get(topic).copied() {
        if payload != discovery::PAYLOAD_PRESS {
            warn!("Unexpected button payload {payload:?} on {topic}");
            return;
        }
        match press_button(target, shared).await {
            Ok(()) => info!("Pressed {}", target.describe()),
            Err(e) => error!("Button press failed: {e}"),
        }
        return;
    }

    debug!("Message on unrouted topic {topic}");
}

/// Run a button's blocking client call on the worker pool.
async fn press_button(target: ButtonTarget, shared: &SharedClient) -> Result<(), CommandError> {
    let shared = Arc::clone(shared);
    let result = task::spawn_blocking(move || {
        let mut client = client::lock(&shared);
        target.execute(&mut *client)
    })
    .await
    .unwrap_or_else(|join| Err(ClientError::Other(format!("button task failed: {join}"))));

    result.map_err(|err| CommandError::Failed {
        device: target.describe(),
        reason: err.to_string(),
    })
}
