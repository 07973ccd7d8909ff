// MIT License - Copyright (c) 2026 Peter Wright
// Total Connect MQTT bridge
//
//! # totalconnect2mqtt
//!
//! Bridge between a Total Connect cloud alarm account and MQTT, speaking
//! Home Assistant's discovery conventions: one alarm panel entity per
//! partition, binary sensors for location/zone conditions, and buttons for
//! the bypass operations.
//!
//! The remote-service client itself (authentication, session handling, the
//! wire protocol to the monitoring cloud) is a consumed boundary: this crate
//! defines the [`client::PanelClient`] port and the object model read
//! through it, and the downstream binary supplies the implementation. The
//! bridge's own job is the adapter layer — a 30-second polling coordinator,
//! the entity mappings, and the command wrappers.
//!
//! ## Quick start
//!
//! ```no_run
//! use totalconnect2mqtt::bridge::Bridge;
//! use totalconnect2mqtt::client::share;
//! use totalconnect2mqtt::config::BridgeConfig;
//!
//! # use std::collections::{BTreeMap, HashMap};
//! # use totalconnect2mqtt::client::{ArmKind, ClientError, Location, PanelClient};
//! # struct MyClient { locations: BTreeMap<u32, Location>, usercodes: HashMap<u32, String> }
//! # impl PanelClient for MyClient {
//! #     fn username(&self) -> &str { "user@example.com" }
//! #     fn locations(&self) -> &BTreeMap<u32, Location> { &self.locations }
//! #     fn usercodes(&self) -> &HashMap<u32, String> { &self.usercodes }
//! #     fn refresh_metadata(&mut self, _: u32) -> Result<(), ClientError> { Ok(()) }
//! #     fn disarm(&mut self, _: u32, _: u8) -> Result<(), ClientError> { Ok(()) }
//! #     fn arm(&mut self, _: u32, _: u8, _: ArmKind) -> Result<(), ClientError> { Ok(()) }
//! #     fn bypass_zone(&mut self, _: u32, _: u32) -> Result<(), ClientError> { Ok(()) }
//! #     fn bypass_all(&mut self, _: u32) -> Result<(), ClientError> { Ok(()) }
//! #     fn clear_bypass(&mut self, _: u32) -> Result<(), ClientError> { Ok(()) }
//! #     fn validate_usercode(&mut self, _: u32, _: &str) -> Result<bool, ClientError> { Ok(true) }
//! #     fn set_auto_bypass_low_battery(&mut self, _: u32, _: bool) {}
//! # }
//! # fn connect_client(_: &BridgeConfig) -> MyClient {
//! #     MyClient { locations: BTreeMap::new(), usercodes: HashMap::new() }
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BridgeConfig::load("bridge.toml")?;
//!     let client = share(connect_client(&config));
//!     Bridge::new(config, client)
//!         .with_config_path("bridge.toml")
//!         .serve()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! State is always derived from the client's cached objects on read:
//!
//! ```
//! use totalconnect2mqtt::alarm::{derive_panel_state, PanelState};
//! use totalconnect2mqtt::client::ArmingState;
//!
//! // Stay-night satisfies both the night and home predicates; the
//! // prioritized chain reports night.
//! assert_eq!(
//!     derive_panel_state(ArmingState::ArmedStayNight),
//!     Some(PanelState::ArmedNight)
//! );
//! ```

pub mod alarm;
pub mod binary_sensor;
pub mod bridge;
pub mod button;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod setup;

// Re-exports for convenience
pub use alarm::{AlarmPanel, PanelCommand, PanelState, TriggerSource};
pub use bridge::{Bridge, BridgeError};
pub use client::{ArmKind, ArmingState, ClientError, Location, PanelClient, Partition, Zone};
pub use config::BridgeConfig;
pub use coordinator::{Coordinator, UpdateEvent};
pub use error::{CommandError, UpdateError};
