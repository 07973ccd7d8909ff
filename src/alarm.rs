// MIT License - Copyright (c) 2026 Peter Wright
// Alarm control panel adapter

use std::sync::Arc;

use tokio::task;
use tracing::debug;

use crate::client::{self, ArmKind, ArmingState, ClientError, SharedClient};
use crate::coordinator::Coordinator;
use crate::error::CommandError;
use crate::identity;

/// What set a partition's alarm off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    PoliceMedical,
    FireSmoke,
    CarbonMonoxide,
}

impl TriggerSource {
    /// Attribute string published alongside the `triggered` state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoliceMedical => "Police/Medical",
            Self::FireSmoke => "Fire/Smoke",
            Self::CarbonMonoxide => "Carbon Monoxide",
        }
    }
}

/// Alarm panel entity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Disarmed,
    Arming,
    ArmedHome,
    ArmedAway,
    ArmedNight,
    ArmedCustomBypass,
    Disarming,
    Triggered(TriggerSource),
}

impl PanelState {
    /// The MQTT alarm_control_panel state payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "disarmed",
            Self::Arming => "arming",
            Self::ArmedHome => "armed_home",
            Self::ArmedAway => "armed_away",
            Self::ArmedNight => "armed_night",
            Self::ArmedCustomBypass => "armed_custom_bypass",
            Self::Disarming => "disarming",
            Self::Triggered(_) => "triggered",
        }
    }
}

/// Map an arming state onto a panel state via the prioritized predicate
/// chain. First match wins.
///
/// The order matters and must not be rearranged: the client's predicates are
/// not mutually exclusive (stay-night also satisfies the home predicate), and
/// the service does not document what happens if it ever reports
/// contradictory flags. No match yields `None` — unknown, not an error.
pub fn derive_panel_state(arming: ArmingState) -> Option<PanelState> {
    if arming.is_disarmed() {
        Some(PanelState::Disarmed)
    } else if arming.is_armed_night() {
        Some(PanelState::ArmedNight)
    } else if arming.is_armed_home() {
        Some(PanelState::ArmedHome)
    } else if arming.is_armed_away() {
        Some(PanelState::ArmedAway)
    } else if arming.is_armed_custom_bypass() {
        Some(PanelState::ArmedCustomBypass)
    } else if arming.is_arming() {
        Some(PanelState::Arming)
    } else if arming.is_disarming() {
        Some(PanelState::Disarming)
    } else if arming.is_triggered_police() {
        Some(PanelState::Triggered(TriggerSource::PoliceMedical))
    } else if arming.is_triggered_fire() {
        Some(PanelState::Triggered(TriggerSource::FireSmoke))
    } else if arming.is_triggered_gas() {
        Some(PanelState::Triggered(TriggerSource::CarbonMonoxide))
    } else {
        None
    }
}

/// Commands accepted on the alarm command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Disarm,
    ArmHome,
    ArmAway,
    ArmNight,
    /// Named action, no code parameter.
    ArmHomeInstant,
    /// Named action, no code parameter.
    ArmAwayInstant,
}

impl PanelCommand {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "DISARM" => Some(Self::Disarm),
            "ARM_HOME" => Some(Self::ArmHome),
            "ARM_AWAY" => Some(Self::ArmAway),
            "ARM_NIGHT" => Some(Self::ArmNight),
            "ARM_HOME_INSTANT" => Some(Self::ArmHomeInstant),
            "ARM_AWAY_INSTANT" => Some(Self::ArmAwayInstant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarm => "DISARM",
            Self::ArmHome => "ARM_HOME",
            Self::ArmAway => "ARM_AWAY",
            Self::ArmNight => "ARM_NIGHT",
            Self::ArmHomeInstant => "ARM_HOME_INSTANT",
            Self::ArmAwayInstant => "ARM_AWAY_INSTANT",
        }
    }

    /// Whether the local usercode check applies. The two instant actions are
    /// registered without a code parameter.
    pub fn requires_code(&self) -> bool {
        matches!(
            self,
            Self::Disarm | Self::ArmHome | Self::ArmAway | Self::ArmNight
        )
    }

    fn arm_kind(&self) -> Option<ArmKind> {
        match self {
            Self::Disarm => None,
            Self::ArmHome => Some(ArmKind::Stay),
            Self::ArmAway => Some(ArmKind::Away),
            Self::ArmNight => Some(ArmKind::StayNight),
            Self::ArmHomeInstant => Some(ArmKind::StayInstant),
            Self::ArmAwayInstant => Some(ArmKind::AwayInstant),
        }
    }
}

/// One alarm panel entity per (location, partition).
///
/// State is derived on every read from the client's cached partition object;
/// nothing is stored here beyond the addressing.
pub struct AlarmPanel {
    client: SharedClient,
    coordinator: Arc<Coordinator>,
    location_id: u32,
    partition_id: u8,
    code_required: bool,
}

impl AlarmPanel {
    pub fn new(
        coordinator: Arc<Coordinator>,
        location_id: u32,
        partition_id: u8,
        code_required: bool,
    ) -> Self {
        Self {
            client: Arc::clone(coordinator.client()),
            coordinator,
            location_id,
            partition_id,
            code_required,
        }
    }

    pub fn location_id(&self) -> u32 {
        self.location_id
    }

    pub fn partition_id(&self) -> u8 {
        self.partition_id
    }

    pub fn code_required(&self) -> bool {
        self.code_required
    }

    pub fn unique_id(&self) -> String {
        identity::alarm_unique_id(self.location_id, self.partition_id)
    }

    /// Current panel state, `None` when the arming state matches no known
    /// predicate.
    pub fn state(&self) -> Option<PanelState> {
        let client = client::lock(&self.client);
        let partition = client
            .location(self.location_id)?
            .partitions
            .get(&self.partition_id)?;
        derive_panel_state(partition.arming_state)
    }

    /// Human-facing name of the panel device, for failure messages.
    pub fn device_name(&self) -> String {
        let client = client::lock(&self.client);
        client
            .location(self.location_id)
            .map(identity::location_device_name)
            .unwrap_or_else(|| format!("location {}", self.location_id))
    }

    /// Run one panel command: local code check, blocking client call on the
    /// worker pool, error translation, then exactly one forced refresh.
    pub async fn execute(
        &self,
        command: PanelCommand,
        code: Option<&str>,
    ) -> Result<(), CommandError> {
        if self.code_required && command.requires_code() {
            self.check_usercode(code)?;
        }

        debug!(
            "Dispatching {} for location {} partition {}",
            command.as_str(),
            self.location_id,
            self.partition_id
        );

        let client = Arc::clone(&self.client);
        let (location_id, partition_id) = (self.location_id, self.partition_id);
        let result = task::spawn_blocking(move || {
            let mut client = client::lock(&client);
            match command.arm_kind() {
                None => client.disarm(location_id, partition_id),
                Some(kind) => client.arm(location_id, partition_id, kind),
            }
        })
        .await
        .unwrap_or_else(|join| Err(ClientError::Other(format!("command task failed: {join}"))));

        match result {
            Ok(()) => {
                self.coordinator.request_refresh();
                Ok(())
            }
            Err(ClientError::InvalidCode) => {
                // The stored code no longer works against the service; only
                // re-authentication can fix that.
                self.coordinator.trigger_reauth();
                Err(CommandError::UsercodeRejected)
            }
            Err(err) => Err(CommandError::Failed {
                device: self.device_name(),
                reason: err.to_string(),
            }),
        }
    }

    /// Compare the caller-supplied code with the stored usercode for this
    /// location. Purely local; no network call is made on mismatch.
    fn check_usercode(&self, code: Option<&str>) -> Result<(), CommandError> {
        let client = client::lock(&self.client);
        let stored = client.usercodes().get(&self.location_id);
        match (stored, code) {
            (Some(stored), Some(code)) if stored == code => Ok(()),
            _ => Err(CommandError::InvalidPin),
        }
    }
}
