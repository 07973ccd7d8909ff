//! Canned in-memory client standing in for the real Total Connect client
//! crate, so the demos run without an alarm account.
//!
//! Commands mutate the canned state directly; `refresh_metadata` is a no-op
//! because there is no remote side to fetch from. The valid usercode for
//! every location is `1234`, and any password except `wrong` authenticates.

use std::collections::{BTreeMap, HashMap};

use totalconnect2mqtt::client::{
    ArmKind, ArmingState, ClientError, Location, PanelClient, Partition, SecurityDevice, Zone,
    ZoneStatus, ZoneType,
};

pub const VALID_USERCODE: &str = "1234";

pub struct StubClient {
    username: String,
    locations: BTreeMap<u32, Location>,
    usercodes: HashMap<u32, String>,
}

impl StubClient {
    pub fn connect(
        username: &str,
        password: &str,
        usercodes: &HashMap<u32, String>,
        auto_bypass_low_battery: bool,
    ) -> Result<Self, ClientError> {
        if password.is_empty() || password == "wrong" {
            return Err(ClientError::Authentication);
        }

        let mut location = Location::new(123456, "Demo House");
        location.auto_bypass_low_battery = auto_bypass_low_battery;
        location.security_device_id = 1;
        location.devices.insert(
            1,
            SecurityDevice {
                id: 1,
                name: "Security Panel".into(),
                serial_number: "TC-DEMO-0001".into(),
            },
        );
        location.partitions.insert(1, Partition::new(1));
        location.partitions.insert(2, Partition::new(2));

        let mut front_door = Zone::new(1, "Front Door", 1);
        front_door.sensor_serial_number = Some("5816-0001".into());
        location.zones.insert(1, front_door);

        let mut back_door = Zone::new(2, "Back Door", 1);
        back_door.status = ZoneStatus::FAULT;
        location.zones.insert(2, back_door);

        let mut motion = Zone::new(3, "Hall Motion", 1);
        motion.zone_type = ZoneType::Motion;
        location.zones.insert(3, motion);

        let mut smoke = Zone::new(4, "Smoke Detector", 1);
        smoke.zone_type = ZoneType::Fire;
        smoke.can_be_bypassed = false;
        location.zones.insert(4, smoke);

        let mut panic_button = Zone::new(5, "Panic Button", 2);
        panic_button.zone_type = ZoneType::Button;
        panic_button.can_be_bypassed = false;
        location.zones.insert(5, panic_button);

        let mut locations = BTreeMap::new();
        locations.insert(location.id, location);

        Ok(Self {
            username: username.to_string(),
            locations,
            usercodes: usercodes.clone(),
        })
    }

    fn partition_mut(
        &mut self,
        location_id: u32,
        partition_id: u8,
    ) -> Result<&mut Partition, ClientError> {
        self.locations
            .get_mut(&location_id)
            .and_then(|location| location.partitions.get_mut(&partition_id))
            .ok_or(ClientError::CommandRejected { code: -4002 })
    }
}

impl PanelClient for StubClient {
    fn username(&self) -> &str {
        &self.username
    }

    fn locations(&self) -> &BTreeMap<u32, Location> {
        &self.locations
    }

    fn usercodes(&self) -> &HashMap<u32, String> {
        &self.usercodes
    }

    fn refresh_metadata(&mut self, _location_id: u32) -> Result<(), ClientError> {
        Ok(())
    }

    fn disarm(&mut self, location_id: u32, partition_id: u8) -> Result<(), ClientError> {
        self.partition_mut(location_id, partition_id)?.arming_state = ArmingState::Disarmed;
        Ok(())
    }

    fn arm(
        &mut self,
        location_id: u32,
        partition_id: u8,
        kind: ArmKind,
    ) -> Result<(), ClientError> {
        let partition = self.partition_mut(location_id, partition_id)?;
        partition.arming_state = match kind {
            ArmKind::Away => ArmingState::ArmedAway,
            ArmKind::AwayInstant => ArmingState::ArmedAwayInstant,
            ArmKind::Stay => ArmingState::ArmedStay,
            ArmKind::StayInstant => ArmingState::ArmedStayInstant,
            ArmKind::StayNight => ArmingState::ArmedStayNight,
        };
        Ok(())
    }

    fn bypass_zone(&mut self, location_id: u32, zone_id: u32) -> Result<(), ClientError> {
        let zone = self
            .locations
            .get_mut(&location_id)
            .and_then(|location| location.zones.get_mut(&zone_id))
            .ok_or(ClientError::CommandRejected { code: -4002 })?;
        if !zone.can_be_bypassed {
            return Err(ClientError::CommandRejected { code: -4504 });
        }
        zone.status |= ZoneStatus::BYPASSED;
        Ok(())
    }

    fn bypass_all(&mut self, location_id: u32) -> Result<(), ClientError> {
        let location = self
            .locations
            .get_mut(&location_id)
            .ok_or(ClientError::CommandRejected { code: -4002 })?;
        for zone in location.zones.values_mut() {
            if zone.can_be_bypassed && zone.is_faulted() {
                zone.status |= ZoneStatus::BYPASSED;
            }
        }
        Ok(())
    }

    fn clear_bypass(&mut self, location_id: u32) -> Result<(), ClientError> {
        let location = self
            .locations
            .get_mut(&location_id)
            .ok_or(ClientError::CommandRejected { code: -4002 })?;
        for zone in location.zones.values_mut() {
            zone.status -= ZoneStatus::BYPASSED;
        }
        Ok(())
    }

    fn validate_usercode(&mut self, _location_id: u32, code: &str) -> Result<bool, ClientError> {
        Ok(code == VALID_USERCODE)
    }

    fn set_auto_bypass_low_battery(&mut self, location_id: u32, value: bool) {
        if let Some(location) = self.locations.get_mut(&location_id) {
            location.auto_bypass_low_battery = value;
        }
    }
}
