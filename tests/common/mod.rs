//! Scripted client used by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use totalconnect2mqtt::client::{
    ArmKind, ClientError, Location, PanelClient, Partition, SecurityDevice, Zone,
};

/// Everything the mock was asked to do, inspectable after the client has
/// been handed to the bridge.
#[derive(Debug, Default)]
pub struct CallLog {
    pub refresh_calls: u32,
    pub disarm_calls: u32,
    pub arm_calls: Vec<ArmKind>,
    pub bypass_zone_calls: u32,
    pub bypass_all_calls: u32,
    pub clear_bypass_calls: u32,
}

pub struct MockClient {
    locations: BTreeMap<u32, Location>,
    usercodes: HashMap<u32, String>,
    pub log: Arc<Mutex<CallLog>>,
    /// Errors returned by successive refresh calls; empty means success.
    pub refresh_failures: Arc<Mutex<VecDeque<ClientError>>>,
    /// Error returned by every command call, when set.
    pub command_failure: Option<ClientError>,
}

impl MockClient {
    pub fn new() -> Self {
        let mut location = Location::new(123456, "Demo House");
        location.security_device_id = 1;
        location.devices.insert(
            1,
            SecurityDevice {
                id: 1,
                name: "Security Panel".into(),
                serial_number: "TC-TEST-0001".into(),
            },
        );
        location.partitions.insert(1, Partition::new(1));
        location.zones.insert(1, Zone::new(1, "Front Door", 1));

        let mut locations = BTreeMap::new();
        locations.insert(location.id, location);

        let mut usercodes = HashMap::new();
        usercodes.insert(123456, "1234".to_string());

        Self {
            locations,
            usercodes,
            log: Arc::new(Mutex::new(CallLog::default())),
            refresh_failures: Arc::new(Mutex::new(VecDeque::new())),
            command_failure: None,
        }
    }

    pub fn failing_refresh(failures: Vec<ClientError>) -> Self {
        let client = Self::new();
        client.refresh_failures.lock().unwrap().extend(failures);
        client
    }

    pub fn failing_commands(error: ClientError) -> Self {
        let mut client = Self::new();
        client.command_failure = Some(error);
        client
    }

    pub fn log_handle(&self) -> Arc<Mutex<CallLog>> {
        Arc::clone(&self.log)
    }

    fn command_result(&self) -> Result<(), ClientError> {
        match &self.command_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl PanelClient for MockClient {
    fn username(&self) -> &str {
        "user@example.com"
    }

    fn locations(&self) -> &BTreeMap<u32, Location> {
        &self.locations
    }

    fn usercodes(&self) -> &HashMap<u32, String> {
        &self.usercodes
    }

    fn refresh_metadata(&mut self, _location_id: u32) -> Result<(), ClientError> {
        self.log.lock().unwrap().refresh_calls += 1;
        match self.refresh_failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn disarm(&mut self, _location_id: u32, _partition_id: u8) -> Result<(), ClientError> {
        self.log.lock().unwrap().disarm_calls += 1;
        self.command_result()
    }

    fn arm(
        &mut self,
        _location_id: u32,
        _partition_id: u8,
        kind: ArmKind,
    ) -> Result<(), ClientError> {
        self.log.lock().unwrap().arm_calls.push(kind);
        self.command_result()
    }

    fn bypass_zone(&mut self, _location_id: u32, _zone_id: u32) -> Result<(), ClientError> {
        self.log.lock().unwrap().bypass_zone_calls += 1;
        self.command_result()
    }

    fn bypass_all(&mut self, _location_id: u32) -> Result<(), ClientError> {
        self.log.lock().unwrap().bypass_all_calls += 1;
        self.command_result()
    }

    fn clear_bypass(&mut self, _location_id: u32) -> Result<(), ClientError> {
        self.log.lock().unwrap().clear_bypass_calls += 1;
        self.command_result()
    }

    fn validate_usercode(&mut self, _location_id: u32, code: &str) -> Result<bool, ClientError> {
        Ok(code == "1234")
    }

    fn set_auto_bypass_low_battery(&mut self, location_id: u32, value: bool) {
        if let Some(location) = self.locations.get_mut(&location_id) {
            location.auto_bypass_low_battery = value;
        }
    }
}
