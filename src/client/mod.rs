// MIT License - Copyright (c) 2026 Peter Wright
// Consumed client boundary: object model + port trait

pub mod arming;
pub mod error;
pub mod location;
pub mod zone;

pub use arming::ArmingState;
pub use error::ClientError;
pub use location::{Location, LocationConditions, Partition, SecurityDevice};
pub use zone::{Zone, ZoneStatus, ZoneType};

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Arm command variants accepted by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmKind {
    Away,
    /// Away with no entry delay.
    AwayInstant,
    Stay,
    /// Stay with no entry delay.
    StayInstant,
    StayNight,
}

/// Port to the external alarm-monitoring client library.
///
/// Everything except the plain readers is blocking network I/O and must be
/// dispatched to the runtime's blocking pool — see
/// [`Coordinator`](crate::coordinator::Coordinator) and
/// [`AlarmPanel`](crate::alarm::AlarmPanel), which own that delegation.
///
/// The implementation holds all location/partition/zone/device state; the
/// adapter layer reads through these accessors and keeps no copy of its own,
/// so staleness is bounded by the polling interval or a post-command refresh.
pub trait PanelClient: Send {
    /// The account username (unique per configuration record).
    fn username(&self) -> &str;

    /// All locations on the account, keyed by location id.
    fn locations(&self) -> &BTreeMap<u32, Location>;

    fn location(&self, location_id: u32) -> Option<&Location> {
        self.locations().get(&location_id)
    }

    /// Stored per-location access codes.
    fn usercodes(&self) -> &HashMap<u32, String>;

    /// Blocking: fetch current panel/zone metadata for one location into the
    /// client's in-memory objects.
    fn refresh_metadata(&mut self, location_id: u32) -> Result<(), ClientError>;

    /// Blocking: disarm a partition.
    fn disarm(&mut self, location_id: u32, partition_id: u8) -> Result<(), ClientError>;

    /// Blocking: arm a partition.
    fn arm(&mut self, location_id: u32, partition_id: u8, kind: ArmKind)
    -> Result<(), ClientError>;

    /// Blocking: bypass a single zone.
    fn bypass_zone(&mut self, location_id: u32, zone_id: u32) -> Result<(), ClientError>;

    /// Blocking: bypass every currently faulted, bypass-eligible zone.
    fn bypass_all(&mut self, location_id: u32) -> Result<(), ClientError>;

    /// Blocking: clear all zone bypasses.
    fn clear_bypass(&mut self, location_id: u32) -> Result<(), ClientError>;

    /// Blocking: check an access code against the panel at a location.
    fn validate_usercode(&mut self, location_id: u32, code: &str) -> Result<bool, ClientError>;

    /// Write the auto-bypass option through to a location.
    fn set_auto_bypass_low_battery(&mut self, location_id: u32, value: bool);
}

/// Client handle shared between the coordinator, adapters and the bridge.
///
/// A `std` mutex, not a tokio one: the guard never lives across an await.
/// Long-running client calls lock it from inside `spawn_blocking`.
pub type SharedClient = Arc<Mutex<dyn PanelClient>>;

/// Wrap a concrete client for sharing.
pub fn share<C: PanelClient + 'static>(client: C) -> SharedClient {
    Arc::new(Mutex::new(client))
}

/// Lock the shared client, recovering from a poisoned mutex (a panicked
/// blocking call must not wedge every entity).
pub fn lock(client: &SharedClient) -> MutexGuard<'_, dyn PanelClient + 'static> {
    client.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
