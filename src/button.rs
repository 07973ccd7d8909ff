// MIT License - Copyright (c) 2026 Peter Wright
// Button adapters

use crate::client::{ClientError, PanelClient, Zone};

/// Location-level command buttons; every location gets both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationButtonKind {
    ClearBypass,
    BypassAll,
}

impl LocationButtonKind {
    pub const ALL: [Self; 2] = [Self::ClearBypass, Self::BypassAll];

    pub fn key(&self) -> &'static str {
        match self {
            Self::ClearBypass => "clear_bypass",
            Self::BypassAll => "bypass_all",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ClearBypass => "Clear bypass",
            Self::BypassAll => "Bypass all",
        }
    }
}

/// Zone-level command buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneButtonKind {
    Bypass,
}

impl ZoneButtonKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bypass => "Bypass",
        }
    }
}

/// The button set for a zone: bypass, only where the client marks the zone
/// bypass-eligible.
pub fn zone_buttons(zone: &Zone) -> Vec<ZoneButtonKind> {
    if zone.can_be_bypassed {
        vec![ZoneButtonKind::Bypass]
    } else {
        Vec::new()
    }
}

/// A pressable target: which client call a button press maps to.
///
/// Stateless; a press is one blocking client call, and any failure
/// propagates as a generic operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTarget {
    Location {
        location_id: u32,
        kind: LocationButtonKind,
    },
    Zone {
        location_id: u32,
        zone_id: u32,
        kind: ZoneButtonKind,
    },
}

impl ButtonTarget {
    /// Blocking: run the client call this button stands for.
    pub fn execute(&self, client: &mut dyn PanelClient) -> Result<(), ClientError> {
        match *self {
            Self::Location { location_id, kind } => match kind {
                LocationButtonKind::ClearBypass => client.clear_bypass(location_id),
                LocationButtonKind::BypassAll => client.bypass_all(location_id),
            },
            Self::Zone {
                location_id,
                zone_id,
                kind: ZoneButtonKind::Bypass,
            } => client.bypass_zone(location_id, zone_id),
        }
    }

    /// Label for failure messages.
    pub fn describe(&self) -> String {
        match *self {
            Self::Location { location_id, kind } => {
                format!("{} (location {location_id})", kind.name())
            }
            Self::Zone {
                location_id,
                zone_id,
                kind,
            } => format!("{} (location {location_id} zone {zone_id})", kind.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_buttons_respect_eligibility() {
        let mut zone = Zone::new(3, "Garage Door", 1);
        zone.can_be_bypassed = true;
        assert_eq!(zone_buttons(&zone), vec![ZoneButtonKind::Bypass]);

        zone.can_be_bypassed = false;
        assert!(zone_buttons(&zone).is_empty());
    }

    #[test]
    fn test_describe_names_target() {
        let target = ButtonTarget::Zone {
            location_id: 1,
            zone_id: 3,
            kind: ZoneButtonKind::Bypass,
        };
        assert_eq!(target.describe(), "Bypass (location 1 zone 3)");
    }
}
