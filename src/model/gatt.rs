//! GATT Object-Tree Model
//!
//! BlueZ exposes every GATT object through its ObjectManager as a mapping
//! from object path to interface property bags. This module performs a
//! capability-filtered extraction pass over one such snapshot and locates
//! the Heart Rate service / measurement characteristic pair.

use crate::core::constants::{GATT_CHRC_IFACE, GATT_SERVICE_IFACE};
use std::collections::HashMap;
use uuid::Uuid;
use zbus::names::OwnedInterfaceName;
use zbus::zvariant::OwnedValue;

/// Property bag of one interface on one bus object.
pub type PropertyMap = HashMap<String, OwnedValue>;
/// Interface map of one bus object.
pub type InterfaceMap = HashMap<OwnedInterfaceName, PropertyMap>;

/// A GATT service object extracted from the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceCandidate {
    /// Object path under which BlueZ exposes the service.
    pub path: String,
    /// Service UUID parsed from the `UUID` property.
    pub uuid: Uuid,
}

/// A GATT characteristic object extracted from the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacteristicCandidate {
    /// Object path under which BlueZ exposes the characteristic.
    pub path: String,
    /// Characteristic UUID parsed from the `UUID` property.
    pub uuid: Uuid,
}

/// Typed view over one ObjectManager snapshot, reduced to the objects that
/// expose a GATT capability interface.
#[derive(Clone, Debug, Default)]
pub struct GattSnapshot {
    services: Vec<ServiceCandidate>,
    characteristics: Vec<CharacteristicCandidate>,
}

impl GattSnapshot {
    /// Extracts service and characteristic candidates from a raw snapshot.
    ///
    /// Objects are classified purely by which capability interface they
    /// expose; anything implementing neither is ignored, as are entries
    /// whose `UUID` property is missing or not a parseable UUID string.
    pub fn from_managed_objects<'a, I>(objects: I) -> Self
    where
        I: IntoIterator<Item = (&'a zbus::zvariant::OwnedObjectPath, &'a InterfaceMap)>,
    {
        let mut snapshot = GattSnapshot::default();
        for (path, interfaces) in objects {
            if let Some(uuid) =
                interface_properties(interfaces, GATT_SERVICE_IFACE).and_then(uuid_property)
            {
                snapshot.services.push(ServiceCandidate {
                    path: path.to_string(),
                    uuid,
                });
            }
            if let Some(uuid) =
                interface_properties(interfaces, GATT_CHRC_IFACE).and_then(uuid_property)
            {
                snapshot.characteristics.push(CharacteristicCandidate {
                    path: path.to_string(),
                    uuid,
                });
            }
        }
        snapshot
    }

    /// Returns the extracted service candidates.
    pub fn services(&self) -> &[ServiceCandidate] {
        &self.services
    }

    /// Returns the extracted characteristic candidates.
    pub fn characteristics(&self) -> &[CharacteristicCandidate] {
        &self.characteristics
    }

    /// Finds the first service matching `service_uuid`, paired with its
    /// first descendant characteristic matching `chrc_uuid`.
    ///
    /// Iteration follows snapshot order as delivered by the bus; when
    /// duplicates exist the first match wins. The characteristic slot is
    /// `None` when the matched service has no matching descendant.
    pub fn find_service(
        &self,
        service_uuid: Uuid,
        chrc_uuid: Uuid,
    ) -> Option<(ServiceCandidate, Option<CharacteristicCandidate>)> {
        let service = self.services.iter().find(|s| s.uuid == service_uuid)?;
        let characteristic = self
            .characteristics
            .iter()
            .find(|c| c.uuid == chrc_uuid && is_descendant(&c.path, &service.path))
            .cloned();
        Some((service.clone(), characteristic))
    }
}

/// Structural containment rule: a characteristic belongs to a service iff
/// its path is `service_path + "/" + suffix` for a non-empty suffix.
fn is_descendant(chrc_path: &str, service_path: &str) -> bool {
    chrc_path
        .strip_prefix(service_path)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
}

fn interface_properties<'a>(interfaces: &'a InterfaceMap, name: &str) -> Option<&'a PropertyMap> {
    interfaces
        .iter()
        .find(|(iface, _)| iface.as_str() == name)
        .map(|(_, props)| props)
}

fn uuid_property(props: &PropertyMap) -> Option<Uuid> {
    let text: &str = props.get("UUID")?.downcast_ref().ok()?;
    Uuid::parse_str(text).ok()
}
