//! Heart Rate Monitor Component
//!
//! This component owns the matched service/characteristic pair. It asks the
//! peripheral to start notifying, then reacts to value updates on the
//! characteristic and to removal of the owning service. Everything after
//! discovery runs inside one select loop driven by the bus connection.

use crate::core::constants::{BLUEZ_BUS_NAME, DBUS_NOREPLY_ERROR, GATT_CHRC_IFACE};
use crate::model::gatt::{CharacteristicCandidate, ServiceCandidate};
use crate::model::heartrate::HeartrateMessage;
use anyhow::Result;
use futures::StreamExt;
use log::{debug, info};
use std::collections::HashMap;
use zbus::fdo::{ObjectManagerProxy, PropertiesProxy};
use zbus::zvariant::Value;
use zbus::Connection;

/// Proxy for the BlueZ GATT characteristic interface. Only the notification
/// control method is needed; value delivery arrives via PropertiesChanged.
#[zbus::proxy(
    interface = "org.bluez.GattCharacteristic1",
    default_service = "org.bluez",
    assume_defaults = false,
    gen_blocking = false
)]
pub trait GattCharacteristic1 {
    /// Asks the peripheral to start pushing value notifications.
    fn start_notify(&self) -> zbus::Result<()>;
}

/// Reactive monitor for one matched Heart Rate service/characteristic pair.
pub struct HeartRateMonitor {
    conn: Connection,
    service: ServiceCandidate,
    characteristic: CharacteristicCandidate,
}

impl HeartRateMonitor {
    /// Creates a new `HeartRateMonitor` for the matched pair.
    pub fn new(
        conn: Connection,
        service: ServiceCandidate,
        characteristic: CharacteristicCandidate,
    ) -> Self {
        Self {
            conn,
            service,
            characteristic,
        }
    }

    /// Subscribes and runs until the service is removed or the notification
    /// request fails with a non-benign error. Both outcomes are graceful.
    pub async fn run(&self) -> Result<()> {
        let object_manager = ObjectManagerProxy::builder(&self.conn)
            .destination(BLUEZ_BUS_NAME)?
            .path("/")?
            .build()
            .await?;
        let mut removed = object_manager.receive_interfaces_removed().await?;

        let chrc_properties = PropertiesProxy::builder(&self.conn)
            .destination(BLUEZ_BUS_NAME)?
            .path(self.characteristic.path.clone())?
            .build()
            .await?;
        let mut changed = chrc_properties.receive_properties_changed().await?;
        debug!("subscribed to {}", self.characteristic.path);

        let characteristic = GattCharacteristic1Proxy::builder(&self.conn)
            .path(self.characteristic.path.clone())?
            .build()
            .await?;
        match characteristic.start_notify().await {
            Ok(()) => println!("heart meas noti. enabled"),
            Err(err) if is_noreply_error(&err) => println!("No reply got."),
            Err(err) => {
                println!("D-Bus call failed: {err}");
                return Ok(());
            }
        }

        loop {
            tokio::select! {
                Some(signal) = changed.next() => {
                    let args = signal.args()?;
                    if args.interface_name().as_str() != GATT_CHRC_IFACE {
                        continue;
                    }
                    if let Some(message) = measurement_from(args.changed_properties()) {
                        println!("value: {}", message.bpm());
                    }
                }
                Some(signal) = removed.next() => {
                    let args = signal.args()?;
                    if args.object_path().as_str() == self.service.path {
                        println!("Service was removed");
                        info!("shutting down");
                        return Ok(());
                    }
                }
                else => return Ok(()),
            }
        }
    }
}

/// Extracts and decodes the heart-rate value from a changed-properties map.
/// A missing, malformed or empty `Value` payload yields `None`.
fn measurement_from(changed: &HashMap<&str, Value<'_>>) -> Option<HeartrateMessage> {
    let value = changed.get("Value")?;
    let bytes: Vec<u8> = value
        .try_clone()
        .ok()
        .and_then(|v| Vec::<u8>::try_from(v).ok())?;
    if bytes.is_empty() {
        return None;
    }
    Some(HeartrateMessage::new(&bytes))
}

/// Recognizes the benign bus timeout on the StartNotify request: the call
/// went out but no reply arrived in time. Notifications usually start anyway.
fn is_noreply_error(err: &zbus::Error) -> bool {
    match err {
        zbus::Error::MethodError(name, _, _) => name.as_str().starts_with(DBUS_NOREPLY_ERROR),
        zbus::Error::FDO(fdo) => matches!(**fdo, zbus::fdo::Error::NoReply(_)),
        _ => err.to_string().starts_with(DBUS_NOREPLY_ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::Array;

    fn changed_with_value(bytes: Vec<u8>) -> HashMap<&'static str, Value<'static>> {
        HashMap::from([("Value", Value::Array(Array::from(bytes)))])
    }

    #[test]
    fn decodes_value_payload() {
        let changed = changed_with_value(vec![0x00, 72]);
        assert_eq!(measurement_from(&changed).unwrap().bpm(), 72);

        let changed = changed_with_value(vec![0x01, 0x2C, 0x01]);
        assert_eq!(measurement_from(&changed).unwrap().bpm(), 300);
    }

    #[test]
    fn ignores_missing_value() {
        let changed = HashMap::from([("Notifying", Value::from(true))]);
        assert!(measurement_from(&changed).is_none());
    }

    #[test]
    fn ignores_empty_value() {
        assert!(measurement_from(&changed_with_value(vec![])).is_none());
    }

    #[test]
    fn ignores_non_array_value() {
        let changed = HashMap::from([("Value", Value::from(72u8))]);
        assert!(measurement_from(&changed).is_none());
    }

    #[test]
    fn noreply_error_is_benign() {
        let err = zbus::Error::FDO(Box::new(zbus::fdo::Error::NoReply(
            "timeout waiting for reply".to_string(),
        )));
        assert!(is_noreply_error(&err));
    }

    #[test]
    fn other_errors_are_not_benign() {
        let err = zbus::Error::FDO(Box::new(zbus::fdo::Error::Failed(
            "org.bluez.Error.NotPermitted".to_string(),
        )));
        assert!(!is_noreply_error(&err));

        assert!(!is_noreply_error(&zbus::Error::InvalidReply));
    }
}
