use uuid::{uuid, Uuid};

/// Well-known bus name under which the BlueZ daemon exposes its object tree.
pub const BLUEZ_BUS_NAME: &str = "org.bluez";
/// D-Bus interface implemented by GATT service objects.
pub const GATT_SERVICE_IFACE: &str = "org.bluez.GattService1";
/// D-Bus interface implemented by GATT characteristic objects.
pub const GATT_CHRC_IFACE: &str = "org.bluez.GattCharacteristic1";

/// UUID of the Heart Rate Service.
pub const HEARTRATE_SERVICE_UUID: Uuid = uuid!("0000180d-0000-1000-8000-00805f9b34fb");
/// UUID of the Heart Rate Measurement Characteristic.
pub const HEARTRATE_MEASUREMENT_UUID: Uuid = uuid!("00002a37-0000-1000-8000-00805f9b34fb");

/// Error name prefix of the benign bus timeout seen on StartNotify.
pub const DBUS_NOREPLY_ERROR: &str = "org.freedesktop.DBus.Error.NoReply";
