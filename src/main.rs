//! BLE Heart Rate Notification Client
//!
//! This tool locates the Heart Rate service exposed by the BlueZ daemon's
//! D-Bus object tree, subscribes to notifications on its Heart Rate
//! Measurement characteristic and prints each decoded value to stdout. It
//! terminates gracefully when the service disappears.

use crate::components::monitor::HeartRateMonitor;
use crate::core::constants::{
    BLUEZ_BUS_NAME, HEARTRATE_MEASUREMENT_UUID, HEARTRATE_SERVICE_UUID,
};
use crate::model::gatt::GattSnapshot;
use anyhow::Result;
use env_logger::Env;
use log::{debug, error, info};
use std::process::ExitCode;
use zbus::fdo::ObjectManagerProxy;
use zbus::Connection;

/// Core utilities used throughout the application.
mod core {
    /// Application-wide constants.
    pub mod constants;
}

/// Components implementing the application's behavior.
mod components {
    /// Notification subscription and the reactive event loop.
    pub mod monitor;
}

/// Data models representing the application's domain.
mod model {
    /// GATT object-tree snapshot extraction and matching.
    pub mod gatt;
    /// Heart rate measurement decoding.
    pub mod heartrate;
}

/// Main entry point of the application.
///
/// Initializes logging, connects to the system bus and runs the client on a
/// single-threaded runtime. Exit code 1 marks a discovery failure; a removed
/// service or a failed notification request ends the process with 0.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logger with environment-specific settings.
    env_logger::Builder::from_env(
        Env::default()
            .filter_or("MY_LOG_LEVEL", "info")
            .write_style_or("MY_LOG_STYLE", "always"),
    )
    .init();

    match run().await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let conn = Connection::system().await?;
    debug!("connected to the system bus");

    let object_manager = ObjectManagerProxy::builder(&conn)
        .destination(BLUEZ_BUS_NAME)?
        .path("/")?
        .build()
        .await?;
    let objects = object_manager.get_managed_objects().await?;
    let snapshot = GattSnapshot::from_managed_objects(&objects);
    debug!(
        "snapshot holds {} services and {} characteristics",
        snapshot.services().len(),
        snapshot.characteristics().len()
    );

    let Some((service, characteristic)) =
        snapshot.find_service(HEARTRATE_SERVICE_UUID, HEARTRATE_MEASUREMENT_UUID)
    else {
        println!("No heart rate service found");
        return Ok(ExitCode::FAILURE);
    };
    let Some(characteristic) = characteristic else {
        println!("No heart rate measurement characteristic found");
        return Ok(ExitCode::FAILURE);
    };
    info!("heart rate service at {}", service.path);
    info!("measurement characteristic at {}", characteristic.path);

    HeartRateMonitor::new(conn, service, characteristic)
        .run()
        .await?;
    Ok(ExitCode::SUCCESS)
}
