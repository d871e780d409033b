// Service liveness via systemd over D-Bus

use crate::error::{PiwatchError, Result};
use crate::resilience::ConnectionManager;
use zbus::zvariant::OwnedObjectPath;

const SYSTEMD_DESTINATION: &str = "org.freedesktop.systemd1";
const SYSTEMD_PATH: &str = "/org/freedesktop/systemd1";
const MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";
const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";

/// Asks systemd whether one unit is active
#[derive(Debug, Clone)]
pub struct SystemdProbe {
    unit: String,
    connection_manager: ConnectionManager,
}

impl SystemdProbe {
    pub fn new(unit: impl Into<String>) -> Self {
        Self::with_connection_manager(unit, ConnectionManager::default())
    }

    pub fn with_connection_manager(unit: impl Into<String>, connection_manager: ConnectionManager) -> Self {
        Self {
            unit: unit.into(),
            connection_manager,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// `true` only when the unit reports `active`; any failure counts as down
    pub async fn is_active(&self) -> bool {
        match self.active_state().await {
            Ok(state) => {
                tracing::debug!("{} ActiveState={}", self.unit, state);
                state == "active"
            }
            Err(e) => {
                tracing::warn!("Error checking {}: {:#}", self.unit, e);
                false
            }
        }
    }

    /// Raw `ActiveState` property, e.g. `active`, `inactive` or `failed`
    pub async fn active_state(&self) -> Result<String> {
        let connection = self.connection_manager.connect_system_bus().await?;
        let connection = &connection;
        let unit_name = self.unit.as_str();
        let probe_error = move |message: String| PiwatchError::ServiceProbe {
            service: unit_name.to_string(),
            message,
        };

        self.connection_manager
            .with_retry("active_state", move || async move {
                let manager = zbus::Proxy::new(
                    connection,
                    SYSTEMD_DESTINATION,
                    SYSTEMD_PATH,
                    MANAGER_INTERFACE,
                )
                .await
                .map_err(|e| PiwatchError::SystemBus(e.to_string()))?;

                // LoadUnit also resolves units that are not currently loaded
                let path: OwnedObjectPath = manager
                    .call("LoadUnit", &(unit_name,))
                    .await
                    .map_err(|e| probe_error(format!("Failed to load unit: {}", e)))?;

                let unit = zbus::Proxy::new(connection, SYSTEMD_DESTINATION, path.as_str(), UNIT_INTERFACE)
                    .await
                    .map_err(|e| PiwatchError::SystemBus(e.to_string()))?;

                let state: String = unit
                    .get_property("ActiveState")
                    .await
                    .map_err(|e| probe_error(format!("Failed to read ActiveState: {}", e)))?;

                Ok(state)
            })
            .await
    }
}
