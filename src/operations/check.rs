use crate::config::StoreConfig;
use crate::store::connection::establish_connection;
use tracing::info;

/// Connects to the configured sheet and reads it once.
pub fn check_connection(config: &StoreConfig) -> Result<String, String> {
    let store = establish_connection(config).map_err(|e| format!("Falló la conexión: {}", e))?;
    let values = store
        .get_all_values()
        .map_err(|e| format!("Conectado a {} pero la lectura falló: {}", store.describe(), e))?;

    let rows = values.len().saturating_sub(1);
    info!(store = %store.describe(), rows, "connection check passed");
    Ok(format!("Conectado a {} ({} registros)", store.describe(), rows))
}
