use super::csv_sheet;
use super::{SheetStore, StoreError};
use crate::models::table::Table;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Result of reading the whole sheet.
///
/// A failed read still yields a usable (empty) table; the failure travels in `error`.
#[derive(Debug)]
pub struct Loaded {
    pub table: Table,
    pub error: Option<StoreError>,
}

pub fn load_data(store: &dyn SheetStore) -> Loaded {
    match store.get_all_values() {
        Ok(values) => {
            let table = Table::from_values(values);
            debug!(store = %store.describe(), rows = table.len(), "loaded sheet");
            Loaded { table, error: None }
        }
        Err(e) => {
            error!(store = %store.describe(), error = %e, "failed to load sheet");
            Loaded {
                table: Table::new(),
                error: Some(e),
            }
        }
    }
}

/// Replaces the whole sheet with `table`: clear, then write header and rows from A1.
///
/// Not atomic. Any failure after the clear is reported as `WriteAfterClear`.
pub fn save_data(store: &dyn SheetStore, table: &Table) -> Result<(), StoreError> {
    store.clear()?;

    let values = table.to_values();
    if values.is_empty() {
        info!(store = %store.describe(), "saved empty sheet");
        return Ok(());
    }

    store.update(&values).map_err(|e| {
        error!(store = %store.describe(), error = %e, "write failed after clear");
        StoreError::WriteAfterClear(e.to_string())
    })?;
    info!(store = %store.describe(), rows = table.len(), "saved sheet");
    Ok(())
}

/// Dumps `table` into a new CSV file under `dir` and returns its path.
/// Existing files are never overwritten; a numeric suffix is added instead.
pub fn write_rescue_file(dir: &Path, table: &Table) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();

    let mut attempt = 0;
    let (path, file) = loop {
        let name = match attempt {
            0 => format!("registro-rescate-{}.csv", stamp),
            n => format!("registro-rescate-{}-{}.csv", stamp, n),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    };

    csv_sheet::write_values(file, &table.to_values())?;
    info!(path = %path.display(), rows = table.len(), "wrote rescue file");
    Ok(path)
}
